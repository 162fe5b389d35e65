use crate::config::AppConfig;
use crate::upstream::{GeminiClient, GenerationClient};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub generator: Arc<dyn GenerationClient>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let generator =
            Arc::new(GeminiClient::new(config.gemini.clone())) as Arc<dyn GenerationClient>;

        Ok(Self::from_parts(config, generator))
    }

    pub fn from_parts(config: Arc<AppConfig>, generator: Arc<dyn GenerationClient>) -> Self {
        Self { config, generator }
    }

    #[cfg(test)]
    pub fn fake(generator: Arc<dyn GenerationClient>) -> Self {
        use crate::config::{GeminiConfig, GenerationMode};

        let config = Arc::new(AppConfig {
            gemini: GeminiConfig {
                api_key: "test".into(),
                api_base: "http://fake.local".into(),
                model: "fake-model".into(),
                max_output_tokens: 2048,
                mode: GenerationMode::Sampling {
                    temperature: 0.3,
                    top_k: 32,
                    top_p: 1.0,
                },
            },
        });

        Self::from_parts(config, generator)
    }
}
