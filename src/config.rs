use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// How the upstream model is asked to produce its answer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum GenerationMode {
    Sampling { temperature: f32, top_k: u32, top_p: f32 },
    Reasoning { thinking_budget: u32 },
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub max_output_tokens: u32,
    pub mode: GenerationMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?;

        let mode = match std::env::var("GEMINI_THINKING_BUDGET") {
            Ok(v) => GenerationMode::Reasoning {
                thinking_budget: v
                    .parse::<u32>()
                    .with_context(|| format!("invalid GEMINI_THINKING_BUDGET {v:?}"))?,
            },
            Err(_) => GenerationMode::Sampling {
                temperature: std::env::var("GEMINI_TEMPERATURE")
                    .ok()
                    .and_then(|v| v.parse::<f32>().ok())
                    .unwrap_or(0.3),
                top_k: 32,
                top_p: 1.0,
            },
        };

        let gemini = GeminiConfig {
            api_key,
            api_base: std::env::var("GEMINI_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.into()),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
            max_output_tokens: std::env::var("GEMINI_MAX_OUTPUT_TOKENS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(2048),
            mode,
        };
        Ok(Self { gemini })
    }
}
