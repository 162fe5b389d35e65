use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, Span};
use uuid::Uuid;

use crate::config::{GeminiConfig, GenerationMode};

/// Image bytes as the client sent them: base64 text plus its mime type.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

/// Everything one upstream call needs.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationInput {
    pub instruction: String,
    pub image: Option<InlineImage>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("upstream request failed: {0}")]
    Transport(reqwest::Error),
    #[error("upstream response was not understood: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for UpstreamError {
    /// The request url is dropped so it never ends up in logs or responses.
    fn from(e: reqwest::Error) -> Self {
        UpstreamError::Transport(e.without_url())
    }
}

/// A model that turns an instruction (and maybe an image) into reply text.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, input: &GenerationInput) -> Result<String, UpstreamError>;
}

// ---- wire types ----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    tools: Vec<Tool>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, or empty.
    fn first_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .unwrap_or_default()
    }
}

// ---- client ----

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }

    pub(crate) fn request_body<'a>(&self, input: &'a GenerationInput) -> GenerateContentRequest<'a> {
        let mut parts = vec![Part::Text {
            text: &input.instruction,
        }];
        if let Some(image) = &input.image {
            parts.push(Part::InlineData {
                inline_data: Blob {
                    mime_type: &image.mime_type,
                    data: &image.data,
                },
            });
        }

        let generation_config = match self.config.mode {
            GenerationMode::Sampling {
                temperature,
                top_k,
                top_p,
            } => GenerationConfig {
                max_output_tokens: self.config.max_output_tokens,
                temperature: Some(temperature),
                top_k: Some(top_k),
                top_p: Some(top_p),
                thinking_config: None,
            },
            GenerationMode::Reasoning { thinking_budget } => GenerationConfig {
                max_output_tokens: self.config.max_output_tokens,
                temperature: None,
                top_k: None,
                top_p: None,
                thinking_config: Some(ThinkingConfig { thinking_budget }),
            },
        };

        GenerateContentRequest {
            contents: vec![Content { parts }],
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
            generation_config,
        }
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    #[instrument(skip(self, input), fields(request_id, model = %self.config.model, with_image = input.image.is_some()))]
    async fn generate(&self, input: &GenerationInput) -> Result<String, UpstreamError> {
        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", &request_id);

        let res = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&self.request_body(input))
            .send()
            .await?;

        let status = res.status();
        debug!(%status, "gemini responded");
        if !status.is_success() {
            let body = res.text().await?;
            error!(%status, body = %body, "gemini api error");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = res.text().await?;
        let data: GenerateContentResponse = serde_json::from_str(&text)?;
        Ok(data.first_text())
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        http::{HeaderMap, StatusCode},
        Json, Router,
    };
    use serde_json::{json, Value};

    use super::*;

    fn config(api_base: String, mode: GenerationMode) -> GeminiConfig {
        GeminiConfig {
            api_key: "test-key".into(),
            api_base,
            model: "gemini-2.0-flash".into(),
            max_output_tokens: 2048,
            mode,
        }
    }

    fn sampling() -> GenerationMode {
        GenerationMode::Sampling {
            temperature: 0.3,
            top_k: 32,
            top_p: 1.0,
        }
    }

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn image_body_has_inline_data_and_search() {
        let client = GeminiClient::new(config("http://unused".into(), sampling()));
        let input = GenerationInput {
            instruction: "identify".into(),
            image: Some(InlineImage {
                mime_type: "image/png".into(),
                data: "aGVsbG8=".into(),
            }),
        };
        let body = serde_json::to_value(client.request_body(&input)).unwrap();

        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["text"], "identify");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "aGVsbG8=");
        assert_eq!(body["tools"], json!([{ "googleSearch": {} }]));
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(body["generationConfig"]["topK"], 32);
        assert!(body["generationConfig"].get("thinkingConfig").is_none());
    }

    #[test]
    fn text_body_never_carries_image() {
        let client = GeminiClient::new(config("http://unused".into(), sampling()));
        let input = GenerationInput {
            instruction: "two slices of pepperoni pizza".into(),
            image: None,
        };
        let body = serde_json::to_value(client.request_body(&input)).unwrap();
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 1);
        assert!(!body.to_string().contains("inlineData"));
        assert_eq!(body["tools"], json!([{ "googleSearch": {} }]));
    }

    #[test]
    fn reasoning_mode_drops_sampling_overrides() {
        let client = GeminiClient::new(config(
            "http://unused".into(),
            GenerationMode::Reasoning {
                thinking_budget: 8192,
            },
        ));
        let input = GenerationInput {
            instruction: "x".into(),
            image: None,
        };
        let body = serde_json::to_value(client.request_body(&input)).unwrap();
        let gc = &body["generationConfig"];
        assert_eq!(gc["thinkingConfig"]["thinkingBudget"], 8192);
        assert_eq!(gc["maxOutputTokens"], 2048);
        assert!(gc.get("temperature").is_none());
        assert!(gc.get("topK").is_none());
    }

    #[test]
    fn first_text_defaults_to_empty() {
        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.first_text(), "");

        let no_parts: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [{ "content": { "parts": [] } }] }))
                .unwrap();
        assert_eq!(no_parts.first_text(), "");
    }

    #[tokio::test]
    async fn generate_returns_first_text_part() {
        let stub = Router::new().fallback(
            |headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(
                    headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()),
                    Some("test-key")
                );
                assert_eq!(body["contents"][0]["parts"][0]["text"], "identify");
                Json(json!({
                    "candidates": [{
                        "content": { "parts": [{ "text": "```json\n{\"calories\":95}\n```" }] }
                    }]
                }))
            },
        );
        let base = spawn_stub(stub).await;
        let client = GeminiClient::new(config(base, sampling()));

        let text = client
            .generate(&GenerationInput {
                instruction: "identify".into(),
                image: None,
            })
            .await
            .unwrap();
        assert_eq!(text, "```json\n{\"calories\":95}\n```");
    }

    #[tokio::test]
    async fn generate_surfaces_status_and_body() {
        let stub = Router::new().fallback(|| async {
            (StatusCode::SERVICE_UNAVAILABLE, "model overloaded")
        });
        let base = spawn_stub(stub).await;
        let client = GeminiClient::new(config(base, sampling()));

        let err = client
            .generate(&GenerationInput {
                instruction: "identify".into(),
                image: None,
            })
            .await
            .unwrap_err();
        match err {
            UpstreamError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "model overloaded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn transport_error_hides_key_and_url() {
        let client = GeminiClient::new(config("http://127.0.0.1:1".into(), sampling()));

        let err = client
            .generate(&GenerationInput {
                instruction: "identify".into(),
                image: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_)));
        let msg = err.to_string();
        assert!(!msg.contains("test-key"), "{msg}");
        assert!(!msg.contains("generateContent"), "{msg}");
    }

    #[tokio::test]
    async fn generate_rejects_non_json_success() {
        let stub = Router::new().fallback(|| async { "not json" });
        let base = spawn_stub(stub).await;
        let client = GeminiClient::new(config(base, sampling()));

        let err = client
            .generate(&GenerationInput {
                instruction: "identify".into(),
                image: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Decode(_)));
    }
}
