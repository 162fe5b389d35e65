use serde::{Deserialize, Serialize};

pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Body of `POST /`. Every field is optional; presence is checked before
/// branching.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundRequest {
    pub image: Option<String>,
    pub mime_type: Option<String>,
    pub context: Option<String>,
    pub text_only: Option<bool>,
}

/// Validated request, one variant per upstream branch.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisRequest {
    Image {
        data: String,
        mime_type: String,
        context: Option<String>,
    },
    TextOnly {
        description: String,
    },
}

impl AnalysisRequest {
    /// Error text reported when the upstream call for this branch fails.
    pub fn failure_label(&self) -> &'static str {
        match self {
            AnalysisRequest::Image { .. } => "Failed to analyze image",
            AnalysisRequest::TextOnly { .. } => "Failed to analyze food",
        }
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

impl InboundRequest {
    /// `None` when neither an image nor a text-only description was sent.
    pub fn into_analysis(self) -> Option<AnalysisRequest> {
        let context = non_empty(self.context);
        if self.text_only.unwrap_or(false) {
            return context.map(|description| AnalysisRequest::TextOnly { description });
        }
        let data = non_empty(self.image)?;
        Some(AnalysisRequest::Image {
            data,
            mime_type: non_empty(self.mime_type).unwrap_or_else(|| DEFAULT_MIME_TYPE.into()),
            context,
        })
    }
}

/// Fixed nutrition record. Built by the relay only for the parse-failure
/// fallback; well-formed model replies are forwarded as parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    pub food_name: Option<String>,
    pub calories: i64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serving_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NutritionResult {
    pub fn unparseable(raw: String) -> Self {
        Self {
            error: Some("Failed to parse nutrition data".into()),
            raw_response: Some(raw),
            food_name: Some("Unknown".into()),
            calories: 0,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
            serving_size: None,
            confidence: None,
            source: None,
            notes: None,
        }
    }
}

/// What the relay answers with on a successful upstream call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModelReply {
    Parsed(serde_json::Value),
    Unreadable(NutritionResult),
}
