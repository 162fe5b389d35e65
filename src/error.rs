use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Every failure the relay can answer with. Each variant maps to exactly one
/// JSON error body.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("No image provided")]
    BadRequest,

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("{error}: {details}")]
    Upstream { error: &'static str, details: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::BadRequest => StatusCode::BAD_REQUEST,
            RelayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::Upstream { .. } | RelayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            RelayError::MethodNotAllowed => json!({ "error": "Method not allowed" }),
            RelayError::BadRequest => json!({ "error": "No image provided" }),
            RelayError::PayloadTooLarge => json!({ "error": "Payload too large" }),
            RelayError::Upstream { error, details } => json!({ "error": error, "details": details }),
            RelayError::Internal(message) => {
                json!({ "error": "Internal server error", "message": message })
            }
        };
        (status, Json(body)).into_response()
    }
}
