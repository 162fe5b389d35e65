use axum::{
    extract::{rejection::BytesRejection, State},
    http::{Method, StatusCode},
    routing::any,
    Json, Router,
};
use bytes::Bytes;
use tracing::{debug, error, info, instrument};

use super::{
    dto::{AnalysisRequest, InboundRequest, ModelReply},
    prompt, sanitize,
};
use crate::{
    error::RelayError,
    state::AppState,
    upstream::{GenerationInput, InlineImage, UpstreamError},
};

pub fn relay_routes() -> Router<AppState> {
    Router::new()
        .route("/", any(relay))
        .route("/analyze", any(relay))
}

/// Single entry point: method check, payload check, one upstream call.
/// `OPTIONS` never gets here; the preflight middleware answers it.
#[instrument(skip(state, body))]
pub async fn relay(
    State(state): State<AppState>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ModelReply>, RelayError> {
    if method != Method::POST {
        return Err(RelayError::MethodNotAllowed);
    }
    let body = body.map_err(|rejection| {
        error!(status = %rejection.status(), "request body rejected");
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            RelayError::PayloadTooLarge
        } else {
            RelayError::Internal(rejection.body_text())
        }
    })?;

    let request = parse_request(&body)?;
    let label = request.failure_label();
    let input = generation_input(request);
    debug!(
        model = %state.config.gemini.model,
        with_image = input.image.is_some(),
        "calling upstream"
    );

    let text = state.generator.generate(&input).await.map_err(|e| match e {
        UpstreamError::Status { status, body } => {
            error!(status, "upstream rejected analysis");
            RelayError::Upstream {
                error: label,
                details: body,
            }
        }
        other => {
            error!(error = %other, "upstream call failed");
            RelayError::Internal(other.to_string())
        }
    })?;

    let reply = sanitize::sanitize(&text);
    info!(parsed = matches!(reply, ModelReply::Parsed(_)), "analysis done");
    Ok(Json(reply))
}

fn parse_request(body: &[u8]) -> Result<AnalysisRequest, RelayError> {
    let inbound = if body.iter().all(u8::is_ascii_whitespace) {
        InboundRequest::default()
    } else {
        serde_json::from_slice::<InboundRequest>(body).map_err(|e| {
            error!(error = %e, "malformed request body");
            RelayError::Internal(e.to_string())
        })?
    };
    inbound.into_analysis().ok_or(RelayError::BadRequest)
}

fn generation_input(request: AnalysisRequest) -> GenerationInput {
    let instruction = prompt::build(&request);
    let image = match request {
        AnalysisRequest::Image {
            data, mime_type, ..
        } => Some(InlineImage { mime_type, data }),
        AnalysisRequest::TextOnly { .. } => None,
    };
    GenerationInput { instruction, image }
}
