use tracing::warn;

use super::dto::{ModelReply, NutritionResult};

/// Drops every ```` ```json ```` and ```` ``` ```` marker (plus one trailing
/// newline each) and trims. Unbalanced fences are fine.
pub fn strip_fences(raw: &str) -> String {
    let without_tagged = remove_marker(raw, "```json");
    remove_marker(&without_tagged, "```").trim().to_string()
}

fn remove_marker(s: &str, marker: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(idx) = rest.find(marker) {
        out.push_str(&rest[..idx]);
        rest = &rest[idx + marker.len()..];
        rest = rest.strip_prefix('\n').unwrap_or(rest);
    }
    out.push_str(rest);
    out
}

/// Turns raw model text into the relay's response body.
pub fn sanitize(raw: &str) -> ModelReply {
    let cleaned = strip_fences(raw);
    match serde_json::from_str::<serde_json::Value>(&cleaned) {
        Ok(value) => ModelReply::Parsed(value),
        Err(e) => {
            warn!(error = %e, "model reply is not valid json");
            ModelReply::Unreadable(NutritionResult::unparseable(cleaned))
        }
    }
}
