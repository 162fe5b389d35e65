pub mod dto;
pub mod handlers;
mod prompt;
mod sanitize;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::relay_routes())
}
