//! Read-only views computed by the engine: recommendations, dashboard, statistics.

mod dto;
pub mod handlers;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::insight_routes()
}
