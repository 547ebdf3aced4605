mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

pub(crate) use dto::ReferenceQuery;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::product_routes())
}
