// HTTP routes configuration

use crate::core::state::AppState;
use axum::{http::StatusCode, routing::get, Router};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::handlers::health::health_handler))
        .route("/status", get(crate::handlers::status::status_handler))
        .fallback(|| async { (StatusCode::NOT_FOUND, "Not Found") })
        .with_state(state)
}
