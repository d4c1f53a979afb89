// Status endpoint

use crate::budget::tracker::BudgetStatus;
use crate::core::state::AppState;
use crate::metrics::collector::MetricsSnapshot;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub budget: BudgetStatus,
    pub metrics: MetricsSnapshot,
}

/// Returns the published budget status and per-job counters.
///
/// GET /status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Response {
    let body = StatusResponse {
        budget: state.tracker.status(),
        metrics: state.metrics.get_snapshot(),
    };

    (StatusCode::OK, Json(body)).into_response()
}
