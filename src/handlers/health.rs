use crate::budget::tracker::BudgetState;
use crate::core::state::AppState;
use crate::utils::time::current_timestamp;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: i64,
    pub uptime_seconds: i64,
    /// False until the first successful transfer totals fetch
    pub budget_window_open: bool,
    pub budget_state: BudgetState,
}

/// Liveness probe.
///
/// Reports `waiting_for_client` while no budget window could be opened yet.
///
/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let budget = state.tracker.status();
    let budget_window_open = budget.window_started_at.is_some();

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: if budget_window_open { "ok" } else { "waiting_for_client" },
            timestamp: current_timestamp(),
            uptime_seconds: state.metrics.get_snapshot().uptime_seconds,
            budget_window_open,
            budget_state: budget.state,
        }),
    )
}
