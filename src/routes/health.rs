//! Health and metrics endpoints for container orchestration and ops dashboards.

use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// Liveness probe — only checks that the process can respond to HTTP.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.handler.health_check())
}

pub async fn metrics(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.handler.get_metrics())
}
