use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use matchwatch_scheduler::WatchStatus;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::app::AppState;

/// GET /watches: every armed pipeline with its current phase.
pub async fn list_handler(State(state): State<Arc<AppState>>) -> Json<Vec<WatchStatus>> {
    Json(state.scheduler.snapshot())
}

/// POST /watches/{fixture_id}/cancel
pub async fn cancel_handler(
    State(state): State<Arc<AppState>>,
    Path(fixture_id): Path<u64>,
) -> (StatusCode, Json<Value>) {
    if !state.scheduler.cancel(fixture_id) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no pipeline for fixture", "fixture_id": fixture_id })),
        );
    }
    info!(fixture_id, "pipeline cancelled by operator");
    (
        StatusCode::ACCEPTED,
        Json(json!({ "fixture_id": fixture_id, "cancelled": true })),
    )
}
