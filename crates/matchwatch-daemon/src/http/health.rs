use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::app::AppState;

/// GET /health: liveness check with the active round and pipeline counts.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let sync = state.scheduler.sync();
    // null until the round tracker has been set
    let round = sync.rounds().active_round().ok();
    let cached_fixtures = match sync.cache().try_list_fixtures() {
        Ok(list) => Some(list.len()),
        Err(matchwatch_cache::CacheError::Uninitialized { .. }) => None,
        Err(e) => {
            warn!(error = %e, "health: fixture cache read failed");
            None
        }
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": (Utc::now() - state.started_at).num_seconds(),
        "timezone": sync.timezone().name(),
        "round": round,
        "cached_fixtures": cached_fixtures,
        "active_watches": state.scheduler.active_count(),
    }))
}
