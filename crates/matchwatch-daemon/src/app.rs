use axum::{
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use matchwatch_scheduler::FixtureScheduler;
use std::sync::Arc;

/// Shared state passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub scheduler: Arc<FixtureScheduler>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(scheduler: Arc<FixtureScheduler>) -> Self {
        Self {
            scheduler,
            started_at: Utc::now(),
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/watches", get(crate::http::watches::list_handler))
        .route(
            "/watches/{fixture_id}/cancel",
            post(crate::http::watches::cancel_handler),
        )
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
