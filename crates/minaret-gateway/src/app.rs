use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use minaret_core::MinaretConfig;
use minaret_scheduler::{FeatureFlags, ScheduleEngine};

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: MinaretConfig,
    /// Same flags instance the dispatcher reads at fire time.
    pub flags: FeatureFlags,
    pub engine: Arc<ScheduleEngine>,
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::status::health_handler))
        .route("/api/next-prayer", get(crate::http::status::next_prayer))
        .route("/api/timetable", get(crate::http::status::timetable))
        .route(
            "/api/features",
            get(crate::http::features::get_features).post(crate::http::features::update_features),
        )
        .route("/api/test-mode", get(crate::http::features::test_mode))
        .route(
            "/api/reschedule",
            post(crate::http::features::reschedule),
        )
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
