use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;

/// GET /health — liveness probe, returns server metadata.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "test_mode": state.config.test_mode.enabled,
    }))
}

/// GET /api/next-prayer — cached snapshot; `{}` when every slot has passed
/// or no cycle has armed yet.
pub async fn next_prayer(State(state): State<Arc<AppState>>) -> Json<Value> {
    match state.engine.next_prayer() {
        Some(next) => Json(json!(next)),
        None => Json(json!({})),
    }
}

/// GET /api/timetable — the current day's derived schedule.
pub async fn timetable(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.engine.timetable() {
        Some(table) => Ok(Json(json!(table))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "no timetable armed yet"})),
        )),
    }
}
