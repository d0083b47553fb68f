//! Feature-flag and test-mode endpoints.
//!
//! Flag updates are in-memory only and take effect in two ways: the
//! dispatcher reads them at fire time, and a successful update re-arms the
//! day's triggers from the current timetable (never a re-fetch).

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use minaret_core::config::{FeaturesConfig, TestModeConfig};

use crate::app::AppState;
use crate::auth::{auth_error, verify_bearer_token};

#[derive(Debug, Deserialize)]
pub struct FeatureUpdate {
    pub azan_enabled: Option<bool>,
    pub announcement_enabled: Option<bool>,
}

/// GET /api/features
pub async fn get_features(State(state): State<Arc<AppState>>) -> Json<FeaturesConfig> {
    Json(state.flags.read().unwrap().clone())
}

/// POST /api/features — partial update; only booleans present in the body
/// are touched. Guarded by the gateway bearer token when one is set.
pub async fn update_features(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(update): Json<FeatureUpdate>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    verify_bearer_token(&headers, state.config.gateway.auth_token.as_deref())
        .map_err(|e| auth_error(&e))?;

    let changed = {
        let mut flags = state.flags.write().unwrap();
        apply_update(&mut flags, &update)
    };

    if changed {
        info!("feature flags updated — rescheduling");
        state.engine.reschedule();
    }

    let flags = state.flags.read().unwrap().clone();
    Ok(Json(json!({"success": true, "features": flags})))
}

/// GET /api/test-mode — startup test-mode config, read-only. Test mode is
/// fixed for the process lifetime; there is deliberately no POST.
pub async fn test_mode(State(state): State<Arc<AppState>>) -> Json<TestModeConfig> {
    Json(state.config.test_mode.clone())
}

/// POST /api/reschedule — cancel and re-arm today's triggers from the
/// current timetable.
pub async fn reschedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    verify_bearer_token(&headers, state.config.gateway.auth_token.as_deref())
        .map_err(|e| auth_error(&e))?;

    state.engine.reschedule();
    Ok(Json(json!({"success": true})))
}

fn apply_update(flags: &mut FeaturesConfig, update: &FeatureUpdate) -> bool {
    let mut changed = false;
    if let Some(v) = update.azan_enabled {
        changed |= flags.azan_enabled != v;
        flags.azan_enabled = v;
    }
    if let Some(v) = update.announcement_enabled {
        changed |= flags.announcement_enabled != v;
        flags.announcement_enabled = v;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_update_touches_only_named_flags() {
        let mut flags = FeaturesConfig::default();
        let changed = apply_update(
            &mut flags,
            &FeatureUpdate {
                azan_enabled: Some(false),
                announcement_enabled: None,
            },
        );
        assert!(changed);
        assert!(!flags.azan_enabled);
        assert!(flags.announcement_enabled);
    }

    #[test]
    fn setting_same_value_is_not_a_change() {
        let mut flags = FeaturesConfig::default();
        let changed = apply_update(
            &mut flags,
            &FeatureUpdate {
                azan_enabled: Some(true),
                announcement_enabled: Some(true),
            },
        );
        assert!(!changed);
    }

    #[test]
    fn empty_body_changes_nothing() {
        let mut flags = FeaturesConfig::default();
        assert!(!apply_update(
            &mut flags,
            &FeatureUpdate {
                azan_enabled: None,
                announcement_enabled: None,
            },
        ));
    }
}
