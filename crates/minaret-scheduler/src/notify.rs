//! Speaker webhook dispatch — fire-and-forget, gated at fire time.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use minaret_core::config::{FeaturesConfig, WebhookConfig};

use crate::error::DispatchError;
use crate::types::{Slot, TriggerKind};

/// Shared feature flags, mutable via the gateway API and read at fire time.
pub type FeatureFlags = Arc<RwLock<FeaturesConfig>>;

/// Seam between the engine's timer callbacks and the outbound webhook.
/// Outcome is irrelevant to trigger lifecycle, so `dispatch` is infallible
/// from the caller's point of view; failures are logged inside.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn dispatch(&self, kind: TriggerKind, slot: Slot);
}

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    device: String,
    azan_audio: String,
    fajr_azan_audio: String,
    announcement_audio: String,
    test_mode: bool,
    flags: FeatureFlags,
}

impl WebhookNotifier {
    pub fn new(cfg: &WebhookConfig, test_mode: bool, flags: FeatureFlags) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: cfg.url.clone(),
            token: cfg.token.clone(),
            device: cfg.device.clone(),
            azan_audio: cfg.azan_audio.clone(),
            fajr_azan_audio: cfg.fajr_azan_audio.clone(),
            announcement_audio: cfg.announcement_audio.clone(),
            test_mode,
            flags,
        }
    }

    fn audio_for(&self, kind: TriggerKind, slot: Slot) -> &str {
        match kind {
            TriggerKind::Azan if slot == Slot::Fajr => &self.fajr_azan_audio,
            TriggerKind::Azan => &self.azan_audio,
            TriggerKind::Announcement => &self.announcement_audio,
        }
    }

    fn enabled(&self, kind: TriggerKind) -> bool {
        let flags = self.flags.read().unwrap();
        match kind {
            TriggerKind::Azan => flags.azan_enabled,
            TriggerKind::Announcement => flags.announcement_enabled,
        }
    }

    async fn send(&self, kind: TriggerKind, slot: Slot) -> Result<(), DispatchError> {
        let token = self.token.as_deref().ok_or(DispatchError::MissingToken)?;
        let body = payload(token, &self.device, self.audio_for(kind, slot));
        let resp = self.client.post(&self.url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(DispatchError::Status(resp.status().as_u16()));
        }
        Ok(())
    }
}

fn payload(token: &str, device: &str, audio: &str) -> Value {
    json!({
        "token": token,
        "device": device,
        "audio": audio,
    })
}

#[async_trait]
impl Notify for WebhookNotifier {
    async fn dispatch(&self, kind: TriggerKind, slot: Slot) {
        // Flags and test mode are checked at fire time, not arm time, so a
        // toggle between arming and firing is honoured.
        if !self.enabled(kind) {
            info!(kind = %kind, slot = %slot, "feature disabled — dispatch skipped");
            return;
        }
        if self.test_mode {
            info!(kind = %kind, slot = %slot, "test mode — webhook suppressed");
            return;
        }
        match self.send(kind, slot).await {
            Ok(()) => info!(kind = %kind, slot = %slot, "webhook dispatched"),
            // At most one outbound call per trigger, ever — no retry.
            Err(e) => warn!(kind = %kind, slot = %slot, error = %e, "webhook dispatch failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier(token: Option<&str>, test_mode: bool) -> WebhookNotifier {
        let cfg = WebhookConfig {
            url: "https://hooks.example.net/play".into(),
            token: token.map(String::from),
            device: "main-hall".into(),
            azan_audio: "https://media.example.net/azan.mp3".into(),
            fajr_azan_audio: "https://media.example.net/azan-fajr.mp3".into(),
            announcement_audio: "https://media.example.net/announce.mp3".into(),
        };
        let flags = Arc::new(RwLock::new(FeaturesConfig::default()));
        WebhookNotifier::new(&cfg, test_mode, flags)
    }

    #[test]
    fn payload_has_fixed_shape() {
        let body = payload("tok", "main-hall", "https://media.example.net/azan.mp3");
        assert_eq!(body["token"], "tok");
        assert_eq!(body["device"], "main-hall");
        assert_eq!(body["audio"], "https://media.example.net/azan.mp3");
        assert_eq!(body.as_object().unwrap().len(), 3);
    }

    #[test]
    fn fajr_azan_uses_fajr_asset() {
        let n = notifier(Some("tok"), false);
        assert!(n.audio_for(TriggerKind::Azan, Slot::Fajr).contains("fajr"));
        assert!(!n.audio_for(TriggerKind::Azan, Slot::Zuhr).contains("fajr"));
        assert!(n
            .audio_for(TriggerKind::Announcement, Slot::Zuhr)
            .contains("announce"));
    }

    #[test]
    fn flags_are_read_per_call() {
        let n = notifier(Some("tok"), false);
        assert!(n.enabled(TriggerKind::Azan));
        n.flags.write().unwrap().azan_enabled = false;
        assert!(!n.enabled(TriggerKind::Azan));
        assert!(n.enabled(TriggerKind::Announcement));
    }

    #[tokio::test]
    async fn missing_token_hard_stops_the_call() {
        let n = notifier(None, false);
        let err = n.send(TriggerKind::Azan, Slot::Zuhr).await.unwrap_err();
        assert!(matches!(err, DispatchError::MissingToken));
    }
}
