use chrono::NaiveTime;
use chrono_tz::Tz;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{MinaretError, Result};

pub const DEFAULT_PORT: u16 = 3002;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_TIMEZONE: &str = "Europe/London";

/// Lead between an announcement trigger and its iqamah, in minutes.
pub const ANNOUNCEMENT_LEAD_MINS: i64 = 15;

/// How often the next-prayer cache is refreshed, in seconds.
pub const TRACKER_REFRESH_SECS: u64 = 60;

/// Top-level config (minaret.toml + MINARET_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinaretConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    pub provider: ProviderConfig,
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
    #[serde(default)]
    pub test_mode: TestModeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Bearer token required on mutating routes. Unset means unguarded
    /// (internal/trusted network deployments only).
    pub auth_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            auth_token: None,
        }
    }
}

/// Timings provider — the upstream service holding per-day prayer records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    /// Installation identifier the provider keys its data by.
    pub installation_id: String,
}

/// Speaker webhook — the outbound call that plays audio on the device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    /// Webhook credential. A missing token skips the call at fire time
    /// (logged) rather than failing startup.
    pub token: Option<String>,
    /// Target speaker device identifier.
    pub device: String,
    #[serde(default = "default_azan_audio")]
    pub azan_audio: String,
    #[serde(default = "default_fajr_azan_audio")]
    pub fajr_azan_audio: String,
    #[serde(default = "default_announcement_audio")]
    pub announcement_audio: String,
}

/// Feature flags checked at fire time, mutable via the gateway API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default = "bool_true")]
    pub azan_enabled: bool,
    #[serde(default = "bool_true")]
    pub announcement_enabled: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            azan_enabled: true,
            announcement_enabled: true,
        }
    }
}

/// Virtual-clock configuration, read exactly once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestModeConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Virtual "now" at boot, HH:MM:SS in the observation zone.
    #[serde(default = "default_virtual_start")]
    pub start_time: String,
    /// IANA zone name for the single observation zone.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for TestModeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            start_time: default_virtual_start(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

impl TestModeConfig {
    pub fn zone(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| MinaretError::Config(format!("unknown timezone: {}", self.timezone)))
    }

    pub fn virtual_start(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.start_time, "%H:%M:%S").map_err(|_| {
            MinaretError::Config(format!(
                "test_mode.start_time must be HH:MM:SS, got {:?}",
                self.start_time
            ))
        })
    }
}

fn bool_true() -> bool {
    true
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_virtual_start() -> String {
    "02:00:00".to_string()
}
fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}
fn default_provider_base_url() -> String {
    "https://timings.minaret.app".to_string()
}
fn default_azan_audio() -> String {
    "https://media.minaret.app/audio/azan.mp3".to_string()
}
fn default_fajr_azan_audio() -> String {
    "https://media.minaret.app/audio/azan-fajr.mp3".to_string()
}
fn default_announcement_audio() -> String {
    "https://media.minaret.app/audio/announcement.mp3".to_string()
}

impl MinaretConfig {
    /// Load config from a TOML file with MINARET_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ./minaret.toml
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path.unwrap_or("minaret.toml");

        let config: MinaretConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("MINARET_").split("_"))
            .extract()
            .map_err(|e| MinaretError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Startup-time validation. Errors here are fatal; nothing is
    /// re-validated at runtime.
    pub fn validate(&self) -> Result<()> {
        if self.provider.installation_id.trim().is_empty() {
            return Err(MinaretError::Config(
                "provider.installation_id must be set".into(),
            ));
        }
        if self.webhook.url.trim().is_empty() {
            return Err(MinaretError::Config("webhook.url must be set".into()));
        }
        if self.webhook.device.trim().is_empty() {
            return Err(MinaretError::Config("webhook.device must be set".into()));
        }
        self.test_mode.zone()?;
        self.test_mode.virtual_start()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> MinaretConfig {
        MinaretConfig {
            gateway: GatewayConfig::default(),
            provider: ProviderConfig {
                base_url: default_provider_base_url(),
                installation_id: "mosque-42".into(),
            },
            webhook: WebhookConfig {
                url: "https://hooks.example.net/play".into(),
                token: Some("secret".into()),
                device: "main-hall".into(),
                azan_audio: default_azan_audio(),
                fajr_azan_audio: default_fajr_azan_audio(),
                announcement_audio: default_announcement_audio(),
            },
            features: FeaturesConfig::default(),
            test_mode: TestModeConfig::default(),
        }
    }

    #[test]
    fn minimal_config_validates() {
        assert!(minimal().validate().is_ok());
    }

    #[test]
    fn missing_installation_id_is_fatal() {
        let mut cfg = minimal();
        cfg.provider.installation_id = "  ".into();
        assert!(matches!(cfg.validate(), Err(MinaretError::Config(_))));
    }

    #[test]
    fn bad_timezone_is_fatal() {
        let mut cfg = minimal();
        cfg.test_mode.timezone = "Mars/Olympus".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bad_start_time_is_fatal() {
        let mut cfg = minimal();
        cfg.test_mode.start_time = "2am".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn default_test_mode_is_disabled_london() {
        let tm = TestModeConfig::default();
        assert!(!tm.enabled);
        assert_eq!(tm.timezone, "Europe/London");
        assert_eq!(
            tm.virtual_start().unwrap(),
            NaiveTime::from_hms_opt(2, 0, 0).unwrap()
        );
    }

    #[test]
    fn features_default_on() {
        let f = FeaturesConfig::default();
        assert!(f.azan_enabled);
        assert!(f.announcement_enabled);
    }
}
