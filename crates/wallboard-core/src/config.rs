use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::preset::Preset;

pub const DEFAULT_PORT: u16 = 18790;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_SWEEP_SECS: u64 = 5;
pub const DEFAULT_SCROLL_TICK_MS: u64 = 50;
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024;

/// Top-level config (wallboard.toml + WALLBOARD_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WallboardConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub preset: Preset,
    #[serde(default)]
    pub webhooks: WebhooksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Token display clients must present (`?token=` or bearer header).
    /// `None` leaves the display endpoints open.
    pub display_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            display_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Credential this display presents to the store. Checked against
    /// `display_access_tokens` on every fetch when set.
    pub access_token: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            access_token: None,
        }
    }
}

/// Local-time settings for the calendar grid and "today".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Offset from UTC in minutes, e.g. 60 for CET.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl DisplayConfig {
    pub fn offset(&self) -> chrono::FixedOffset {
        use chrono::Offset;
        chrono::FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| chrono::Utc.fix())
    }
}

/// Timing of the engine's own loops (not operator-facing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_sweep_secs")]
    pub sweep_secs: u64,
    #[serde(default = "default_scroll_tick_ms")]
    pub scroll_tick_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            sweep_secs: DEFAULT_SWEEP_SECS,
            scroll_tick_ms: DEFAULT_SCROLL_TICK_MS,
        }
    }
}

/// Authentication mode for the change-notification webhook.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WebhookAuthMode {
    /// HMAC-SHA256 over the raw request body in `X-Hub-Signature-256`.
    HmacSha256,
    /// Static bearer token in the Authorization header.
    #[default]
    BearerToken,
    /// No authentication — use only for internal/trusted networks.
    None,
}

/// Change-notification ingress from the upstream store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhooksConfig {
    /// When false `/webhooks/changes` returns 404.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub auth_mode: WebhookAuthMode,
    pub secret: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}
fn default_sweep_secs() -> u64 {
    DEFAULT_SWEEP_SECS
}
fn default_scroll_tick_ms() -> u64 {
    DEFAULT_SCROLL_TICK_MS
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.wallboard/wallboard.db", home)
}

impl WallboardConfig {
    /// Load config from a TOML file with WALLBOARD_* env var overrides.
    ///
    /// Checks the explicit path argument first, then ~/.wallboard/wallboard.toml.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        Self::figment(&path)
            .extract()
            .map_err(|e| crate::error::WallboardError::Config(e.to_string()))
    }

    fn figment(path: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("WALLBOARD_").split("__"))
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.wallboard/wallboard.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::providers::Toml;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg: WallboardConfig = Figment::new().merge(Toml::string("")).extract().unwrap();
        assert_eq!(cfg.gateway.port, DEFAULT_PORT);
        assert_eq!(cfg.engine.debounce_ms, 300);
        assert_eq!(cfg.engine.sweep_secs, 5);
        assert!(!cfg.webhooks.enabled);
    }

    #[test]
    fn preset_section_is_parsed() {
        let toml = r#"
            [display]
            utc_offset_minutes = 120

            [preset]
            panel_order = ["calendar", "crew"]
            highlight_ttl_seconds = 600

            [preset.panel_durations]
            calendar = 30
        "#;
        let cfg: WallboardConfig = Figment::new().merge(Toml::string(toml)).extract().unwrap();
        let preset = cfg.preset.normalized();
        assert_eq!(preset.panel_order[0], crate::PanelKey::Calendar);
        assert_eq!(preset.highlight_ttl_secs, 600);
        assert_eq!(preset.dwell(crate::PanelKey::Calendar).as_secs(), 30);
        assert_eq!(cfg.display.offset().local_minus_utc(), 7200);
    }
}
