use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crewwatch_core::notification::DEFAULT_NOTIFICATION_TTL_SECS;
use crewwatch_http::HttpGatewayConfig;
use crewwatch_http::config::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};

use crate::runtime::MonitorSettings;

/// Default config file looked up in the working directory.
pub const CONFIG_FILE: &str = "crewwatch.toml";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("engine.base_url must be an http(s) URL, got {0:?}")]
    InvalidBaseUrl(String),
    #[error("{0} must be > 0")]
    Zero(&'static str),
}

/// Top-level monitor configuration, loaded from `crewwatch.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub engine: EngineConfig,
    pub polling: PollingConfig,
    pub notifications: NotificationConfig,
}

/// Where the crew engine lives and how long a request may take.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Poll periods per endpoint, in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub agents_interval_ms: u64,
    pub status_interval_ms: u64,
    pub stats_interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            agents_interval_ms: 2000,
            status_interval_ms: 2000,
            stats_interval_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub ttl_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_NOTIFICATION_TTL_SECS,
        }
    }
}

impl MonitorConfig {
    /// Load config from `crewwatch.toml` if it exists, then apply env var overrides.
    pub fn load() -> Self {
        let mut config = Self::load_file(Path::new(CONFIG_FILE));
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    fn load_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<MonitorConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!(path = %path.display(), "Loaded configuration");
                    cfg
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Failed to parse config: {e}, using defaults");
                    MonitorConfig::default()
                },
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "No config file found, using defaults");
                MonitorConfig::default()
            },
        }
    }

    /// Apply `CREWWATCH_*` overrides using `lookup` to read variables.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("CREWWATCH_BASE_URL")
            && !url.is_empty()
        {
            self.engine.base_url = url;
        }
        if let Some(val) = lookup("CREWWATCH_REQUEST_TIMEOUT_SECS")
            && let Ok(n) = val.parse::<u64>()
        {
            self.engine.request_timeout_secs = n;
        }
        if let Some(val) = lookup("CREWWATCH_AGENTS_INTERVAL_MS")
            && let Ok(n) = val.parse::<u64>()
        {
            self.polling.agents_interval_ms = n;
        }
        if let Some(val) = lookup("CREWWATCH_STATUS_INTERVAL_MS")
            && let Ok(n) = val.parse::<u64>()
        {
            self.polling.status_interval_ms = n;
        }
        if let Some(val) = lookup("CREWWATCH_STATS_INTERVAL_MS")
            && let Ok(n) = val.parse::<u64>()
        {
            self.polling.stats_interval_ms = n;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.engine.base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(url.to_string()));
        }
        if self.engine.request_timeout_secs == 0 {
            return Err(ConfigError::Zero("engine.request_timeout_secs"));
        }
        if self.polling.agents_interval_ms == 0 {
            return Err(ConfigError::Zero("polling.agents_interval_ms"));
        }
        if self.polling.status_interval_ms == 0 {
            return Err(ConfigError::Zero("polling.status_interval_ms"));
        }
        if self.polling.stats_interval_ms == 0 {
            return Err(ConfigError::Zero("polling.stats_interval_ms"));
        }
        if self.notifications.ttl_secs == 0 {
            return Err(ConfigError::Zero("notifications.ttl_secs"));
        }
        Ok(())
    }

    pub fn gateway(&self) -> HttpGatewayConfig {
        HttpGatewayConfig {
            base_url: self.engine.base_url.clone(),
            request_timeout: Duration::from_secs(self.engine.request_timeout_secs),
            ..HttpGatewayConfig::default()
        }
    }

    pub fn settings(&self) -> MonitorSettings {
        MonitorSettings {
            agents_interval: Duration::from_millis(self.polling.agents_interval_ms),
            status_interval: Duration::from_millis(self.polling.status_interval_ms),
            stats_interval: Duration::from_millis(self.polling.stats_interval_ms),
            notification_ttl: Duration::from_secs(self.notifications.ttl_secs),
        }
    }
}
