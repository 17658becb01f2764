//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::ApiClientConfig;
use crate::dashboard::DashboardConfig;
use crate::projector::ProjectorConfig;
use crate::push::PushTransportConfig;
use crate::reconcile::ReconcilerConfig;
use crate::scheduler::SchedulerConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub push: PushConfig,

    #[serde(default)]
    pub refresh: RefreshConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Data API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_articles_limit")]
    pub articles_limit: usize,

    /// Only poll articles in this category
    pub articles_category: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_articles_limit() -> usize {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            articles_limit: default_articles_limit(),
            articles_category: None,
        }
    }
}

/// Push channel configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    #[serde(default = "default_push_enabled")]
    pub enabled: bool,

    #[serde(default = "default_push_url")]
    pub url: String,

    #[serde(default = "default_reconnect_base")]
    pub reconnect_base_ms: u64,

    #[serde(default = "default_reconnect_max")]
    pub reconnect_max_ms: u64,

    /// Unlimited when absent
    pub max_reconnect_attempts: Option<u32>,
}

fn default_push_enabled() -> bool {
    true
}

fn default_push_url() -> String {
    "ws://localhost:5000/ws".to_string()
}

fn default_reconnect_base() -> u64 {
    1000
}

fn default_reconnect_max() -> u64 {
    30000
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: default_push_enabled(),
            url: default_push_url(),
            reconnect_base_ms: default_reconnect_base(),
            reconnect_max_ms: default_reconnect_max(),
            max_reconnect_attempts: None,
        }
    }
}

/// Polling and notice timing
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_poll_while_connected")]
    pub poll_while_connected: bool,

    #[serde(default = "default_status_dismiss")]
    pub status_dismiss_ms: u64,
}

fn default_poll_interval() -> u64 {
    30
}

fn default_poll_while_connected() -> bool {
    true
}

fn default_status_dismiss() -> u64 {
    3000
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            poll_while_connected: default_poll_while_connected(),
            status_dismiss_ms: default_status_dismiss(),
        }
    }
}

/// Projection limits
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,

    #[serde(default = "default_categories_top")]
    pub categories_top: usize,

    #[serde(default = "default_regional_top")]
    pub regional_top: usize,

    #[serde(default = "default_authors_top")]
    pub authors_top: usize,
}

fn default_title_max_chars() -> usize {
    50
}

fn default_categories_top() -> usize {
    10
}

fn default_regional_top() -> usize {
    15
}

fn default_authors_top() -> usize {
    10
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title_max_chars: default_title_max_chars(),
            categories_top: default_categories_top(),
            regional_top: default_regional_top(),
            authors_top: default_authors_top(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("pulsewatch").join("config.toml")),
            Some(PathBuf::from("/etc/pulsewatch/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        // Fall back to environment-only config
        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        fn parsed<T: std::str::FromStr>(
            var: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            var(key).and_then(|v| v.parse().ok())
        }

        // API overrides
        if let Some(url) = var("PULSEWATCH_API_URL") {
            self.api.base_url = url;
        }
        if let Some(secs) = parsed(&var, "PULSEWATCH_API_TIMEOUT") {
            self.api.request_timeout_secs = secs;
        }
        if let Some(limit) = parsed(&var, "PULSEWATCH_ARTICLES_LIMIT") {
            self.api.articles_limit = limit;
        }
        if let Some(category) = var("PULSEWATCH_ARTICLES_CATEGORY") {
            self.api.articles_category = Some(category).filter(|c| !c.is_empty());
        }

        // Push overrides
        if let Some(enabled) = parsed(&var, "PULSEWATCH_PUSH_ENABLED") {
            self.push.enabled = enabled;
        }
        if let Some(url) = var("PULSEWATCH_PUSH_URL") {
            self.push.url = url;
        }

        // Refresh overrides
        if let Some(secs) = parsed(&var, "PULSEWATCH_POLL_INTERVAL") {
            self.refresh.poll_interval_secs = secs;
        }
        if let Some(poll) = parsed(&var, "PULSEWATCH_POLL_WHILE_CONNECTED") {
            self.refresh.poll_while_connected = poll;
        }

        // Logging overrides
        if let Some(level) = var("PULSEWATCH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("PULSEWATCH_LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Some(file) = var("PULSEWATCH_LOG_FILE") {
            self.logging.file = Some(file);
        }
    }

    /// Reject settings the session cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "api.base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.api.articles_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "api.articles_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.refresh.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "refresh.poll_interval_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn api_client_config(&self) -> ApiClientConfig {
        ApiClientConfig {
            base_url: self.api.base_url.clone(),
            request_timeout_ms: self.api.request_timeout_secs.saturating_mul(1000),
            articles_limit: self.api.articles_limit,
            articles_category: self.api.articles_category.clone(),
        }
    }

    pub fn push_transport_config(&self) -> PushTransportConfig {
        PushTransportConfig {
            url: self.push.url.clone(),
            reconnect_base: Duration::from_millis(self.push.reconnect_base_ms),
            reconnect_max: Duration::from_millis(self.push.reconnect_max_ms),
            max_reconnect_attempts: self.push.max_reconnect_attempts,
        }
    }

    pub fn dashboard_config(&self) -> DashboardConfig {
        DashboardConfig {
            reconciler: ReconcilerConfig {
                articles_limit: self.api.articles_limit,
            },
            projector: ProjectorConfig {
                title_max_chars: self.display.title_max_chars,
                categories_top: self.display.categories_top,
                regional_top: self.display.regional_top,
                authors_top: self.display.authors_top,
            },
            scheduler: SchedulerConfig {
                poll_interval: Duration::from_secs(self.refresh.poll_interval_secs),
                poll_while_connected: self.refresh.poll_while_connected,
            },
            status_dismiss: Duration::from_millis(self.refresh.status_dismiss_ms),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Pulsewatch Configuration
#
# Environment variables override these settings:
# - PULSEWATCH_API_URL
# - PULSEWATCH_API_TIMEOUT
# - PULSEWATCH_ARTICLES_LIMIT
# - PULSEWATCH_ARTICLES_CATEGORY
# - PULSEWATCH_PUSH_ENABLED
# - PULSEWATCH_PUSH_URL
# - PULSEWATCH_POLL_INTERVAL
# - PULSEWATCH_POLL_WHILE_CONNECTED
# - PULSEWATCH_LOG_LEVEL
# - PULSEWATCH_LOG_FORMAT
# - PULSEWATCH_LOG_FILE

[api]
# Base URL of the dashboard data API
base_url = "http://localhost:5000"

# Request timeout in seconds
request_timeout_secs = 10

# How many recent articles to request and keep
articles_limit = 10

# Only show articles from one category (all categories if unset)
# articles_category = "科技"

[push]
# Connect to the live push channel
enabled = true

# WebSocket endpoint of the push channel
url = "ws://localhost:5000/ws"

# Reconnect backoff: base * 2^attempt, capped at max (ms)
reconnect_base_ms = 1000
reconnect_max_ms = 30000

# Give up after this many consecutive failures (unlimited if unset)
# max_reconnect_attempts = 10

[refresh]
# Full poll interval in seconds
poll_interval_secs = 30

# Keep polling on the interval while the push channel is connected
poll_while_connected = true

# How long connect/disconnect notices stay up (ms)
status_dismiss_ms = 3000

[display]
# Article titles longer than this are truncated
title_max_chars = 50

# Entries shown in the top-N charts
categories_top = 10
regional_top = 15
authors_top = 10

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/pulsewatch/pulsewatch.log"
"#
    .to_string()
}
