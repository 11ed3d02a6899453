//! Runtime configuration
//!
//! Values are read once at startup. Everything has a default so the viewer
//! runs against a local backend with no environment set.

use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

/// Backend used when `OBD_DASH_API_URL` is unset
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Dashboard auto-refresh period
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Rows requested per fetch
pub const DEFAULT_FETCH_LIMIT: u32 = 500;

/// The backend refuses to return more rows than this
pub const MAX_FETCH_LIMIT: u32 = 1000;

/// Backend base URL
pub const ENV_API_URL: &str = "OBD_DASH_API_URL";
/// Auto-refresh period in whole seconds
pub const ENV_REFRESH_SECS: &str = "OBD_DASH_REFRESH_SECS";
/// Rows per fetch
pub const ENV_FETCH_LIMIT: &str = "OBD_DASH_FETCH_LIMIT";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The backend URL did not parse or is not http(s)
    #[error("Invalid API URL '{url}': {reason}")]
    InvalidUrl {
        /// URL as given
        url: String,
        /// Parser or scheme complaint
        reason: String,
    },

    /// A setting was out of range or not a number
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue {
        /// Setting name
        key: &'static str,
        /// Rejected value
        value: String,
    },
}

/// Viewer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the telemetry backend, always ending in `/`
    pub api_url: Url,
    /// Auto-refresh period
    pub refresh_interval: Duration,
    /// Rows requested per fetch
    pub fetch_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: Url::parse(&format!("{}/", DEFAULT_API_URL)).expect("default URL is valid"),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            fetch_limit: DEFAULT_FETCH_LIMIT,
        }
    }
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using a custom variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            config.api_url = parse_api_url(&url)?;
        }

        if let Some(raw) = lookup(ENV_REFRESH_SECS) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: ENV_REFRESH_SECS,
                    value: raw.clone(),
                })?;
            config.refresh_interval = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup(ENV_FETCH_LIMIT) {
            config.fetch_limit = parse_fetch_limit(&raw)?;
        }

        tracing::debug!(api_url = %config.api_url, "Loaded configuration");
        Ok(config)
    }

    /// Override the backend URL
    pub fn with_api_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.api_url = parse_api_url(url)?;
        Ok(self)
    }
}

/// Parse a base URL, normalizing it so relative endpoint joins keep any
/// path prefix
pub fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };

    let url = Url::parse(&with_slash).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// Parse a row limit within `1..=MAX_FETCH_LIMIT`
pub fn parse_fetch_limit(raw: &str) -> Result<u32, ConfigError> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|l| (1..=MAX_FETCH_LIMIT).contains(l))
        .ok_or(ConfigError::InvalidValue {
            key: ENV_FETCH_LIMIT,
            value: raw.to_string(),
        })
}
