//! Client configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "/api";
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_STATE_DIR: &str = ".pulso";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulsoConfig {
    /// Absolute API base URL without a trailing slash.
    pub api_base_url: String,
    pub timeouts: Timeouts,
    /// Directory holding the durable credential store.
    pub state_dir: PathBuf,
    /// Default remember-me choice for new sessions.
    pub remember_me: bool,
}

impl PulsoConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PULSO_API_URL`: default `/api`; a relative path is joined onto `PULSO_ORIGIN`
    /// - `PULSO_ORIGIN`: default `http://localhost:3000`
    /// - `PULSO_REQUEST_TIMEOUT_SECS`: default 30
    /// - `PULSO_CONNECT_TIMEOUT_SECS`: default 10
    /// - `PULSO_STATE_DIR`: default `.pulso`
    /// - `PULSO_REMEMBER_ME`: boolean, default true
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the API URL cannot be resolved
    /// to an absolute `http(s)` URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var("PULSO_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let origin = std::env::var("PULSO_ORIGIN").unwrap_or_else(|_| DEFAULT_ORIGIN.to_string());
        let api_base_url = resolve_base_url(&api_url, &origin)?;
        let timeouts = Timeouts {
            request_secs: env_parse_u64("PULSO_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("PULSO_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let state_dir = std::env::var("PULSO_STATE_DIR")
            .map_or_else(|_| PathBuf::from(DEFAULT_STATE_DIR), PathBuf::from);
        let remember_me = env_bool("PULSO_REMEMBER_ME").unwrap_or(true);

        Ok(Self { api_base_url, timeouts, state_dir, remember_me })
    }

    /// Config pointing at `api_base_url` with every other setting at its default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] for relative or non-http URLs.
    pub fn with_base_url(api_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: resolve_base_url(api_base_url, DEFAULT_ORIGIN)?,
            timeouts: Timeouts::default(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            remember_me: true,
        })
    }
}

/// Resolve the configured API URL against an origin.
///
/// Absolute `http(s)` URLs are used as-is; paths starting with `/` are
/// appended to `origin`. Trailing slashes are trimmed.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBaseUrl`] for anything else.
pub fn resolve_base_url(api_url: &str, origin: &str) -> Result<String, ConfigError> {
    let api_url = api_url.trim();
    if is_http_url(api_url) {
        return Ok(api_url.trim_end_matches('/').to_string());
    }
    if api_url.starts_with('/') {
        let origin = origin.trim();
        if !is_http_url(origin) {
            return Err(ConfigError::InvalidBaseUrl(format!("origin '{origin}' is not an http(s) URL")));
        }
        return Ok(format!("{}{}", origin.trim_end_matches('/'), api_url.trim_end_matches('/')));
    }
    Err(ConfigError::InvalidBaseUrl(api_url.to_string()))
}

fn is_http_url(raw: &str) -> bool {
    raw.starts_with("http://") || raw.starts_with("https://")
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
