//! Error taxonomy for API calls.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use serde_json::Value;

use crate::validation::ValidationError;

/// Errors produced by [`crate::net::client::ApiClient`] and the flows built on it.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Input was rejected before any network call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The server answered with a non-2xx status that was not recoverable by refresh.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Refresh failed or the retried request still failed; credentials were cleared.
    #[error("session expired, please sign in again")]
    SessionExpired,

    /// A session-only operation was attempted while signed out; nothing was sent.
    #[error("not signed in")]
    NotSignedIn,

    /// The request never produced a response.
    #[error("network request failed: {0}")]
    Network(String),

    /// A 2xx response body did not match the expected shape.
    #[error("response parse failed: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::Api { .. } => "E_API",
            Self::SessionExpired => "E_SESSION_EXPIRED",
            Self::NotSignedIn => "E_NOT_SIGNED_IN",
            Self::Network(_) => "E_NETWORK",
            Self::Decode(_) => "E_DECODE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    /// Whether a caller may reasonably try the same call again later.
    /// The executor itself never retries these.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Api { status: 429 | 500..=599, .. })
    }

    /// HTTP status for server-reported failures.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

/// Human-readable message for a failed response.
///
/// Prefers the payload's `message`, then `detail` (a string, or a list of
/// `{ msg }` validation entries), then a generic status message.
pub(crate) fn error_message(status: u16, body: &str) -> String {
    let payload = serde_json::from_str::<Value>(body).ok();
    payload
        .as_ref()
        .and_then(|v| text_field(v, "message").or_else(|| detail_text(v)))
        .unwrap_or_else(|| generic_error_message(status))
}

pub(crate) fn generic_error_message(status: u16) -> String {
    format!("Request failed with status {status}")
}

fn text_field(payload: &Value, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn detail_text(payload: &Value) -> Option<String> {
    match payload.get("detail")? {
        Value::String(_) => text_field(payload, "detail"),
        Value::Array(entries) => {
            let parts: Vec<&str> = entries
                .iter()
                .filter_map(|e| e.get("msg").and_then(Value::as_str).or_else(|| e.as_str()))
                .collect();
            if parts.is_empty() { None } else { Some(parts.join("; ")) }
        }
        _ => None,
    }
}
