//! Session-aware request executor.
//!
//! ARCHITECTURE
//! ============
//! `ApiClient::request` attaches the stored bearer token, and on a 401 runs
//! the single-flight refresh and retries the original request exactly once.
//! When the session cannot be recovered it wipes every stored credential,
//! broadcasts session expiry, and fails with [`ApiError::SessionExpired`].
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx answers become [`ApiError::Api`] carrying the server's `message` or
//! `detail`. A 2xx with an empty body parses as `{}` so unit-returning calls
//! never trip over JSON parsing.

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use super::error::{ApiError, error_message};
use super::refresh::{RefreshCoordinator, RefreshOutcome};
use super::transport::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};
use super::types::TokenResponse;
use crate::config::PulsoConfig;
use crate::session::broadcast::SessionBroadcaster;
use crate::storage::tokens::TokenStore;

pub const REFRESH_ENDPOINT: &str = "/auth/refresh";

/// Per-call options for [`ApiClient::request`].
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    /// Send no bearer token and treat 401 as an ordinary failure.
    pub skip_auth: bool,
    /// Attempt refresh + one retry on 401.
    pub retry_on_unauthorized: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self { method: Method::Get, body: None, headers: Vec::new(), skip_auth: false, retry_on_unauthorized: true }
    }
}

impl RequestOptions {
    #[must_use]
    pub fn get() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn post(body: Value) -> Self {
        Self { method: Method::Post, body: Some(body), ..Self::default() }
    }

    #[must_use]
    pub fn put(body: Value) -> Self {
        Self { method: Method::Put, body: Some(body), ..Self::default() }
    }

    #[must_use]
    pub fn delete() -> Self {
        Self { method: Method::Delete, ..Self::default() }
    }

    #[must_use]
    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    #[must_use]
    pub fn no_retry(mut self) -> Self {
        self.retry_on_unauthorized = false;
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    tokens: Arc<TokenStore>,
    refresh: RefreshCoordinator,
    broadcaster: SessionBroadcaster,
}

impl ApiClient {
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<TokenStore>,
        broadcaster: SessionBroadcaster,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            inner: Arc::new(ClientInner {
                transport,
                base_url,
                tokens,
                refresh: RefreshCoordinator::new(),
                broadcaster,
            }),
        }
    }

    /// Build a client that talks HTTP through `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn from_config(
        config: &PulsoConfig,
        tokens: Arc<TokenStore>,
        broadcaster: SessionBroadcaster,
    ) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config.timeouts)?;
        Ok(Self::new(config.api_base_url.clone(), Arc::new(transport), tokens, broadcaster))
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.inner.tokens
    }

    #[must_use]
    pub fn broadcaster(&self) -> &SessionBroadcaster {
        &self.inner.broadcaster
    }

    #[must_use]
    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.inner.refresh
    }

    #[must_use]
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.inner.base_url, endpoint)
    }

    /// Perform a call and decode its JSON body into `T`.
    ///
    /// # Errors
    ///
    /// - [`ApiError::SessionExpired`] when a 401 could not be recovered by refresh.
    /// - [`ApiError::Api`] for any other non-2xx status.
    /// - [`ApiError::Network`] / [`ApiError::Decode`] for transport and parse failures.
    pub async fn request<T: DeserializeOwned>(&self, endpoint: &str, options: RequestOptions) -> Result<T, ApiError> {
        let request_id = Uuid::new_v4();
        let token = if options.skip_auth { None } else { self.inner.tokens.token() };
        let response = self
            .send(endpoint, &options, token.as_deref(), request_id)
            .await?;

        if response.status == 401 && options.retry_on_unauthorized && !options.skip_auth {
            tracing::debug!(%request_id, endpoint, "unauthorized; attempting token refresh");
            return self
                .retry_after_refresh(endpoint, &options, request_id)
                .await;
        }

        parse_response(response)
    }

    async fn retry_after_refresh<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: &RequestOptions,
        request_id: Uuid,
    ) -> Result<T, ApiError> {
        let RefreshOutcome { episode, access_token } = self.refresh_access_token().await;
        let Some(token) = access_token else {
            return Err(self.expire_session(episode));
        };

        let retried = self
            .send(endpoint, options, Some(&token), request_id)
            .await?;
        if !retried.is_success() {
            tracing::warn!(%request_id, endpoint, status = retried.status, "request failed after token refresh");
            return Err(self.expire_session(episode));
        }
        parse_body(&retried.body)
    }

    /// Exchange the stored refresh token for a new access token, joining any
    /// refresh already in flight.
    pub async fn refresh_access_token(&self) -> RefreshOutcome {
        let transport = Arc::clone(&self.inner.transport);
        let tokens = Arc::clone(&self.inner.tokens);
        let url = self.url(REFRESH_ENDPOINT);
        self.inner
            .refresh
            .run(move || exchange_refresh_token(transport, tokens, url))
            .await
    }

    fn expire_session(&self, episode: u64) -> ApiError {
        self.inner.tokens.clear_all();
        if self.inner.refresh.claim_expiry(episode) {
            self.inner.broadcaster.notify_expired();
        } else {
            tracing::debug!(episode, "session expiry already reported for episode");
        }
        ApiError::SessionExpired
    }

    async fn send(
        &self,
        endpoint: &str,
        options: &RequestOptions,
        token: Option<&str>,
        request_id: Uuid,
    ) -> Result<HttpResponse, ApiError> {
        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("X-Request-Id".to_string(), request_id.to_string()),
        ];
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        headers.extend(options.headers.iter().cloned());

        let request = HttpRequest {
            method: options.method,
            url: self.url(endpoint),
            headers,
            body: options.body.as_ref().map(Value::to_string),
        };
        tracing::debug!(%request_id, method = %options.method, endpoint, "api request");
        let response = self.inner.transport.send(request).await?;
        tracing::debug!(%request_id, status = response.status, "api response");
        Ok(response)
    }
}

/// Leader side of a refresh episode. Any failure yields `None`.
async fn exchange_refresh_token(
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<TokenStore>,
    url: String,
) -> Option<String> {
    let Some(refresh_token) = tokens.refresh_token() else {
        tracing::info!("no refresh token stored; cannot renew session");
        return None;
    };

    let request = HttpRequest {
        method: Method::Post,
        url,
        headers: vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("X-Request-Id".to_string(), Uuid::new_v4().to_string()),
        ],
        body: Some(serde_json::json!({ "refresh_token": refresh_token }).to_string()),
    };

    let response = match transport.send(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "token refresh request failed");
            return None;
        }
    };
    if !response.is_success() {
        tracing::warn!(status = response.status, "token refresh rejected");
        return None;
    }

    match serde_json::from_str::<TokenResponse>(&response.body) {
        Ok(renewed) => {
            tokens.set_tokens(&renewed.access_token, renewed.refresh_token.as_deref());
            tracing::info!("access token refreshed");
            Some(renewed.access_token)
        }
        Err(e) => {
            tracing::warn!(error = %e, "token refresh response unreadable");
            None
        }
    }
}

fn parse_response<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    if !response.is_success() {
        let message = error_message(response.status, &response.body);
        tracing::debug!(status = response.status, %message, "api error response");
        return Err(ApiError::Api { status: response.status, message });
    }
    parse_body(&response.body)
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let body = if body.trim().is_empty() { "{}" } else { body };
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}
