//! Typed wrappers for every Pulso REST route.
//!
//! Auth bootstrap endpoints (`login`, `signup`, password reset, raw refresh)
//! skip the bearer token; `logout` never triggers a refresh so a dead session
//! can always be abandoned quietly.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use serde_json::{Value, json};

use super::client::{ApiClient, REFRESH_ENDPOINT, RequestOptions};
use super::error::ApiError;
use super::types::{
    BillingCycle, Empty, Invoice, MessageResponse, PortalSession, Profile, Subscription, TokenResponse, User,
};

pub const GOOGLE_LOGIN_ENDPOINT: &str = "/auth/google/login";

fn profile_endpoint(profile_id: &str) -> String {
    format!("/auth/profiles/{profile_id}")
}

fn profile_body(name: &str, description: Option<&str>) -> serde_json::Value {
    match description {
        Some(description) => json!({ "name": name, "description": description }),
        None => json!({ "name": name }),
    }
}

impl ApiClient {
    // =========================================================================
    // AUTH
    // =========================================================================

    /// `POST /auth/login`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Api`] with the server's message on bad credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let body = json!({ "email": email, "password": password });
        self.request("/auth/login", RequestOptions::post(body).skip_auth())
            .await
    }

    /// `POST /auth/signup`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Api`] when the server rejects the registration.
    pub async fn signup(&self, email: &str, password: &str, name: &str) -> Result<TokenResponse, ApiError> {
        let body = json!({ "email": email, "password": password, "name": name });
        self.request("/auth/signup", RequestOptions::post(body).skip_auth())
            .await
    }

    /// `POST /auth/logout`
    ///
    /// # Errors
    ///
    /// Returns any transport or status error; callers treat logout as best-effort.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let _: Empty = self
            .request("/auth/logout", RequestOptions::post(json!({})).no_retry())
            .await?;
        Ok(())
    }

    /// `GET /auth/me`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::SessionExpired`] when the stored session is dead.
    pub async fn me(&self) -> Result<User, ApiError> {
        self.request("/auth/me", RequestOptions::get()).await
    }

    /// `POST /auth/refresh` without the single-flight coordinator or token
    /// storage. The executor uses its own path; this is for explicit callers.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Api`] when the refresh token is rejected.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, ApiError> {
        let body = json!({ "refresh_token": refresh_token });
        self.request(REFRESH_ENDPOINT, RequestOptions::post(body).skip_auth())
            .await
    }

    /// `POST /auth/request-password-reset`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Api`] when the server refuses the request.
    pub async fn request_password_reset(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let body = json!({ "email": email });
        self.request("/auth/request-password-reset", RequestOptions::post(body).skip_auth())
            .await
    }

    /// `POST /auth/reset-password`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Api`] for an invalid or expired reset token.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<MessageResponse, ApiError> {
        let body = json!({ "token": token, "new_password": new_password });
        self.request("/auth/reset-password", RequestOptions::post(body).skip_auth())
            .await
    }

    /// Where the browser is sent to start Google sign-in.
    #[must_use]
    pub fn google_login_url(&self) -> String {
        self.url(GOOGLE_LOGIN_ENDPOINT)
    }

    // =========================================================================
    // PROFILES
    // =========================================================================

    /// `GET /auth/profiles`
    ///
    /// # Errors
    ///
    /// Returns any request error.
    pub async fn list_profiles(&self) -> Result<Vec<Profile>, ApiError> {
        self.request("/auth/profiles", RequestOptions::get()).await
    }

    /// `POST /auth/profiles`
    ///
    /// # Errors
    ///
    /// Returns any request error.
    pub async fn create_profile(&self, name: &str, description: Option<&str>) -> Result<Profile, ApiError> {
        self.request("/auth/profiles", RequestOptions::post(profile_body(name, description)))
            .await
    }

    /// `PUT /auth/profiles/{id}`
    ///
    /// # Errors
    ///
    /// Returns any request error.
    pub async fn update_profile(
        &self,
        profile_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Profile, ApiError> {
        self.request(&profile_endpoint(profile_id), RequestOptions::put(profile_body(name, description)))
            .await
    }

    /// `DELETE /auth/profiles/{id}`
    ///
    /// # Errors
    ///
    /// Returns any request error.
    pub async fn delete_profile(&self, profile_id: &str) -> Result<(), ApiError> {
        let _: Empty = self
            .request(&profile_endpoint(profile_id), RequestOptions::delete())
            .await?;
        Ok(())
    }

    // =========================================================================
    // SUBSCRIPTION
    // =========================================================================

    /// `GET /subscription`; `None` when the account has no subscription,
    /// which the server signals with `null`, `{}` or an empty body.
    ///
    /// # Errors
    ///
    /// Returns any request error.
    pub async fn subscription(&self) -> Result<Option<Subscription>, ApiError> {
        let raw: Value = self.request("/subscription", RequestOptions::get()).await?;
        if raw.is_null() || raw.as_object().is_some_and(serde_json::Map::is_empty) {
            return Ok(None);
        }
        serde_json::from_value(raw)
            .map(Some)
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `GET /subscription/invoices`
    ///
    /// # Errors
    ///
    /// Returns any request error.
    pub async fn invoices(&self) -> Result<Vec<Invoice>, ApiError> {
        self.request("/subscription/invoices", RequestOptions::get())
            .await
    }

    /// `POST /subscription/cancel`; `immediately = false` cancels at period end.
    ///
    /// # Errors
    ///
    /// Returns any request error.
    pub async fn cancel_subscription(&self, immediately: bool) -> Result<Subscription, ApiError> {
        self.request("/subscription/cancel", RequestOptions::post(json!({ "immediately": immediately })))
            .await
    }

    /// `POST /subscription/resume`
    ///
    /// # Errors
    ///
    /// Returns any request error.
    pub async fn resume_subscription(&self) -> Result<Subscription, ApiError> {
        self.request("/subscription/resume", RequestOptions::post(json!({})))
            .await
    }

    /// `POST /subscription/change-plan`
    ///
    /// # Errors
    ///
    /// Returns any request error.
    pub async fn change_plan(&self, plan_id: &str, billing_cycle: BillingCycle) -> Result<Subscription, ApiError> {
        let body = json!({ "planId": plan_id, "billingCycle": billing_cycle.as_str() });
        self.request("/subscription/change-plan", RequestOptions::post(body))
            .await
    }

    /// `GET /subscription/portal`
    ///
    /// # Errors
    ///
    /// Returns any request error.
    pub async fn billing_portal(&self) -> Result<PortalSession, ApiError> {
        self.request("/subscription/portal", RequestOptions::get())
            .await
    }
}
