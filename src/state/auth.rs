//! Auth session controller.
//!
//! SYSTEM CONTEXT
//! ==============
//! UI collaborators call the methods here and re-render from the
//! [`AuthState`] published on a `tokio::sync::watch` channel. Every path that
//! ends a session (explicit logout, failed bootstrap, broadcast expiry)
//! converges on one clear operation, so ending a session twice is harmless.
//!
//! ```text
//! Uninitialized -> Bootstrapping -> Authenticated <-> Unauthenticated
//!                              \-> Unauthenticated
//! ```

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::net::client::ApiClient;
use crate::net::error::ApiError;
use crate::net::types::{MessageResponse, Profile, User};
use crate::session::broadcast::SessionEvent;
use crate::validation::{
    validate_email, validate_login_password, validate_name, validate_password, validate_password_confirmation,
    validate_reset_token,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthPhase {
    #[default]
    Uninitialized,
    Bootstrapping,
    Authenticated,
    Unauthenticated,
}

/// Snapshot of the session as the UI sees it.
///
/// `is_authenticated` always equals `user.is_some()`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthState {
    pub phase: AuthPhase,
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub current_profile: Option<Profile>,
    pub profiles: Vec<Profile>,
}

impl AuthState {
    #[must_use]
    pub fn signed_out() -> Self {
        Self { phase: AuthPhase::Unauthenticated, ..Self::default() }
    }

    fn signed_in(user: User) -> Self {
        Self { phase: AuthPhase::Authenticated, user: Some(user), is_authenticated: true, ..Self::default() }
    }
}

#[derive(Clone)]
pub struct AuthSession {
    pub(super) api: ApiClient,
    pub(super) state: Arc<watch::Sender<AuthState>>,
}

impl AuthSession {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let (state, _rx) = watch::channel(AuthState::default());
        Self { api, state: Arc::new(state) }
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Restore a stored session on startup.
    ///
    /// Without a stored token this settles on `Unauthenticated` without any
    /// network call. Any failure of the identity check, including an
    /// unreachable backend, clears local state instead of leaving the session
    /// stuck in `Bootstrapping`.
    pub async fn bootstrap(&self) -> AuthState {
        self.state.send_modify(|s| {
            s.phase = AuthPhase::Bootstrapping;
            s.is_loading = true;
        });

        if self.api.tokens().token().is_none() {
            tracing::debug!("no stored token; starting signed out");
            self.state.send_replace(AuthState::signed_out());
            return self.state();
        }

        match self.api.me().await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "session restored");
                self.state.send_replace(AuthState::signed_in(user));
                self.fetch_profiles().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored session rejected; signing out");
                self.clear_session();
            }
        }
        self.state()
    }

    /// # Errors
    ///
    /// - [`ApiError::Validation`] before any network call for malformed input.
    /// - [`ApiError::Api`] with the server's message for rejected credentials.
    pub async fn login(&self, email: &str, password: &str, remember_me: bool) -> Result<User, ApiError> {
        validate_email(email)?;
        validate_login_password(password)?;

        let tokens = self.api.login(email.trim(), password).await?;
        self.establish_session(&tokens.access_token, tokens.refresh_token.as_deref(), remember_me)
            .await
    }

    /// # Errors
    ///
    /// - [`ApiError::Validation`] for a blank name, bad email, weak password or mismatched confirmation.
    /// - [`ApiError::Api`] when the server rejects the registration.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
        remember_me: bool,
    ) -> Result<User, ApiError> {
        validate_name(name)?;
        validate_email(email)?;
        validate_password(password)?;
        validate_password_confirmation(password, confirm_password)?;

        let tokens = self.api.signup(email.trim(), password, name.trim()).await?;
        self.establish_session(&tokens.access_token, tokens.refresh_token.as_deref(), remember_me)
            .await
    }

    /// Adopt tokens handed back by the Google sign-in redirect.
    ///
    /// # Errors
    ///
    /// Returns the identity-check error; local state is cleared in that case.
    pub async fn complete_oauth(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        remember_me: bool,
    ) -> Result<User, ApiError> {
        self.establish_session(access_token, refresh_token, remember_me)
            .await
    }

    #[must_use]
    pub fn google_login_url(&self) -> String {
        self.api.google_login_url()
    }

    /// Best-effort server logout, then local clear. Safe to call repeatedly.
    pub async fn logout(&self) {
        if self.api.tokens().token().is_some() {
            if let Err(e) = self.api.logout().await {
                tracing::debug!(error = %e, "server logout failed; clearing locally anyway");
            }
        }
        self.clear_session();
        tracing::info!("signed out");
    }

    pub fn handle_session_expired(&self) {
        tracing::info!("session expired; signing out");
        self.clear_session();
    }

    /// Route every broadcast expiry into [`AuthSession::handle_session_expired`].
    ///
    /// The subscription is taken before this returns, so an expiry raised
    /// right after the call is not missed. Abort the handle to stop listening.
    #[must_use]
    pub fn spawn_expiry_listener(&self) -> JoinHandle<()> {
        let mut events = self.api.broadcaster().subscribe();
        let session = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::Expired) => session.handle_session_expired(),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "expiry listener lagged");
                        session.handle_session_expired();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    // =========================================================================
    // PROFILES
    // =========================================================================

    /// Re-fetch the profile list. No-op while signed out; a failed fetch
    /// leaves an empty list and never touches the session itself.
    pub async fn fetch_profiles(&self) -> Vec<Profile> {
        let signed_in = self.state.borrow().is_authenticated;
        if !signed_in {
            return Vec::new();
        }

        match self.api.list_profiles().await {
            Ok(profiles) => {
                self.apply_profiles(profiles.clone());
                profiles
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch profiles");
                self.state.send_if_modified(|s| {
                    if s.profiles.is_empty() {
                        return false;
                    }
                    s.profiles.clear();
                    true
                });
                Vec::new()
            }
        }
    }

    /// Install a freshly fetched list and re-resolve the selection against it:
    /// the in-memory pick wins, then the stored id; a pick missing from the
    /// list is dropped.
    fn apply_profiles(&self, profiles: Vec<Profile>) {
        let tokens = self.api.tokens();
        let in_memory = {
            let state = self.state.borrow();
            if !state.is_authenticated {
                return;
            }
            state.current_profile.as_ref().map(|p| p.id.clone())
        };
        let wanted = in_memory.or_else(|| tokens.current_profile_id());

        let selected = wanted.and_then(|id| {
            let found = profiles.iter().find(|p| p.id == id).cloned();
            if found.is_none() {
                tracing::debug!(profile_id = %id, "selected profile no longer exists");
                tokens.clear_current_profile_id();
            }
            found
        });

        self.state.send_if_modified(|s| {
            if !s.is_authenticated {
                return false;
            }
            s.current_profile = selected;
            s.profiles = profiles;
            true
        });
    }

    // =========================================================================
    // PASSWORD RESET
    // =========================================================================

    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a malformed email, else any request error.
    pub async fn request_password_reset(&self, email: &str) -> Result<MessageResponse, ApiError> {
        validate_email(email)?;
        self.api.request_password_reset(email.trim()).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a blank token, weak password or
    /// mismatched confirmation, else any request error.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<MessageResponse, ApiError> {
        validate_reset_token(token)?;
        validate_password(new_password)?;
        validate_password_confirmation(new_password, confirm_password)?;
        self.api.reset_password(token.trim(), new_password).await
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    /// Shared tail of login, signup and OAuth: store the tokens, forget any
    /// previous profile pick, then confirm identity with `/auth/me`.
    async fn establish_session(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        remember_me: bool,
    ) -> Result<User, ApiError> {
        let tokens = self.api.tokens();
        tokens.clear_tokens();
        tokens.set_remember_me(remember_me);
        tokens.set_tokens(access_token, refresh_token);
        tokens.clear_current_profile_id();

        let user = match self.api.me().await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "identity check failed after sign-in");
                self.clear_session();
                return Err(e);
            }
        };

        tracing::info!(user_id = %user.id, remember_me, "signed in");
        self.state.send_replace(AuthState::signed_in(user.clone()));
        self.fetch_profiles().await;
        Ok(user)
    }

    fn clear_session(&self) {
        self.api.tokens().clear_all();
        self.state.send_replace(AuthState::signed_out());
    }
}
