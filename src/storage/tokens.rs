//! Credential storage across the durable and session scopes.
//!
//! ARCHITECTURE
//! ============
//! The remember-me flag picks which backend receives writes. Every write also
//! scrubs the same keys from the other backend, so at most one backend ever
//! holds a given credential and reads never have to guess which one is live.
//! Clearing always hits both backends, so logout works no matter how the flag
//! changed since login.
//!
//! ERROR HANDLING
//! ==============
//! Backend write failures are logged and swallowed: an auth flow must never
//! stall because the durable file could not be rewritten.

#[cfg(test)]
#[path = "tokens_test.rs"]
mod tests;

use std::path::Path;
use std::sync::Arc;

use super::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};

pub const ACCESS_TOKEN_KEY: &str = "pulso_access_token";
pub const REFRESH_TOKEN_KEY: &str = "pulso_refresh_token";
pub const REMEMBER_ME_KEY: &str = "pulso_remember_me";
pub const CURRENT_PROFILE_KEY: &str = "pulso_current_profile_id";

/// File name of the durable store inside the state directory.
pub const SESSION_FILE_NAME: &str = "session.json";

pub struct TokenStore {
    durable: Arc<dyn KeyValueStorage>,
    ephemeral: Arc<dyn KeyValueStorage>,
}

impl TokenStore {
    #[must_use]
    pub fn new(durable: Arc<dyn KeyValueStorage>, ephemeral: Arc<dyn KeyValueStorage>) -> Self {
        Self { durable, ephemeral }
    }

    /// Both scopes in memory; nothing outlives the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), Arc::new(MemoryStorage::new()))
    }

    /// Durable scope backed by `<state_dir>/session.json`, session scope in memory.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if an existing session file cannot be read at all.
    pub fn open(state_dir: &Path) -> Result<Self, StorageError> {
        let durable = FileStorage::open(state_dir.join(SESSION_FILE_NAME))?;
        Ok(Self::new(Arc::new(durable), Arc::new(MemoryStorage::new())))
    }

    // =========================================================================
    // REMEMBER ME
    // =========================================================================

    /// Defaults to `true` when never recorded.
    #[must_use]
    pub fn remember_me(&self) -> bool {
        self.durable
            .get(REMEMBER_ME_KEY)
            .map_or(true, |v| v == "true")
    }

    pub fn set_remember_me(&self, remember: bool) {
        write(self.durable.as_ref(), REMEMBER_ME_KEY, if remember { "true" } else { "false" });
    }

    /// `(selected, other)` according to the current remember-me flag.
    fn backends(&self) -> (&dyn KeyValueStorage, &dyn KeyValueStorage) {
        if self.remember_me() {
            (self.durable.as_ref(), self.ephemeral.as_ref())
        } else {
            (self.ephemeral.as_ref(), self.durable.as_ref())
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        let (selected, other) = self.backends();
        selected.get(key).or_else(|| other.get(key))
    }

    fn store(&self, key: &str, value: &str) {
        let (selected, other) = self.backends();
        write(selected, key, value);
        erase(other, key);
    }

    fn erase_everywhere(&self, key: &str) {
        erase(self.durable.as_ref(), key);
        erase(self.ephemeral.as_ref(), key);
    }

    // =========================================================================
    // TOKENS
    // =========================================================================

    /// Store a new access token and, when given, a new refresh token.
    ///
    /// Without a new refresh token the existing one is kept, moved into the
    /// selected backend if the flag changed since it was written.
    pub fn set_tokens(&self, access_token: &str, refresh_token: Option<&str>) {
        let refresh_token = refresh_token
            .map(str::to_owned)
            .or_else(|| self.refresh_token());
        self.store(ACCESS_TOKEN_KEY, access_token);
        match refresh_token {
            Some(refresh) => self.store(REFRESH_TOKEN_KEY, &refresh),
            None => self.erase_everywhere(REFRESH_TOKEN_KEY),
        }
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY)
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY)
    }

    pub fn clear_tokens(&self) {
        self.erase_everywhere(ACCESS_TOKEN_KEY);
        self.erase_everywhere(REFRESH_TOKEN_KEY);
    }

    // =========================================================================
    // CURRENT PROFILE
    // =========================================================================

    pub fn set_current_profile_id(&self, profile_id: &str) {
        self.store(CURRENT_PROFILE_KEY, profile_id);
    }

    #[must_use]
    pub fn current_profile_id(&self) -> Option<String> {
        self.read(CURRENT_PROFILE_KEY)
    }

    pub fn clear_current_profile_id(&self) {
        self.erase_everywhere(CURRENT_PROFILE_KEY);
    }

    /// Drop every credential and the profile selection from both scopes.
    pub fn clear_all(&self) {
        self.clear_tokens();
        self.clear_current_profile_id();
    }
}

fn write(backend: &dyn KeyValueStorage, key: &str, value: &str) {
    if let Err(e) = backend.set(key, value) {
        tracing::warn!(error = %e, key, "storage write failed");
    }
}

fn erase(backend: &dyn KeyValueStorage, key: &str) {
    if let Err(e) = backend.remove(key) {
        tracing::warn!(error = %e, key, "storage remove failed");
    }
}
