//! Profile selector: the single "current profile" pointer plus profile CRUD.
//!
//! The selection lives in two places, the in-memory [`AuthState`] and the
//! stored profile id. Storage is written first, outside the state channel's
//! lock, and the state follows; once a call returns both agree. Nothing here
//! changes state while signed out.

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;

use super::auth::{AuthSession, AuthState};
use crate::net::error::ApiError;
use crate::net::types::Profile;
use crate::validation::validate_profile_name;

/// Accounts may hold at most this many profiles. Callers check
/// [`AuthSession::can_create_profile`]; the API calls do not enforce it.
pub const MAX_PROFILES: usize = 5;

fn clean_description(description: Option<&str>) -> Option<&str> {
    description.map(str::trim).filter(|d| !d.is_empty())
}

impl AuthSession {
    /// Select `profile`, or clear the selection with `None`.
    ///
    /// A profile outside the fetched list is accepted as-is. Selecting while
    /// signed out is ignored; clearing is always allowed.
    pub fn set_current_profile(&self, profile: Option<Profile>) {
        let tokens = self.api.tokens();
        match &profile {
            Some(p) => {
                let (signed_in, known) = {
                    let state = self.state.borrow();
                    (state.is_authenticated, state.profiles.iter().any(|known| known.id == p.id))
                };
                if !signed_in {
                    tracing::debug!(profile_id = %p.id, "ignoring profile selection while signed out");
                    return;
                }
                if !known {
                    tracing::debug!(profile_id = %p.id, "selecting profile outside the fetched list");
                }
                tokens.set_current_profile_id(&p.id);
            }
            None => tokens.clear_current_profile_id(),
        }
        self.state
            .send_modify(|s| s.current_profile = profile);
    }

    #[must_use]
    pub fn current_profile(&self) -> Option<Profile> {
        self.state.borrow().current_profile.clone()
    }

    #[must_use]
    pub fn can_create_profile(&self) -> bool {
        self.state.borrow().profiles.len() < MAX_PROFILES
    }

    /// # Errors
    ///
    /// Returns [`ApiError::NotSignedIn`] without a session,
    /// [`ApiError::Validation`] for a bad name, else any request error.
    pub async fn create_profile(&self, name: &str, description: Option<&str>) -> Result<Profile, ApiError> {
        self.ensure_signed_in()?;
        validate_profile_name(name)?;
        let profile = self
            .api
            .create_profile(name.trim(), clean_description(description))
            .await?;
        tracing::info!(profile_id = %profile.id, "profile created");
        self.state
            .send_modify(|s| s.profiles.push(profile.clone()));
        Ok(profile)
    }

    /// # Errors
    ///
    /// Returns [`ApiError::NotSignedIn`] without a session,
    /// [`ApiError::Validation`] for a bad name, else any request error.
    pub async fn update_profile(
        &self,
        profile_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Profile, ApiError> {
        self.ensure_signed_in()?;
        validate_profile_name(name)?;
        let updated = self
            .api
            .update_profile(profile_id, name.trim(), clean_description(description))
            .await?;
        self.state.send_modify(|s| replace_profile(s, &updated));
        Ok(updated)
    }

    /// Delete a profile. Deleting the current one also clears the selection.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotSignedIn`] without a session, else any request
    /// error; local state is untouched in both cases.
    pub async fn delete_profile(&self, profile_id: &str) -> Result<(), ApiError> {
        self.ensure_signed_in()?;
        self.api.delete_profile(profile_id).await?;
        tracing::info!(profile_id, "profile deleted");

        let was_current = self
            .state
            .borrow()
            .current_profile
            .as_ref()
            .is_some_and(|p| p.id == profile_id);
        if was_current {
            self.set_current_profile(None);
        }
        self.state
            .send_modify(|s| s.profiles.retain(|p| p.id != profile_id));
        Ok(())
    }

    fn ensure_signed_in(&self) -> Result<(), ApiError> {
        if self.state.borrow().is_authenticated {
            Ok(())
        } else {
            Err(ApiError::NotSignedIn)
        }
    }
}

fn replace_profile(state: &mut AuthState, updated: &Profile) {
    if let Some(slot) = state.profiles.iter_mut().find(|p| p.id == updated.id) {
        *slot = updated.clone();
    } else {
        state.profiles.push(updated.clone());
    }
    if let Some(current) = state.current_profile.as_mut().filter(|p| p.id == updated.id) {
        *current = updated.clone();
    }
}
