//! Client-side form validation.
//!
//! Everything here runs before any network call so obviously bad input never
//! reaches the backend.

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PROFILE_NAME_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("email is required")]
    EmptyEmail,
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("password is required")]
    EmptyPassword,
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("name is required")]
    EmptyName,
    #[error("profile name must be at most {max} characters")]
    ProfileNameTooLong { max: usize },
    #[error("reset token is required")]
    EmptyResetToken,
}

/// Check that `email` looks like `local@domain.tld`.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyEmail`] or [`ValidationError::InvalidEmail`].
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::EmptyEmail);
    }
    let invalid = || ValidationError::InvalidEmail(email.to_string());
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid());
    };
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return Err(invalid());
    };
    if host.is_empty() || tld.is_empty() {
        return Err(invalid());
    }
    Ok(())
}

/// Login only requires a password to be present; strength is the server's call.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyPassword`].
pub fn validate_login_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyPassword);
    }
    Ok(())
}

/// Password rule for signup and reset.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyPassword`] or [`ValidationError::PasswordTooShort`].
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    validate_login_password(password)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort { min: MIN_PASSWORD_LEN });
    }
    Ok(())
}

/// # Errors
///
/// Returns [`ValidationError::PasswordMismatch`] when the two entries differ.
pub fn validate_password_confirmation(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// # Errors
///
/// Returns [`ValidationError::EmptyName`] for blank names.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}

/// # Errors
///
/// Returns [`ValidationError::EmptyName`] or [`ValidationError::ProfileNameTooLong`].
pub fn validate_profile_name(name: &str) -> Result<(), ValidationError> {
    validate_name(name)?;
    if name.trim().chars().count() > MAX_PROFILE_NAME_LEN {
        return Err(ValidationError::ProfileNameTooLong { max: MAX_PROFILE_NAME_LEN });
    }
    Ok(())
}

/// # Errors
///
/// Returns [`ValidationError::EmptyResetToken`] for a blank token.
pub fn validate_reset_token(token: &str) -> Result<(), ValidationError> {
    if token.trim().is_empty() {
        return Err(ValidationError::EmptyResetToken);
    }
    Ok(())
}

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;
