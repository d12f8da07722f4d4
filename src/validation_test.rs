use super::*;

// =============================================================================
// validate_email
// =============================================================================

#[test]
fn email_accepts_plain_address() {
    assert_eq!(validate_email("a@b.com"), Ok(()));
    assert_eq!(validate_email("  ops.team+alerts@pulso.example  "), Ok(()));
}

#[test]
fn email_empty_is_rejected() {
    assert_eq!(validate_email("   "), Err(ValidationError::EmptyEmail));
}

#[test]
fn email_malformed_variants_are_rejected() {
    for bad in ["no-at-sign", "@b.com", "a@b", "a@.com", "a@b.", "a@@b.com", "a b@c.com"] {
        assert!(
            matches!(validate_email(bad), Err(ValidationError::InvalidEmail(_))),
            "expected {bad:?} to be rejected"
        );
    }
}

// =============================================================================
// passwords
// =============================================================================

#[test]
fn login_password_only_requires_presence() {
    assert_eq!(validate_login_password("x"), Ok(()));
    assert_eq!(validate_login_password(""), Err(ValidationError::EmptyPassword));
}

#[test]
fn signup_password_enforces_minimum_length() {
    assert_eq!(validate_password("short"), Err(ValidationError::PasswordTooShort { min: MIN_PASSWORD_LEN }));
    assert_eq!(validate_password("long enough"), Ok(()));
}

#[test]
fn password_confirmation_mismatch() {
    assert_eq!(validate_password_confirmation("abcdefgh", "abcdefgh"), Ok(()));
    assert_eq!(validate_password_confirmation("abcdefgh", "abcdefgi"), Err(ValidationError::PasswordMismatch));
}

// =============================================================================
// names
// =============================================================================

#[test]
fn profile_name_limits() {
    assert_eq!(validate_profile_name("Staging"), Ok(()));
    assert_eq!(validate_profile_name(" "), Err(ValidationError::EmptyName));
    let long = "x".repeat(MAX_PROFILE_NAME_LEN + 1);
    assert_eq!(
        validate_profile_name(&long),
        Err(ValidationError::ProfileNameTooLong { max: MAX_PROFILE_NAME_LEN })
    );
}

#[test]
fn reset_token_must_be_present() {
    assert_eq!(validate_reset_token(""), Err(ValidationError::EmptyResetToken));
    assert_eq!(validate_reset_token("tok"), Ok(()));
}

#[test]
fn error_messages_are_user_facing() {
    assert_eq!(ValidationError::PasswordMismatch.to_string(), "passwords do not match");
    assert_eq!(
        ValidationError::PasswordTooShort { min: 8 }.to_string(),
        "password must be at least 8 characters"
    );
}
