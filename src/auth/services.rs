use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ApiError;

pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 128;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"(?i)^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn validate_email(email: &str) -> Result<(), ApiError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(ApiError::bad_request("Please enter a valid email address"))
    }
}

pub(crate) fn validate_password(password: &str) -> Result<(), ApiError> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {PASSWORD_MIN_LEN} characters"
        )));
    }
    if len > PASSWORD_MAX_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must not exceed {PASSWORD_MAX_LEN} characters"
        )));
    }
    Ok(())
}

/// 400 with `message` unless every field is non-blank.
pub(crate) fn require(fields: &[&str], message: &str) -> Result<(), ApiError> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(ApiError::bad_request(message));
    }
    Ok(())
}
