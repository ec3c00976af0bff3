//! Input checks shared by every store.
//!
//! Each function either returns the normalized value or a
//! [`ValidationError`] describing the first problem found.

use crate::error::ValidationError;

/// Require a non-blank value, returning it trimmed.
pub fn require_field(field: &'static str, value: Option<&str>) -> Result<String, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::MissingField(field)),
    }
}

/// Minimal shape check: one `@` with a non-empty local part and a dotted domain.
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();
    let invalid = || ValidationError::InvalidEmail(email.to_string());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return Err(invalid());
    }
    match domain.split_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(email.to_string()),
        _ => Err(invalid()),
    }
}

pub fn validate_last4(last4: &str) -> Result<String, ValidationError> {
    let last4 = last4.trim();
    if last4.len() == 4 && last4.chars().all(|c| c.is_ascii_digit()) {
        Ok(last4.to_string())
    } else {
        Err(ValidationError::InvalidLast4)
    }
}

/// Card expiry as `MM/YY`, month between 01 and 12.
pub fn validate_expiry(expiry: &str) -> Result<String, ValidationError> {
    let expiry = expiry.trim();
    let (month, year) = expiry
        .split_once('/')
        .ok_or(ValidationError::InvalidExpiry)?;

    let two_digits = |s: &str| s.len() == 2 && s.chars().all(|c| c.is_ascii_digit());
    if !two_digits(month) || !two_digits(year) {
        return Err(ValidationError::InvalidExpiry);
    }

    match month.parse::<u8>() {
        Ok(1..=12) => Ok(expiry.to_string()),
        _ => Err(ValidationError::InvalidExpiry),
    }
}

pub fn validate_amount(amount: f64) -> Result<f64, ValidationError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(ValidationError::InvalidAmount)
    }
}

/// Split a comma-separated skills field into trimmed, non-empty entries.
pub fn parse_skills(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
