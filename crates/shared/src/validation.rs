//! Common validation utilities.

use validator::{ValidateEmail, ValidationError};

lazy_static::lazy_static! {
    static ref PHONE_REGEX: regex::Regex =
        regex::Regex::new(r"^\+?[0-9][0-9 .\-()]{6,19}$").unwrap();
}

/// Normalizes an email address for use as a deduplication key.
///
/// The same mailbox must always produce the same key, so the address is
/// trimmed and lowercased before comparison or storage.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Validates that a string is a syntactically correct email address.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.validate_email() {
        Ok(())
    } else {
        let mut err = ValidationError::new("email_format");
        err.message = Some("Invalid email address".into());
        Err(err)
    }
}

/// Validates that a guest count is non-negative.
pub fn validate_guest_count(count: i32) -> Result<(), ValidationError> {
    if count >= 0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("guest_count_range");
        err.message = Some("Guest count cannot be negative".into());
        Err(err)
    }
}

/// Validates that a project capacity is positive.
pub fn validate_max_capacity(capacity: i32) -> Result<(), ValidationError> {
    if capacity > 0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("capacity_range");
        err.message = Some("Max capacity must be greater than zero".into());
        Err(err)
    }
}

/// Validates a phone number (permissive: digits with common separators).
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE_REGEX.is_match(phone.trim()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_format");
        err.message = Some("Invalid phone number".into());
        Err(err)
    }
}
