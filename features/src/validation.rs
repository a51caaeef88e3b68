//! Form validation shared by the sign-in and sign-up screens.
//!
//! Each `*_error` function returns the message to show under a field, or
//! `None` when the value is acceptable.

use regex::Regex;
use std::sync::LazyLock;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").ok());

/// Case-insensitive `local@domain.tld` check.
#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    EMAIL.as_ref().is_some_and(|regex| regex.is_match(value))
}

/// Message for an invalid display name.
#[must_use]
pub fn name_error(name: &str) -> Option<&'static str> {
    name.is_empty().then_some("Name is required")
}

/// Message for an invalid email.
#[must_use]
pub fn email_error(email: &str) -> Option<&'static str> {
    if email.is_empty() {
        Some("Email is required")
    } else if !is_valid_email(email) {
        Some("Please enter a valid email address")
    } else {
        None
    }
}

/// Message for an invalid password.
#[must_use]
pub fn password_error(password: &str) -> Option<&'static str> {
    if password.is_empty() {
        Some("Password is required")
    } else if password.chars().count() < MIN_PASSWORD_LENGTH {
        Some("Password must be at least 6 characters")
    } else {
        None
    }
}

/// Message for a confirmation that does not match.
#[must_use]
pub fn confirm_password_error(password: &str, confirmation: &str) -> Option<&'static str> {
    if confirmation.is_empty() {
        Some("Please confirm your password")
    } else if password != confirmation {
        Some("Passwords do not match")
    } else {
        None
    }
}
