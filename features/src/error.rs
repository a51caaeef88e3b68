//! Error types for the dashboard features.
//!
//! Every error here is a value carried inside an action. Its `Display` text is
//! what ends up in a feature's `error_message`.

use thiserror::Error;

/// Failures reported by an [`ApiClient`](crate::providers::ApiClient).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Login rejected.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Refresh token rejected.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Transport failure.
    #[error("Network connection error")]
    Network,

    /// The response did not have the expected shape.
    #[error("Failed to decode response")]
    Decoding,
}

/// Failures reported by [`SecureStorage`](crate::providers::SecureStorage).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backing store refused the operation.
    #[error("Secure storage unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be encoded or decoded.
    #[error("Stored value for '{key}' is corrupted")]
    Corrupted {
        /// Key of the offending entry
        key: String,
    },
}

/// Failures reported by a [`UserRepository`](crate::providers::UserRepository).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserRepositoryError {
    /// Sign-up with an email that is already registered.
    #[error("A user with this email already exists")]
    UserAlreadyExists,

    /// Lookup of an unknown user.
    #[error("User not found")]
    UserNotFound,

    /// Email and password do not match.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Anything else the backing store reports.
    #[error("Database error occurred")]
    DatabaseError,
}

/// Failures surfaced on the dashboard.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DashboardError {
    /// One of the refresh operations failed.
    #[error("Failed to refresh data")]
    RefreshFailed,
}

/// Failures while persisting or reading the token session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Only part of a session was found.
    #[error("Stored session is incomplete")]
    Incomplete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_facing_messages() {
        assert_eq!(
            UserRepositoryError::UserAlreadyExists.to_string(),
            "A user with this email already exists"
        );
        assert_eq!(ApiError::InvalidCredentials.to_string(), "Invalid email or password");
        assert_eq!(DashboardError::RefreshFailed.to_string(), "Failed to refresh data");
    }

    #[test]
    fn session_error_wraps_storage() {
        let error = SessionError::from(StorageError::Unavailable("locked".into()));
        assert_eq!(error.to_string(), "Secure storage unavailable: locked");
    }
}
