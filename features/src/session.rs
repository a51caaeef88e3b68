//! Token session persistence.
//!
//! A session is three entries in [`SecureStorage`]: the access token, the
//! refresh token and a JSON encoded expiry timestamp.

use crate::error::{SessionError, StorageError};
use crate::models::LoginResponse;
use crate::providers::SecureStorage;
use chrono::{DateTime, Duration, Utc};

/// Key of the access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Key of the JSON encoded expiry.
pub const TOKEN_EXPIRY_KEY: &str = "token_expiry";
/// Lifetime of a new access token, in seconds.
pub const TOKEN_LIFETIME_SECS: i64 = 3600;

/// A persisted token pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    /// Bearer token
    pub access_token: String,
    /// Refresh token
    pub refresh_token: String,
    /// When `access_token` stops being valid
    pub expires_at: DateTime<Utc>,
}

impl StoredSession {
    /// Whether the access token has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Persist the tokens from `response`, expiring [`TOKEN_LIFETIME_SECS`] after `now`.
///
/// # Errors
///
/// Returns [`SessionError::Storage`] if any write fails.
pub fn save(
    storage: &dyn SecureStorage,
    response: &LoginResponse,
    now: DateTime<Utc>,
) -> Result<StoredSession, SessionError> {
    let expires_at = now + Duration::seconds(TOKEN_LIFETIME_SECS);
    let expiry = serde_json::to_vec(&expires_at).map_err(|_| StorageError::Corrupted {
        key: TOKEN_EXPIRY_KEY.to_string(),
    })?;

    storage.save(response.access_token.as_bytes(), ACCESS_TOKEN_KEY)?;
    storage.save(response.refresh_token.as_bytes(), REFRESH_TOKEN_KEY)?;
    storage.save(&expiry, TOKEN_EXPIRY_KEY)?;

    tracing::debug!(%expires_at, "Session saved");
    Ok(StoredSession {
        access_token: response.access_token.clone(),
        refresh_token: response.refresh_token.clone(),
        expires_at,
    })
}

/// Read the stored session, if there is one.
///
/// # Errors
///
/// Returns [`SessionError::Incomplete`] if only some entries exist, and
/// [`SessionError::Storage`] if an entry cannot be read or decoded.
pub fn load(storage: &dyn SecureStorage) -> Result<Option<StoredSession>, SessionError> {
    let access = storage.load(ACCESS_TOKEN_KEY)?;
    let refresh = storage.load(REFRESH_TOKEN_KEY)?;
    let expiry = storage.load(TOKEN_EXPIRY_KEY)?;

    match (access, refresh, expiry) {
        (None, None, None) => Ok(None),
        (Some(access), Some(refresh), Some(expiry)) => {
            let expires_at: DateTime<Utc> =
                serde_json::from_slice(&expiry).map_err(|_| StorageError::Corrupted {
                    key: TOKEN_EXPIRY_KEY.to_string(),
                })?;
            Ok(Some(StoredSession {
                access_token: utf8(access, ACCESS_TOKEN_KEY)?,
                refresh_token: utf8(refresh, REFRESH_TOKEN_KEY)?,
                expires_at,
            }))
        },
        _ => Err(SessionError::Incomplete),
    }
}

/// Remove every session entry.
///
/// # Errors
///
/// Returns [`SessionError::Storage`] if a delete fails.
pub fn clear(storage: &dyn SecureStorage) -> Result<(), SessionError> {
    for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TOKEN_EXPIRY_KEY] {
        storage.delete(key)?;
    }
    Ok(())
}

fn utf8(bytes: Vec<u8>, key: &str) -> Result<String, StorageError> {
    String::from_utf8(bytes).map_err(|_| StorageError::Corrupted {
        key: key.to_string(),
    })
}
