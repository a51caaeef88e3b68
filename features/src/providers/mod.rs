//! Capabilities the features consume.
//!
//! Reducers never call these directly. They clone the `Arc` handles out of
//! [`Dependencies`](crate::Dependencies) into task effects, so every call
//! happens off the reduction path.
//!
//! All traits are object safe; asynchronous methods return a
//! [`BoxFuture`] borrowing `self`.

use crate::error::{ApiError, StorageError, UserRepositoryError};
use crate::models::{Activity, TaskItem, User};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

mod live;

pub use live::{TracingAnalytics, TracingLogger};

/// Remote endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Exchange credentials for tokens
    Login {
        /// Account email
        email: String,
        /// Plain password
        password: String,
    },
    /// Exchange a refresh token for a new access token
    RefreshToken(String),
    /// Profile of the signed-in user
    Me,
    /// Current task list
    Tasks,
    /// Flip a task's completion flag
    ToggleTask {
        /// Task identifier
        id: String,
    },
    /// Most recent activity
    Activity {
        /// Maximum number of entries
        limit: usize,
    },
}

impl Endpoint {
    /// Short label used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::RefreshToken(_) => "refresh_token",
            Self::Me => "me",
            Self::Tasks => "tasks",
            Self::ToggleTask { .. } => "toggle_task",
            Self::Activity { .. } => "activity",
        }
    }
}

/// Network access.
///
/// Responses are untyped JSON; use [`ApiClientExt::fetch`] to decode.
pub trait ApiClient: Send + Sync {
    /// Perform a request.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] describing the failure.
    fn request(&self, endpoint: Endpoint) -> BoxFuture<'_, Result<serde_json::Value, ApiError>>;
}

/// Typed requests on top of [`ApiClient`].
pub trait ApiClientExt: ApiClient {
    /// Perform a request and decode its body as `T`.
    ///
    /// # Errors
    ///
    /// Returns the request's error, or [`ApiError::Decoding`] if the body does
    /// not match `T`.
    fn fetch<T>(&self, endpoint: Endpoint) -> BoxFuture<'_, Result<T, ApiError>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let name = endpoint.name();
        let response = self.request(endpoint);
        Box::pin(async move {
            let body = response.await?;
            serde_json::from_value(body).map_err(|error| {
                tracing::warn!(endpoint = name, error = %error, "Undecodable response");
                ApiError::Decoding
            })
        })
    }
}

impl<C: ApiClient + ?Sized> ApiClientExt for C {}

/// Small secret storage (keychain-like). Synchronous.
pub trait SecureStorage: Send + Sync {
    /// Store `data` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the store refuses the write.
    fn save(&self, data: &[u8], key: &str) -> Result<(), StorageError>;

    /// Read the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the store cannot be read.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Remove the value under `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the store refuses the delete.
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Local user accounts.
pub trait UserRepository: Send + Sync {
    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns [`UserRepositoryError::UserAlreadyExists`] if `email` is taken.
    fn create_user<'a>(
        &'a self,
        name: &'a str,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<User, UserRepositoryError>>;

    /// Look a user up by email.
    ///
    /// # Errors
    ///
    /// Returns [`UserRepositoryError::DatabaseError`] if the store fails.
    fn find_user<'a>(&'a self, email: &'a str)
    -> BoxFuture<'a, Result<Option<User>, UserRepositoryError>>;

    /// Check credentials. `Ok(None)` means they did not match.
    ///
    /// # Errors
    ///
    /// Returns [`UserRepositoryError::DatabaseError`] if the store fails.
    fn authenticate_user<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Option<User>, UserRepositoryError>>;

    /// Make `user` the only current user and stamp its last login.
    ///
    /// # Errors
    ///
    /// Returns [`UserRepositoryError::UserNotFound`] for unknown users.
    fn set_current_user<'a>(&'a self, user: &'a User)
    -> BoxFuture<'a, Result<(), UserRepositoryError>>;

    /// The current user, if any.
    ///
    /// # Errors
    ///
    /// Returns [`UserRepositoryError::DatabaseError`] if the store fails.
    fn get_current_user(&self) -> BoxFuture<'_, Result<Option<User>, UserRepositoryError>>;

    /// Clear the current user.
    ///
    /// # Errors
    ///
    /// Returns [`UserRepositoryError::DatabaseError`] if the store fails.
    fn sign_out(&self) -> BoxFuture<'_, Result<(), UserRepositoryError>>;
}

/// Cached tasks with remote refresh.
pub trait TaskRepository: Send + Sync {
    /// Up to `limit` cached tasks, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the cache cannot be read.
    fn fetch_cached(&self, limit: usize) -> BoxFuture<'_, Result<Vec<TaskItem>, ApiError>>;

    /// Fetch from the API, merge into the cache and return up to `limit`
    /// tasks, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns the API's [`ApiError`].
    fn refresh(&self, limit: usize) -> BoxFuture<'_, Result<Vec<TaskItem>, ApiError>>;
}

/// Cached activity feed with remote refresh.
pub trait ActivityRepository: Send + Sync {
    /// Up to `limit` cached entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the cache cannot be read.
    fn fetch_cached(&self, limit: usize) -> BoxFuture<'_, Result<Vec<Activity>, ApiError>>;

    /// Fetch from the API, merge into the cache and return up to `limit`
    /// entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns the API's [`ApiError`].
    fn refresh(&self, limit: usize) -> BoxFuture<'_, Result<Vec<Activity>, ApiError>>;
}

/// Severity for [`Logger::log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogLevel {
    /// Diagnostics
    Debug,
    /// Normal operation
    Info,
    /// Something unexpected but handled
    Warning,
    /// A failure
    Error,
}

impl LogLevel {
    /// Upper-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// Fire-and-forget application log.
pub trait Logger: Send + Sync {
    /// Record a message.
    fn log(&self, message: &str, level: LogLevel, category: &str);
}

/// Properties attached to an analytics event.
pub type Properties = BTreeMap<String, serde_json::Value>;

/// Fire-and-forget product analytics.
pub trait Analytics: Send + Sync {
    /// Record an event.
    fn track(&self, event: &str, properties: Properties);
}
