//! Mock API client.

use crate::error::ApiError;
use crate::models::{Activity, LoginResponse, RefreshResponse, TaskItem, UserResponse};
use crate::providers::{ApiClient, Endpoint};
use boardflow_core::environment::Clock;
use chrono::Duration;
use futures::future::BoxFuture;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};

/// Email accepted by [`Endpoint::Login`].
pub const MOCK_EMAIL: &str = "test@example.com";
/// Password accepted by [`Endpoint::Login`].
pub const MOCK_PASSWORD: &str = "password";
/// Refresh token accepted by [`Endpoint::RefreshToken`].
pub const MOCK_REFRESH_TOKEN: &str = "mock_refresh_token";

/// Canned API responses.
///
/// Every request is recorded. An optional latency simulates the network, and
/// [`fail_with`](Self::fail_with) makes every subsequent request fail.
#[derive(Clone)]
pub struct MockApiClient {
    clock: Arc<dyn Clock>,
    latency: Option<std::time::Duration>,
    failure: Arc<Mutex<Option<ApiError>>>,
    requests: Arc<Mutex<Vec<Endpoint>>>,
}

impl MockApiClient {
    /// Responses are timestamped with `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            latency: None,
            failure: Arc::new(Mutex::new(None)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Delay every response by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: std::time::Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every request from now on with `error`.
    pub fn fail_with(&self, error: ApiError) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    /// Stop failing.
    pub fn recover(&self) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Every endpoint requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<Endpoint> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn user(&self) -> UserResponse {
        UserResponse {
            id: "1".to_string(),
            name: "Test User".to_string(),
            avatar_url: "https://example.com/avatar.jpg".to_string(),
            last_login: self.clock.now(),
        }
    }

    fn respond(&self, endpoint: Endpoint) -> Result<serde_json::Value, ApiError> {
        let now = self.clock.now();
        match endpoint {
            Endpoint::Login { email, password } => {
                if email == MOCK_EMAIL && password == MOCK_PASSWORD {
                    json(&LoginResponse {
                        access_token: "mock_access_token".to_string(),
                        refresh_token: MOCK_REFRESH_TOKEN.to_string(),
                        user: self.user(),
                    })
                } else {
                    Err(ApiError::InvalidCredentials)
                }
            },
            Endpoint::RefreshToken(token) => {
                if token == MOCK_REFRESH_TOKEN {
                    json(&RefreshResponse {
                        access_token: "new_mock_access_token".to_string(),
                    })
                } else {
                    Err(ApiError::InvalidToken)
                }
            },
            Endpoint::Me => json(&self.user()),
            Endpoint::Tasks => {
                let tasks: Vec<TaskItem> = [
                    ("1", "Complete project setup", false),
                    ("2", "Write unit tests", true),
                    ("3", "Review code", false),
                    ("4", "Deploy to staging", false),
                    ("5", "Update documentation", true),
                ]
                .into_iter()
                .map(|(id, title, done)| TaskItem {
                    id: id.to_string(),
                    title: title.to_string(),
                    done,
                    updated_at: now,
                })
                .collect();
                json(&tasks)
            },
            Endpoint::ToggleTask { id } => json(&TaskItem {
                id,
                title: "Updated task".to_string(),
                done: true,
                updated_at: now,
            }),
            Endpoint::Activity { limit } => {
                let activity: Vec<Activity> = (1..=limit)
                    .map(|index| {
                        let (kind, title) = if index % 2 == 0 {
                            ("task_completed", "Task completed")
                        } else {
                            ("task_created", "New task created")
                        };
                        let hours = i64::try_from(index).unwrap_or_default();
                        Activity {
                            id: index.to_string(),
                            kind: kind.to_string(),
                            title: title.to_string(),
                            created_at: now - Duration::hours(hours),
                        }
                    })
                    .collect();
                json(&activity)
            },
        }
    }
}

fn json<T: Serialize>(value: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|_| ApiError::Decoding)
}

impl ApiClient for MockApiClient {
    fn request(&self, endpoint: Endpoint) -> BoxFuture<'_, Result<serde_json::Value, ApiError>> {
        Box::pin(async move {
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(endpoint.clone());

            let failure = self
                .failure
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            if let Some(error) = failure {
                tracing::debug!(endpoint = endpoint.name(), %error, "Mock API failing request");
                return Err(error);
            }
            self.respond(endpoint)
        })
    }
}

impl std::fmt::Debug for MockApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockApiClient")
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}
