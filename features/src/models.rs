//! Domain records exchanged with the dependency traits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tokens and profile returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Short lived bearer token
    pub access_token: String,
    /// Token used to obtain a new access token
    pub refresh_token: String,
    /// The signed-in user
    pub user: UserResponse,
}

/// A freshly issued access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// The new access token
    pub access_token: String,
}

/// Remote view of a user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// Remote identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Avatar location
    pub avatar_url: String,
    /// Last successful login
    pub last_login: DateTime<Utc>,
}

/// A task as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskItem {
    /// Identifier
    pub id: String,
    /// Title
    pub title: String,
    /// Completion flag
    pub done: bool,
    /// Last modification
    pub updated_at: DateTime<Utc>,
}

/// An entry in the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Identifier
    pub id: String,
    /// Machine readable kind, e.g. `task_completed`
    #[serde(rename = "type")]
    pub kind: String,
    /// Human readable summary
    pub title: String,
    /// When it happened
    pub created_at: DateTime<Utc>,
}

/// A locally registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier (UUID v4)
    pub id: String,
    /// Display name
    pub name: String,
    /// Login email, unique per repository
    pub email: String,
    /// Output of [`hash_password`](crate::password::hash_password)
    pub password_hash: String,
    /// Set whenever the user becomes current
    pub last_login: Option<DateTime<Utc>>,
    /// Whether this is the signed-in user
    pub is_current: bool,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

/// The dashboard's view of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// User identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Email
    pub email: String,
    /// Last successful login
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            last_login: user.last_login,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_uses_wire_names() {
        let activity = Activity {
            id: "1".into(),
            kind: "task_created".into(),
            title: "New task created".into(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        };
        let json = serde_json::to_value(&activity).ok();
        let kind = json
            .as_ref()
            .and_then(|v| v.get("type"))
            .and_then(serde_json::Value::as_str);
        assert_eq!(kind, Some("task_created"));
        assert!(json.as_ref().and_then(|v| v.get("createdAt")).is_some());
    }
}
