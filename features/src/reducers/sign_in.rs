//! Sign-in screen.
//!
//! Credentials are checked against the local [`UserRepository`]. A successful
//! sign-in persists a token session through [`SecureStorage`] before the
//! screen reports itself authenticated.
//!
//! [`UserRepository`]: crate::providers::UserRepository
//! [`SecureStorage`]: crate::providers::SecureStorage

use crate::Dependencies;
use crate::error::{ApiError, SessionError};
use crate::models::{LoginResponse, UserResponse};
use crate::providers::{LogLevel, Properties, UserRepository};
use crate::session;
use crate::validation;
use boardflow_core::effect::{Effect, TaskPriority};
use boardflow_core::reducer::Reducer;
use boardflow_core::{smallvec, DateTime, SmallVec, Utc};
use std::sync::Arc;

/// Token value used for sessions backed by the local user store.
pub const LOCAL_SESSION_TOKEN: &str = "local_session";

/// Form and submission state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInState {
    /// Email field
    pub email: String,
    /// Password field
    pub password: String,
    /// A request is in flight
    pub is_submitting: bool,
    /// Banner text
    pub error_message: Option<String>,
    /// Credentials accepted and session stored
    pub is_authenticated: bool,
    /// Message under the email field
    pub email_validation_error: Option<String>,
    /// Message under the password field
    pub password_validation_error: Option<String>,
    /// The email field has had focus at least once
    pub has_email_field_been_focused: bool,
    /// The password field has had focus at least once
    pub has_password_field_been_focused: bool,
}

impl SignInState {
    /// Whether the sign-in button is enabled.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.is_submitting && validation::is_valid_email(&self.email) && !self.password.is_empty()
    }
}

/// Sign-in input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInAction {
    /// Screen shown
    OnAppear,
    /// Email edited
    EmailChanged(String),
    /// Email field focused
    EmailFocusGained,
    /// Email field lost focus
    EmailFocusLost,
    /// Password edited
    PasswordChanged(String),
    /// Password field focused
    PasswordFocusGained,
    /// Password field lost focus
    PasswordFocusLost,
    /// Sign-in button tapped
    SignInTapped,
    /// "Sign in with Apple" tapped
    AppleSignInTapped,
    /// Result of a credential check
    SignInResponse(Result<LoginResponse, ApiError>),
    /// Result of an Apple sign-in
    AppleSignInResponse(Result<LoginResponse, ApiError>),
    /// Tokens persisted (or not)
    SessionSaved(Result<(), SessionError>),
    /// Banner dismissed
    DismissError,
}

/// Reducer for [`SignInState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SignInReducer;

async fn authenticate(
    users: &dyn UserRepository,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<LoginResponse, ApiError> {
    let user = users
        .authenticate_user(email, password)
        .await
        .ok()
        .flatten()
        .ok_or(ApiError::InvalidCredentials)?;
    users
        .set_current_user(&user)
        .await
        .map_err(|_| ApiError::InvalidCredentials)?;

    Ok(LoginResponse {
        access_token: LOCAL_SESSION_TOKEN.to_string(),
        refresh_token: LOCAL_SESSION_TOKEN.to_string(),
        user: UserResponse {
            id: user.id,
            name: user.name,
            avatar_url: String::new(),
            last_login: now,
        },
    })
}

impl SignInReducer {
    fn save_session(response: LoginResponse, env: &Dependencies) -> Effect<SignInAction> {
        let storage = Arc::clone(&env.secure_storage);
        let analytics = Arc::clone(&env.analytics);
        let now = env.clock.now();

        Effect::task(TaskPriority::UserInitiated, async move {
            let saved = session::save(storage.as_ref(), &response, now).map(|_| ());
            if saved.is_ok() {
                let mut properties = Properties::new();
                properties.insert("user_id".into(), response.user.id.into());
                analytics.track("sign_in_succeeded", properties);
            }
            SignInAction::SessionSaved(saved)
        })
    }
}

impl Reducer for SignInReducer {
    type State = SignInState;
    type Action = SignInAction;
    type Environment = Dependencies;

    #[allow(clippy::too_many_lines)] // one arm per action
    fn reduce(
        &self,
        state: &mut SignInState,
        action: SignInAction,
        env: &Dependencies,
    ) -> SmallVec<[Effect<SignInAction>; 4]> {
        match action {
            SignInAction::OnAppear | SignInAction::DismissError => state.error_message = None,

            SignInAction::EmailChanged(email) => {
                state.email = email;
                state.error_message = None;
                state.email_validation_error = None;
            },
            SignInAction::EmailFocusGained => state.has_email_field_been_focused = true,
            SignInAction::EmailFocusLost => {
                if state.has_email_field_been_focused {
                    state.email_validation_error =
                        validation::email_error(&state.email).map(str::to_string);
                }
            },

            SignInAction::PasswordChanged(password) => {
                state.password = password;
                state.error_message = None;
                state.password_validation_error = None;
            },
            SignInAction::PasswordFocusGained => state.has_password_field_been_focused = true,
            SignInAction::PasswordFocusLost => {
                if state.has_password_field_been_focused {
                    state.password_validation_error =
                        validation::password_error(&state.password).map(str::to_string);
                }
            },

            SignInAction::SignInTapped => {
                if !state.can_submit() {
                    tracing::debug!("Sign-in tapped with an incomplete form");
                    return SmallVec::new();
                }
                state.is_submitting = true;
                state.error_message = None;

                let users = Arc::clone(&env.users);
                let logger = Arc::clone(&env.logger);
                let email = state.email.clone();
                let password = state.password.clone();
                let now = env.clock.now();

                return smallvec![Effect::try_task(
                    TaskPriority::UserInitiated,
                    async move {
                        let response = authenticate(users.as_ref(), &email, &password, now).await;
                        if let Err(error) = &response {
                            let message = format!("Sign-in rejected: {error}");
                            logger.log(&message, LogLevel::Warning, "auth");
                        }
                        response.map(|response| SignInAction::SignInResponse(Ok(response)))
                    },
                    |error| SignInAction::SignInResponse(Err(error)),
                )];
            },

            SignInAction::AppleSignInTapped => {
                state.is_submitting = true;
                state.error_message = None;
                let now = env.clock.now();

                return smallvec![Effect::task(TaskPriority::UserInitiated, async move {
                    SignInAction::AppleSignInResponse(Ok(LoginResponse {
                        access_token: "mock_access_token".to_string(),
                        refresh_token: "mock_refresh_token".to_string(),
                        user: UserResponse {
                            id: "1".to_string(),
                            name: "Test User".to_string(),
                            avatar_url: "https://example.com/avatar.jpg".to_string(),
                            last_login: now,
                        },
                    }))
                })];
            },

            SignInAction::SignInResponse(Ok(response))
            | SignInAction::AppleSignInResponse(Ok(response)) => {
                state.is_submitting = false;
                return smallvec![Self::save_session(response, env)];
            },
            SignInAction::SignInResponse(Err(error))
            | SignInAction::AppleSignInResponse(Err(error)) => {
                state.is_submitting = false;
                state.error_message = Some(error.to_string());
            },

            SignInAction::SessionSaved(Ok(())) => state.is_authenticated = true,
            SignInAction::SessionSaved(Err(error)) => {
                tracing::warn!(%error, "Could not persist session");
                state.error_message = Some("Failed to save credentials".to_string());
            },
        }
        SmallVec::new()
    }
}
