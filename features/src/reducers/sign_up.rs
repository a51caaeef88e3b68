//! Sign-up screen.

use crate::Dependencies;
use crate::error::UserRepositoryError;
use crate::models::User;
use crate::providers::{LogLevel, Properties};
use crate::validation;
use boardflow_core::effect::{Effect, TaskPriority};
use boardflow_core::reducer::Reducer;
use boardflow_core::{smallvec, SmallVec};
use std::sync::Arc;

/// Form and submission state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpState {
    /// Display name field
    pub name: String,
    /// Email field
    pub email: String,
    /// Password field
    pub password: String,
    /// Password confirmation field
    pub confirm_password: String,
    /// A request is in flight
    pub is_submitting: bool,
    /// Banner text
    pub error_message: Option<String>,
    /// Message under the name field
    pub name_validation_error: Option<String>,
    /// Message under the email field
    pub email_validation_error: Option<String>,
    /// Message under the password field
    pub password_validation_error: Option<String>,
    /// Message under the confirmation field
    pub confirm_password_validation_error: Option<String>,
    /// The name field has had focus at least once
    pub has_name_field_been_focused: bool,
    /// The email field has had focus at least once
    pub has_email_field_been_focused: bool,
    /// The password field has had focus at least once
    pub has_password_field_been_focused: bool,
    /// The confirmation field has had focus at least once
    pub has_confirm_password_field_been_focused: bool,
    /// Account created and signed in
    pub is_authenticated: bool,
}

impl SignUpState {
    /// Whether the sign-up button is enabled: a name, a valid email, a
    /// password of at least six characters and a matching confirmation.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.is_submitting
            && validation::name_error(&self.name).is_none()
            && validation::is_valid_email(&self.email)
            && validation::password_error(&self.password).is_none()
            && self.password == self.confirm_password
    }
}

/// Sign-up input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpAction {
    /// Screen shown
    OnAppear,
    /// Name edited
    NameChanged(String),
    /// Name field focused
    NameFocusGained,
    /// Name field lost focus
    NameFocusLost,
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
    /// Confirmation edited
    ConfirmPasswordChanged(String),
    /// Confirmation field focused
    ConfirmPasswordFocusGained,
    /// Confirmation field lost focus
    ConfirmPasswordFocusLost,
    /// Sign-up button tapped
    SignUpTapped,
    /// Result of creating the account
    SignUpResponse(Result<User, UserRepositoryError>),
    /// Banner dismissed
    DismissError,
}

/// Reducer for [`SignUpState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SignUpReducer;

impl Reducer for SignUpReducer {
    type State = SignUpState;
    type Action = SignUpAction;
    type Environment = Dependencies;

    #[allow(clippy::too_many_lines)] // one arm per action
    fn reduce(
        &self,
        state: &mut SignUpState,
        action: SignUpAction,
        env: &Dependencies,
    ) -> SmallVec<[Effect<SignUpAction>; 4]> {
        match action {
            SignUpAction::OnAppear | SignUpAction::DismissError => state.error_message = None,

            SignUpAction::NameChanged(name) => {
                state.name = name;
                state.error_message = None;
                state.name_validation_error = None;
            },
            SignUpAction::NameFocusGained => state.has_name_field_been_focused = true,
            SignUpAction::NameFocusLost => {
                if state.has_name_field_been_focused {
                    state.name_validation_error =
                        validation::name_error(&state.name).map(str::to_string);
                }
            },

            SignUpAction::EmailChanged(email) => {
                state.email = email;
                state.error_message = None;
                state.email_validation_error = None;
            },
            SignUpAction::EmailFocusGained => state.has_email_field_been_focused = true,
            SignUpAction::EmailFocusLost => {
                if state.has_email_field_been_focused {
                    state.email_validation_error =
                        validation::email_error(&state.email).map(str::to_string);
                }
            },

            SignUpAction::PasswordChanged(password) => {
                state.password = password;
                state.error_message = None;
                state.password_validation_error = None;
                state.confirm_password_validation_error = None;
            },
            SignUpAction::PasswordFocusGained => state.has_password_field_been_focused = true,
            SignUpAction::PasswordFocusLost => {
                if state.has_password_field_been_focused {
                    state.password_validation_error =
                        validation::password_error(&state.password).map(str::to_string);
                }
            },

            SignUpAction::ConfirmPasswordChanged(confirmation) => {
                state.confirm_password = confirmation;
                state.error_message = None;
                state.confirm_password_validation_error = None;
            },
            SignUpAction::ConfirmPasswordFocusGained => {
                state.has_confirm_password_field_been_focused = true;
            },
            SignUpAction::ConfirmPasswordFocusLost => {
                if state.has_confirm_password_field_been_focused {
                    state.confirm_password_validation_error =
                        validation::confirm_password_error(&state.password, &state.confirm_password)
                            .map(str::to_string);
                }
            },

            SignUpAction::SignUpTapped => {
                if !state.can_submit() {
                    tracing::debug!("Sign-up tapped with an incomplete form");
                    return SmallVec::new();
                }
                state.is_submitting = true;
                state.error_message = None;

                let users = Arc::clone(&env.users);
                let analytics = Arc::clone(&env.analytics);
                let logger = Arc::clone(&env.logger);
                let name = state.name.clone();
                let email = state.email.clone();
                let password = state.password.clone();

                return smallvec![Effect::try_task(
                    TaskPriority::UserInitiated,
                    async move {
                        let user = users.create_user(&name, &email, &password).await?;
                        users.set_current_user(&user).await?;

                        let mut properties = Properties::new();
                        properties.insert("user_id".into(), user.id.clone().into());
                        analytics.track("sign_up_succeeded", properties);
                        Ok::<_, UserRepositoryError>(SignUpAction::SignUpResponse(Ok(user)))
                    },
                    move |error| {
                        logger.log(&format!("Sign-up failed: {error}"), LogLevel::Warning, "auth");
                        SignUpAction::SignUpResponse(Err(error))
                    },
                )];
            },

            SignUpAction::SignUpResponse(Ok(_)) => {
                state.is_submitting = false;
                state.is_authenticated = true;
            },
            SignUpAction::SignUpResponse(Err(error)) => {
                state.is_submitting = false;
                state.error_message = Some(error.to_string());
            },
        }
        SmallVec::new()
    }
}
