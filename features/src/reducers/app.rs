//! Top-level routing.
//!
//! [`AppReducer`] owns the current [`Route`] and embeds every screen's state.
//! Child actions arrive wrapped (`AppAction::SignIn(..)` and so on), are
//! handed to the child reducer and its effects are mapped back into
//! [`AppAction`]. Route changes triggered by a child are decided here.

use super::dashboard::{DashboardAction, DashboardReducer, DashboardState};
use super::onboarding::{OnboardingAction, OnboardingReducer, OnboardingState};
use super::sign_in::{SignInAction, SignInReducer, SignInState};
use super::sign_up::{SignUpAction, SignUpReducer, SignUpState};
use crate::Dependencies;
use crate::providers::{LogLevel, Properties};
use crate::session;
use boardflow_core::effect::{Effect, TaskPriority};
use boardflow_core::reducer::Reducer;
use boardflow_core::{SmallVec, async_effect, smallvec};
use std::sync::Arc;

/// Message shown when the launch check fails.
pub const AUTH_CHECK_FAILED: &str = "Failed to check authentication status";

/// The screen currently shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Route {
    /// First launch walkthrough
    #[default]
    Onboarding,
    /// Sign-in
    Auth,
    /// Account creation
    SignUp,
    /// Signed-in home
    Dashboard,
}

/// Application state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    /// Current screen
    pub route: Route,
    /// Launch check in progress
    pub is_loading: bool,
    /// App-level error
    pub error_message: Option<String>,
    /// Onboarding screen
    pub onboarding: OnboardingState,
    /// Sign-in screen
    pub sign_in: SignInState,
    /// Sign-up screen
    pub sign_up: SignUpState,
    /// Dashboard screen
    pub dashboard: DashboardState,
}

/// Application input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// App launched
    OnAppear,
    /// Look for a signed-in user and pick the first route
    CheckAuthenticationStatus,
    /// Show another screen
    RouteChanged(Route),
    /// Show an app-level error
    ErrorOccurred(String),
    /// Hide the app-level error
    ErrorDismissed,
    /// Onboarding finished
    OnboardingCompleted,
    /// "Create account" link
    NavigateToSignUp,
    /// "Already have an account" link
    NavigateToSignIn,
    /// Sign out from the dashboard
    SignOutTapped,
    /// Onboarding screen action
    Onboarding(OnboardingAction),
    /// Sign-in screen action
    SignIn(SignInAction),
    /// Sign-up screen action
    SignUp(SignUpAction),
    /// Dashboard screen action
    Dashboard(DashboardAction),
}

/// Reducer for [`AppState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AppReducer {
    onboarding: OnboardingReducer,
    sign_in: SignInReducer,
    sign_up: SignUpReducer,
    dashboard: DashboardReducer,
}

impl AppReducer {
    /// Create the reducer with every child screen.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn sign_out(env: &Dependencies) -> Effect<AppAction> {
        let users = Arc::clone(&env.users);
        let storage = Arc::clone(&env.secure_storage);
        let logger = Arc::clone(&env.logger);
        let analytics = Arc::clone(&env.analytics);

        async_effect! {
            if let Err(error) = users.sign_out().await {
                logger.log(&format!("Sign-out failed: {error}"), LogLevel::Warning, "auth");
            }
            if let Err(error) = session::clear(storage.as_ref()) {
                logger.log(&format!("Clearing session failed: {error}"), LogLevel::Warning, "auth");
            }
            analytics.track("signed_out", Properties::new());
            AppAction::RouteChanged(Route::Auth)
        }
    }
}

impl Reducer for AppReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = Dependencies;

    #[allow(clippy::too_many_lines)] // one arm per action
    fn reduce(
        &self,
        state: &mut AppState,
        action: AppAction,
        env: &Dependencies,
    ) -> SmallVec<[Effect<AppAction>; 4]> {
        match action {
            AppAction::OnAppear => {
                return smallvec![Effect::send(AppAction::CheckAuthenticationStatus)];
            },
            AppAction::CheckAuthenticationStatus => {
                state.is_loading = true;
                let users = Arc::clone(&env.users);
                let logger = Arc::clone(&env.logger);
                return smallvec![Effect::try_task(
                    TaskPriority::UserInitiated,
                    async move {
                        users.get_current_user().await.map(|user| {
                            AppAction::RouteChanged(if user.is_some() {
                                Route::Dashboard
                            } else {
                                Route::Onboarding
                            })
                        })
                    },
                    move |error| {
                        let message = format!("Authentication check failed: {error}");
                        logger.log(&message, LogLevel::Error, "app");
                        AppAction::ErrorOccurred(AUTH_CHECK_FAILED.to_string())
                    },
                )];
            },
            AppAction::RouteChanged(route) => {
                tracing::debug!(from = ?state.route, to = ?route, "Route changed");
                state.route = route;
                state.is_loading = false;
            },
            AppAction::ErrorOccurred(message) => {
                state.is_loading = false;
                state.error_message = Some(message);
            },
            AppAction::ErrorDismissed => state.error_message = None,
            AppAction::OnboardingCompleted => {
                return smallvec![Effect::send(AppAction::RouteChanged(Route::Auth))];
            },
            AppAction::NavigateToSignUp => state.route = Route::SignUp,
            AppAction::NavigateToSignIn => state.route = Route::Auth,
            AppAction::SignOutTapped => {
                state.sign_in = SignInState::default();
                state.sign_up = SignUpState::default();
                state.dashboard = DashboardState::default();
                return smallvec![Self::sign_out(env)];
            },

            AppAction::Onboarding(action) => {
                let completed = matches!(action, OnboardingAction::OnboardingCompleted);
                let mut effects: SmallVec<[Effect<AppAction>; 4]> = self
                    .onboarding
                    .reduce(&mut state.onboarding, action, env)
                    .into_iter()
                    .map(|effect| effect.map(AppAction::Onboarding))
                    .collect();
                if completed {
                    effects.push(Effect::send(AppAction::OnboardingCompleted));
                }
                return effects;
            },
            AppAction::SignIn(action) => {
                let was_authenticated = state.sign_in.is_authenticated;
                let effects = self
                    .sign_in
                    .reduce(&mut state.sign_in, action, env)
                    .into_iter()
                    .map(|effect| effect.map(AppAction::SignIn))
                    .collect();
                if state.sign_in.is_authenticated && !was_authenticated {
                    state.route = Route::Dashboard;
                }
                return effects;
            },
            AppAction::SignUp(action) => {
                let was_authenticated = state.sign_up.is_authenticated;
                let effects = self
                    .sign_up
                    .reduce(&mut state.sign_up, action, env)
                    .into_iter()
                    .map(|effect| effect.map(AppAction::SignUp))
                    .collect();
                if state.sign_up.is_authenticated && !was_authenticated {
                    state.route = Route::Dashboard;
                }
                return effects;
            },
            AppAction::Dashboard(action) => {
                return self
                    .dashboard
                    .reduce(&mut state.dashboard, action, env)
                    .into_iter()
                    .map(|effect| effect.map(AppAction::Dashboard))
                    .collect();
            },
        }
        SmallVec::new()
    }
}
