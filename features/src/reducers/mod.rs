//! Feature reducers.
//!
//! Every reducer here uses [`Dependencies`](crate::Dependencies) as its
//! environment so that the app reducer can embed them directly.

pub mod app;
pub mod dashboard;
pub mod onboarding;
pub mod sign_in;
pub mod sign_up;

pub use app::{AppAction, AppReducer, AppState, Route};
pub use dashboard::{DashboardAction, DashboardReducer, DashboardState};
pub use onboarding::{OnboardingAction, OnboardingReducer, OnboardingState};
pub use sign_in::{SignInAction, SignInReducer, SignInState};
pub use sign_up::{SignUpAction, SignUpReducer, SignUpState};
