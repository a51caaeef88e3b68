//! # Boardflow Features
//!
//! The screens of the dashboard application expressed as Boardflow reducers:
//!
//! - [`reducers::OnboardingReducer`]: three-page walkthrough
//! - [`reducers::SignInReducer`] and [`reducers::SignUpReducer`]: credential
//!   forms with inline validation, backed by [`providers::UserRepository`]
//! - [`reducers::DashboardReducer`]: profile, tasks and activity with cache
//!   first loading and pull-to-refresh
//! - [`reducers::AppReducer`]: routing between the screens, embedding the
//!   other reducers
//!
//! Every reducer takes [`Dependencies`] as its environment. Side effects
//! (network, storage, analytics) only happen inside the effects a reducer
//! returns, through the capability traits in [`providers`].
//!
//! ## Example
//!
//! ```ignore
//! use boardflow_features::{Dependencies, reducers::{AppAction, AppReducer, AppState}};
//! use boardflow_runtime::Store;
//!
//! let store = Store::new(AppState::default(), AppReducer::new(), Dependencies::mock());
//! store.send(AppAction::OnAppear)?;
//! store.settled().await;
//! ```
//!
//! With the `test-utils` feature (on by default) the [`mocks`] module provides
//! in-memory implementations of every capability and `Dependencies::mock()`.

pub mod dependencies;
pub mod error;
#[cfg(feature = "test-utils")]
pub mod mocks;
pub mod models;
pub mod password;
pub mod providers;
pub mod reducers;
pub mod session;
pub mod validation;

pub use dependencies::Dependencies;
pub use error::{ApiError, DashboardError, SessionError, StorageError, UserRepositoryError};
