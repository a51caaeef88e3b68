//! Dashboard: profile, recent tasks and recent activity.
//!
//! Appearing loads the local cache first and then refreshes from the API.
//! Lists are capped at [`LIST_LIMIT`] entries.

use crate::Dependencies;
use crate::error::{ApiError, DashboardError};
use crate::models::{Activity, Profile, TaskItem};
use crate::providers::{ApiClientExt, Endpoint, LogLevel, Logger};
use boardflow_core::effect::{Effect, TaskPriority};
use boardflow_core::reducer::Reducer;
use boardflow_core::{smallvec, try_effect, SmallVec};
use std::sync::Arc;

/// Maximum number of tasks and activity entries shown.
pub const LIST_LIMIT: usize = 5;

/// Dashboard contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardState {
    /// Signed-in user
    pub profile: Option<Profile>,
    /// Most recently updated tasks
    pub tasks: Vec<TaskItem>,
    /// Most recent activity
    pub activity: Vec<Activity>,
    /// Initial load in progress
    pub is_loading: bool,
    /// Refresh in progress
    pub is_refreshing: bool,
    /// Banner text
    pub error_banner: Option<String>,
}

/// Dashboard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardAction {
    /// Screen shown
    OnAppear,
    /// Pull-to-refresh gesture
    PullToRefresh,
    /// Profile read from the user store
    ProfileLoaded(Option<Profile>),
    /// Tasks from the cache or a refresh
    TasksLoaded(Vec<TaskItem>),
    /// Activity from the cache or a refresh
    ActivityLoaded(Vec<Activity>),
    /// A refresh round finished
    RefreshCompleted(Result<(), DashboardError>),
    /// Task checkbox tapped
    ToggleTask(String),
    /// Result of toggling a task
    TaskToggled(Result<TaskItem, ApiError>),
    /// Banner dismissed
    DismissBanner,
}

/// Reducer for [`DashboardState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardReducer;

impl DashboardReducer {
    fn load_cache(env: &Dependencies) -> Effect<DashboardAction> {
        let users = Arc::clone(&env.users);
        let tasks = Arc::clone(&env.tasks);
        let activity = Arc::clone(&env.activity);

        Effect::merge(vec![
            try_effect! {
                operation: async move {
                    users
                        .get_current_user()
                        .await
                        .map(|user| DashboardAction::ProfileLoaded(user.map(Profile::from)))
                },
                on_error: |_error| DashboardAction::ProfileLoaded(None)
            },
            try_effect! {
                operation: async move {
                    tasks.fetch_cached(LIST_LIMIT).await.map(DashboardAction::TasksLoaded)
                },
                on_error: |_error| DashboardAction::TasksLoaded(Vec::new())
            },
            try_effect! {
                operation: async move {
                    activity.fetch_cached(LIST_LIMIT).await.map(DashboardAction::ActivityLoaded)
                },
                on_error: |_error| DashboardAction::ActivityLoaded(Vec::new())
            },
        ])
    }

    fn refresh_failed(logger: &dyn Logger, error: &ApiError) -> DashboardAction {
        logger.log(&format!("Refresh failed: {error}"), LogLevel::Error, "dashboard");
        DashboardAction::RefreshCompleted(Err(DashboardError::RefreshFailed))
    }

    fn refresh(env: &Dependencies) -> Effect<DashboardAction> {
        let tasks = Arc::clone(&env.tasks);
        let activity = Arc::clone(&env.activity);
        let tasks_logger = Arc::clone(&env.logger);
        let activity_logger = Arc::clone(&env.logger);

        Effect::concatenate(vec![
            Effect::merge(vec![
                try_effect! {
                    priority: TaskPriority::Utility,
                    operation: async move {
                        tasks.refresh(LIST_LIMIT).await.map(DashboardAction::TasksLoaded)
                    },
                    on_error: |error| Self::refresh_failed(tasks_logger.as_ref(), &error)
                },
                try_effect! {
                    priority: TaskPriority::Utility,
                    operation: async move {
                        activity.refresh(LIST_LIMIT).await.map(DashboardAction::ActivityLoaded)
                    },
                    on_error: |error| Self::refresh_failed(activity_logger.as_ref(), &error)
                },
            ]),
            Effect::send(DashboardAction::RefreshCompleted(Ok(()))),
        ])
    }
}

impl Reducer for DashboardReducer {
    type State = DashboardState;
    type Action = DashboardAction;
    type Environment = Dependencies;

    fn reduce(
        &self,
        state: &mut DashboardState,
        action: DashboardAction,
        env: &Dependencies,
    ) -> SmallVec<[Effect<DashboardAction>; 4]> {
        match action {
            DashboardAction::OnAppear => {
                state.is_loading = true;
                state.error_banner = None;
                return smallvec![Effect::concatenate(vec![
                    Self::load_cache(env),
                    Self::refresh(env),
                ])];
            },
            DashboardAction::PullToRefresh => {
                state.is_refreshing = true;
                state.error_banner = None;
                return smallvec![Self::refresh(env)];
            },
            DashboardAction::ProfileLoaded(profile) => {
                state.profile = profile;
                state.is_loading = false;
            },
            DashboardAction::TasksLoaded(mut tasks) => {
                tasks.truncate(LIST_LIMIT);
                state.tasks = tasks;
                state.is_loading = false;
            },
            DashboardAction::ActivityLoaded(mut activity) => {
                activity.truncate(LIST_LIMIT);
                state.activity = activity;
                state.is_loading = false;
            },
            DashboardAction::RefreshCompleted(result) => {
                state.is_refreshing = false;
                if let Err(error) = result {
                    state.error_banner = Some(error.to_string());
                }
            },
            DashboardAction::ToggleTask(id) => {
                let api = Arc::clone(&env.api);
                return smallvec![Effect::task(TaskPriority::UserInitiated, async move {
                    DashboardAction::TaskToggled(api.fetch(Endpoint::ToggleTask { id }).await)
                })];
            },
            DashboardAction::TaskToggled(Ok(updated)) => {
                if let Some(task) = state.tasks.iter_mut().find(|task| task.id == updated.id) {
                    *task = updated;
                }
            },
            DashboardAction::TaskToggled(Err(error)) => {
                state.error_banner = Some(error.to_string());
            },
            DashboardAction::DismissBanner => state.error_banner = None,
        }
        SmallVec::new()
    }
}
