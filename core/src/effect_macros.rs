//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when creating task and delay effects from
//! inside a reducer.

/// Create an `Effect::Task` from an async block
///
/// The priority defaults to `TaskPriority::UserInitiated`.
///
/// # Example
///
/// ```rust,ignore
/// use boardflow_core::async_effect;
///
/// async_effect! {
///     let tasks = repository.refresh(5).await;
///     DashboardAction::TasksLoaded(tasks)
/// }
///
/// async_effect! { priority: TaskPriority::Background =>
///     analytics.track("dashboard_viewed", props).await;
///     DashboardAction::Tracked
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    (priority: $priority:expr => $($body:tt)*) => {
        $crate::effect::Effect::task($priority, async move { $($body)* })
    };
    ($($body:tt)*) => {
        $crate::effect::Effect::task(
            $crate::effect::TaskPriority::default(),
            async move { $($body)* },
        )
    };
}

/// Create a fallible `Effect::Task` whose error is mapped to an action
///
/// # Example
///
/// ```rust,ignore
/// use boardflow_core::try_effect;
///
/// try_effect! {
///     operation: async move { api.request(Endpoint::Tasks).await.map(TaskAction::Loaded) },
///     on_error: |error| TaskAction::Failed(error.to_string())
/// }
/// ```
#[macro_export]
macro_rules! try_effect {
    (
        operation: $operation:expr,
        on_error: |$error_param:ident| $error_body:expr
    ) => {
        $crate::effect::Effect::try_task(
            $crate::effect::TaskPriority::default(),
            $operation,
            move |$error_param| $error_body,
        )
    };
    (
        priority: $priority:expr,
        operation: $operation:expr,
        on_error: |$error_param:ident| $error_body:expr
    ) => {
        $crate::effect::Effect::try_task($priority, $operation, move |$error_param| $error_body)
    };
}

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use boardflow_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(3),
///     action: AppAction::ErrorDismissed
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}
