//! # Boardflow Core
//!
//! Core traits and types for the Boardflow unidirectional data-flow architecture.
//!
//! ## Core Concepts
//!
//! - **State**: Value type owned by a store, mutated only inside a reducer
//! - **Action**: Every input a feature can receive (user intents, effect results)
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Description of deferred work that yields further actions
//! - **Environment**: Injected dependencies
//!
//! ## Architecture Principles
//!
//! - Single source of truth per store
//! - Unidirectional data flow: `send → reduce → publish → run effects → send`
//! - Explicit effects (constructing one starts nothing)
//! - Dependency injection via the environment
//!
//! ## Example
//!
//! ```
//! use boardflow_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct CounterState {
//!     count: i64,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum CounterAction {
//!     Increment,
//!     Decrement,
//! }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = CounterState;
//!     type Action = CounterAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut CounterState,
//!         action: CounterAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<CounterAction>; 4]> {
//!         match action {
//!             CounterAction::Increment => state.count += 1,
//!             CounterAction::Decrement => state.count -= 1,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = CounterState::default();
//! let _ = CounterReducer.reduce(&mut state, CounterAction::Increment, &());
//! assert_eq!(state.count, 1);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

/// Reducer composition utilities
pub mod composition;

/// Declarative macros for building effects
pub mod effect_macros;

/// Reducer module - The core trait for business logic
///
/// Reducers are functions `(State, Action, Environment) → (State, Effects)`.
/// They hold all business logic and are deterministic given their inputs.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// A reducer runs synchronously and returns before any of its effects
    /// start. Borrows of `state` and `env` end with the call; anything an
    /// effect needs later must be cloned into it.
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        ///
        /// # Returns
        ///
        /// The effects to be started by the runtime, in order
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }

    /// A type-erased reducer, usable wherever a concrete reducer is expected.
    pub type BoxedReducer<S, A, E> =
        Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

    impl<R> Reducer for Box<R>
    where
        R: Reducer + ?Sized,
    {
        type State = R::State;
        type Action = R::Action;
        type Environment = R::Environment;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            (**self).reduce(state, action, env)
        }
    }

    impl<R> Reducer for std::sync::Arc<R>
    where
        R: Reducer + ?Sized,
    {
        type State = R::State;
        type Action = R::Action;
        type Environment = R::Environment;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            (**self).reduce(state, action, env)
        }
    }

    /// Erase a reducer's concrete type.
    #[must_use]
    pub fn boxed<R>(reducer: R) -> BoxedReducer<R::State, R::Action, R::Environment>
    where
        R: Reducer + Send + Sync + 'static,
    {
        Box::new(reducer)
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe deferred work. They are values: building one starts
/// nothing, and the runtime decides when and where it runs.
pub mod effect {
    use futures::future::BoxFuture;
    use std::future::Future;
    use std::sync::Arc;
    use std::time::Duration;

    /// A boxed asynchronous operation producing exactly one action.
    pub type Operation<Action> = BoxFuture<'static, Action>;

    /// Scheduling hint attached to [`Effect::Task`].
    ///
    /// Priorities are advisory. The runtime records them on the effect's span
    /// and lets [`TaskPriority::Background`] work yield to already-scheduled
    /// tasks before starting.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub enum TaskPriority {
        /// Latency sensitive work
        High,
        /// Work the user is actively waiting on
        #[default]
        UserInitiated,
        /// Long running work with visible progress
        Utility,
        /// Work nobody is waiting on
        Background,
    }

    impl TaskPriority {
        /// Label used for tracing fields and metrics.
        #[must_use]
        pub const fn as_str(self) -> &'static str {
            match self {
                Self::High => "high",
                Self::UserInitiated => "user_initiated",
                Self::Utility => "utility",
                Self::Background => "background",
            }
        }
    }

    /// Effect type - describes work to be executed by the runtime
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Deliver a single action
        Send(Action),

        /// Deliver several actions in order
        Sequence(Vec<Action>),

        /// Run effects concurrently; delivery order across children is unspecified
        Parallel(Vec<Effect<Action>>),

        /// Run effects one after another; each starts after the previous one
        /// has delivered all of its actions
        Sequential(Vec<Effect<Action>>),

        /// Delayed action (for timeouts, debouncing)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to deliver after the delay
            action: Box<Action>,
        },

        /// Asynchronous operation producing exactly one action
        Task {
            /// Scheduling hint
            priority: TaskPriority,
            /// The operation itself
            operation: Operation<Action>,
        },
    }

    // Manual Debug implementation since futures don't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Send(action) => f.debug_tuple("Effect::Send").field(action).finish(),
                Effect::Sequence(actions) => {
                    f.debug_tuple("Effect::Sequence").field(actions).finish()
                },
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Task { priority, .. } => f
                    .debug_struct("Effect::Task")
                    .field("priority", priority)
                    .finish_non_exhaustive(),
            }
        }
    }

    impl<Action> Default for Effect<Action> {
        fn default() -> Self {
            Self::None
        }
    }

    impl<Action> Effect<Action> {
        /// An effect that does nothing
        #[must_use]
        pub const fn none() -> Self {
            Self::None
        }

        /// An effect delivering `action` exactly once
        #[must_use]
        pub const fn send(action: Action) -> Self {
            Self::Send(action)
        }

        /// An effect delivering `actions` in order
        #[must_use]
        pub fn sequence(actions: impl IntoIterator<Item = Action>) -> Self {
            Self::Sequence(actions.into_iter().collect())
        }

        /// An effect delivering `action` after `duration`
        #[must_use]
        pub fn delay(duration: Duration, action: Action) -> Self {
            Self::Delay {
                duration,
                action: Box::new(action),
            }
        }

        /// Combine effects to run concurrently
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run strictly one after another
        ///
        /// Concatenating nothing yields [`Effect::None`].
        #[must_use]
        pub fn concatenate(effects: Vec<Effect<Action>>) -> Effect<Action> {
            if effects.is_empty() {
                Effect::None
            } else {
                Effect::Sequential(effects)
            }
        }

        /// Returns `true` for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Self::None)
        }

        /// Returns `true` if the effect can be delivered without suspending:
        /// it contains no task and no delay anywhere inside it.
        #[must_use]
        pub fn is_synchronous(&self) -> bool {
            match self {
                Self::None | Self::Send(_) | Self::Sequence(_) => true,
                Self::Parallel(effects) | Self::Sequential(effects) => {
                    effects.iter().all(Self::is_synchronous)
                },
                Self::Delay { .. } | Self::Task { .. } => false,
            }
        }

        /// Flatten a synchronous effect into the actions it delivers, in order.
        ///
        /// # Errors
        ///
        /// Returns the effect unchanged if it contains asynchronous work.
        pub fn try_into_actions(self) -> Result<Vec<Action>, Self> {
            if !self.is_synchronous() {
                return Err(self);
            }
            let mut actions = Vec::new();
            self.flatten_into(&mut actions);
            Ok(actions)
        }

        fn flatten_into(self, out: &mut Vec<Action>) {
            match self {
                Self::None | Self::Delay { .. } | Self::Task { .. } => {},
                Self::Send(action) => out.push(action),
                Self::Sequence(actions) => out.extend(actions),
                Self::Parallel(effects) | Self::Sequential(effects) => {
                    for effect in effects {
                        effect.flatten_into(out);
                    }
                },
            }
        }
    }

    impl<Action> Effect<Action>
    where
        Action: Send + 'static,
    {
        /// An asynchronous operation producing one action
        #[must_use]
        pub fn task<F>(priority: TaskPriority, operation: F) -> Self
        where
            F: Future<Output = Action> + Send + 'static,
        {
            Self::Task {
                priority,
                operation: Box::pin(operation),
            }
        }

        /// A fallible asynchronous operation.
        ///
        /// A failure is logged at `debug` and mapped through `on_error`, so the
        /// effect delivers an action on both paths.
        #[must_use]
        pub fn try_task<F, Err, M>(priority: TaskPriority, operation: F, on_error: M) -> Self
        where
            F: Future<Output = Result<Action, Err>> + Send + 'static,
            Err: std::fmt::Display + Send + 'static,
            M: FnOnce(Err) -> Action + Send + 'static,
        {
            Self::task(priority, async move {
                match operation.await {
                    Ok(action) => action,
                    Err(error) => {
                        tracing::debug!(error = %error, "Task operation failed, mapping to action");
                        on_error(error)
                    },
                }
            })
        }

        /// Transform every action this effect delivers.
        ///
        /// Used to embed a child feature's effects in a parent's action type.
        #[must_use]
        pub fn map<B, F>(self, f: F) -> Effect<B>
        where
            B: Send + 'static,
            F: Fn(Action) -> B + Send + Sync + 'static,
        {
            self.map_shared(&Arc::new(f))
        }

        fn map_shared<B, F>(self, f: &Arc<F>) -> Effect<B>
        where
            B: Send + 'static,
            F: Fn(Action) -> B + Send + Sync + 'static,
        {
            match self {
                Self::None => Effect::None,
                Self::Send(action) => Effect::Send(f(action)),
                Self::Sequence(actions) => {
                    Effect::Sequence(actions.into_iter().map(&**f).collect())
                },
                Self::Parallel(effects) => {
                    Effect::Parallel(effects.into_iter().map(|e| e.map_shared(f)).collect())
                },
                Self::Sequential(effects) => {
                    Effect::Sequential(effects.into_iter().map(|e| e.map_shared(f)).collect())
                },
                Self::Delay { duration, action } => Effect::Delay {
                    duration,
                    action: Box::new(f(*action)),
                },
                Self::Task {
                    priority,
                    operation,
                } => {
                    let f = Arc::clone(f);
                    Effect::Task {
                        priority,
                        operation: Box::pin(async move { f(operation.await) }),
                    }
                },
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// External capabilities are abstracted behind traits and injected via the
/// reducer's environment.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock backed by [`Utc::now`].
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
        fn now(&self) -> DateTime<Utc> {
            (**self).now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::{Effect, TaskPriority};
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        A,
        B,
        C,
        Wrapped(Box<TestAction>),
    }

    #[test]
    fn concatenate_of_nothing_is_none() {
        let effect = Effect::<TestAction>::concatenate(vec![]);
        assert!(effect.is_none());
    }

    #[test]
    fn synchronous_effects_flatten_in_order() {
        let effect = Effect::concatenate(vec![
            Effect::send(TestAction::A),
            Effect::sequence([TestAction::B, TestAction::C]),
            Effect::None,
        ]);

        assert!(effect.is_synchronous());
        let actions = effect.try_into_actions().ok();
        assert_eq!(
            actions,
            Some(vec![TestAction::A, TestAction::B, TestAction::C])
        );
    }

    #[test]
    fn async_effects_are_not_flattened() {
        let effect = Effect::merge(vec![
            Effect::send(TestAction::A),
            Effect::task(TaskPriority::default(), async { TestAction::B }),
        ]);

        assert!(!effect.is_synchronous());
        assert!(effect.try_into_actions().is_err());

        let delayed = Effect::delay(Duration::from_millis(5), TestAction::C);
        assert!(!delayed.is_synchronous());
    }

    #[test]
    fn map_rewrites_synchronous_actions() {
        let effect = Effect::sequence([TestAction::A, TestAction::B])
            .map(|a| TestAction::Wrapped(Box::new(a)));

        let actions = effect.try_into_actions().ok();
        assert_eq!(
            actions,
            Some(vec![
                TestAction::Wrapped(Box::new(TestAction::A)),
                TestAction::Wrapped(Box::new(TestAction::B)),
            ])
        );
    }

    #[tokio::test]
    async fn try_task_maps_errors_to_actions() {
        let effect = Effect::try_task(
            TaskPriority::Utility,
            async { Err::<TestAction, _>("boom") },
            |_| TestAction::C,
        );

        let Effect::Task { priority, operation } = effect else {
            unreachable!("try_task builds a task");
        };
        assert_eq!(priority, TaskPriority::Utility);
        assert_eq!(operation.await, TestAction::C);
    }

    #[tokio::test]
    async fn map_wraps_task_output() {
        let effect = Effect::task(TaskPriority::High, async { TestAction::A })
            .map(|a| TestAction::Wrapped(Box::new(a)));

        let Effect::Task { operation, .. } = effect else {
            unreachable!("map preserves the task shape");
        };
        assert_eq!(operation.await, TestAction::Wrapped(Box::new(TestAction::A)));
    }

    #[test]
    fn debug_hides_task_operation() {
        let effect = Effect::task(TaskPriority::Background, async { TestAction::A });
        let rendered = format!("{effect:?}");
        assert!(rendered.contains("Effect::Task"));
        assert!(rendered.contains("Background"));
    }
}
