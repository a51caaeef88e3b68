//! # Counter Demo
//!
//! The smallest useful Boardflow feature: a counter with one asynchronous
//! action.
//!
//! - `Increment`, `Decrement` and `Reset` are reduced synchronously
//! - `IncrementAsync` captures the current count and returns a task that
//!   delivers `SetCount(captured + 1)` later
//!
//! ## Example
//!
//! ```no_run
//! use counter_demo::{CounterAction, CounterEnvironment, CounterReducer, CounterState};
//! use boardflow_runtime::Store;
//! use boardflow_testing::test_clock;
//!
//! # async fn example() -> Result<(), boardflow_runtime::StoreError> {
//! let env = CounterEnvironment::new(test_clock());
//! let store = Store::new(CounterState::default(), CounterReducer::new(), env);
//!
//! store.send(CounterAction::IncrementAsync)?;
//! assert_eq!(store.state(|s| s.count), 0);
//!
//! store.settled().await;
//! assert_eq!(store.state(|s| s.count), 1);
//! # Ok(())
//! # }
//! ```

use boardflow_core::{
    DateTime, SmallVec, Utc,
    effect::{Effect, TaskPriority},
    environment::Clock,
    reducer::Reducer,
    smallvec,
};

/// Counter state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterState {
    /// Current count value
    pub count: i64,
    /// When the count last changed
    pub last_changed: Option<DateTime<Utc>>,
}

/// Counter actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterAction {
    /// Increment the counter by 1
    Increment,
    /// Decrement the counter by 1
    Decrement,
    /// Reset the counter to 0
    Reset,
    /// Increment from a background task
    IncrementAsync,
    /// Overwrite the count
    SetCount(i64),
}

/// Counter environment
///
/// The clock stamps [`CounterState::last_changed`].
#[derive(Debug, Clone)]
pub struct CounterEnvironment<C: Clock> {
    /// Clock for time-based operations
    pub clock: C,
}

impl<C: Clock> CounterEnvironment<C> {
    /// Create a new counter environment with the given clock
    #[must_use]
    pub const fn new(clock: C) -> Self {
        Self { clock }
    }
}

/// Counter reducer
///
/// Generic over the Clock type C to work with any clock implementation.
#[derive(Debug, Clone, Copy)]
pub struct CounterReducer<C> {
    _phantom: std::marker::PhantomData<C>,
}

impl<C> CounterReducer<C> {
    /// Create a new counter reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<C> Default for CounterReducer<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Reducer for CounterReducer<C> {
    type State = CounterState;
    type Action = CounterAction;
    type Environment = CounterEnvironment<C>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        environment: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CounterAction::Increment => state.count = state.count.saturating_add(1),
            CounterAction::Decrement => state.count = state.count.saturating_sub(1),
            CounterAction::Reset => state.count = 0,
            CounterAction::SetCount(count) => state.count = count,
            CounterAction::IncrementAsync => {
                let captured = state.count;
                return smallvec![Effect::task(TaskPriority::UserInitiated, async move {
                    tokio::task::yield_now().await;
                    CounterAction::SetCount(captured.saturating_add(1))
                })];
            },
        }

        state.last_changed = Some(environment.clock.now());
        smallvec![Effect::None]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardflow_testing::{ReducerTest, assertions, collect_all, test_clock};

    #[test]
    fn test_increment() {
        let mut state = CounterState::default();
        let env = CounterEnvironment::new(test_clock());
        let reducer = CounterReducer::new();

        let effects = reducer.reduce(&mut state, CounterAction::Increment, &env);

        assert_eq!(state.count, 1);
        assert_eq!(state.last_changed, Some(test_clock().now()));
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn test_increment_twice_then_decrement() {
        ReducerTest::new(CounterReducer::new())
            .with_env(CounterEnvironment::new(test_clock()))
            .given_state(CounterState::default())
            .when_actions([
                CounterAction::Increment,
                CounterAction::Increment,
                CounterAction::Decrement,
            ])
            .then_state(|state| assert_eq!(state.count, 1))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_reset() {
        let mut state = CounterState {
            count: 42,
            last_changed: None,
        };
        let env = CounterEnvironment::new(test_clock());

        let _ = CounterReducer::new().reduce(&mut state, CounterAction::Reset, &env);

        assert_eq!(state.count, 0);
    }

    #[tokio::test]
    async fn test_increment_async_captures_count() {
        let mut state = CounterState {
            count: 41,
            last_changed: None,
        };
        let env = CounterEnvironment::new(test_clock());
        let reducer = CounterReducer::new();

        let effects = reducer.reduce(&mut state, CounterAction::IncrementAsync, &env);
        assert_eq!(state.count, 41);
        assert_eq!(state.last_changed, None);

        // a later change does not affect the captured value
        let _ = reducer.reduce(&mut state, CounterAction::Reset, &env);
        assert_eq!(collect_all(effects).await, vec![CounterAction::SetCount(42)]);
    }
}
