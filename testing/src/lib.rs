//! # Boardflow Testing
//!
//! Testing utilities and helpers for the Boardflow architecture.
//!
//! This crate provides:
//! - Deterministic clocks
//! - A Given/When/Then builder for reducers
//! - Effect assertions and collectors
//! - Property-based testing helpers
//!
//! ## Example
//!
//! ```ignore
//! use boardflow_testing::{collect_actions, test_clock};
//!
//! #[tokio::test]
//! async fn loads_tasks() {
//!     let env = test_environment();
//!     let mut state = DashboardState::default();
//!     let effects = DashboardReducer.reduce(&mut state, DashboardAction::OnAppear, &env);
//!
//!     let actions = collect_actions(Effect::concatenate(effects.into_vec())).await;
//!     assert!(!actions.is_empty());
//! }
//! ```

use chrono::{DateTime, Utc};
use boardflow_core::environment::Clock;

mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use boardflow_testing::mocks::FixedClock;
    /// use boardflow_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to
    #[derive(Debug)]
    pub struct ManualClock {
        time: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        /// Start at `time`
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Mutex::new(time),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::seconds(1_735_689_600))
    }
}

/// Running effects to completion in tests
pub mod effects {
    use boardflow_core::effect::Effect;
    use boardflow_runtime::execution::into_stream;
    use futures::StreamExt;
    use std::time::Duration;

    /// Run an effect to completion and return everything it delivered
    ///
    /// Must be awaited inside a tokio runtime when the effect has tasks or
    /// delays. Use `#[tokio::test(start_paused = true)]` to skip over delays.
    pub async fn collect_actions<A>(effect: Effect<A>) -> Vec<A>
    where
        A: Send + 'static,
    {
        into_stream(effect).collect().await
    }

    /// Run a reducer's effect list, one effect after another
    pub async fn collect_all<A, I>(effects: I) -> Vec<A>
    where
        A: Send + 'static,
        I: IntoIterator<Item = Effect<A>>,
    {
        collect_actions(Effect::concatenate(effects.into_iter().collect())).await
    }

    /// Like [`collect_actions`], giving up after `timeout`
    ///
    /// Returns `None` if the effect did not finish in time.
    pub async fn collect_actions_within<A>(effect: Effect<A>, timeout: Duration) -> Option<Vec<A>>
    where
        A: Send + 'static,
    {
        tokio::time::timeout(timeout, collect_actions(effect)).await.ok()
    }
}

/// Test helpers and utilities
pub mod helpers {
    /// Install a `tracing` subscriber writing through the test harness
    ///
    /// Honours `RUST_LOG`. Safe to call from every test.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities
pub mod properties {
    use boardflow_core::effect::Effect;
    use boardflow_core::reducer::Reducer;
    use proptest::prelude::*;

    /// Apply `actions` one by one, returning the final state and every effect
    /// produced along the way.
    pub fn fold<R>(
        reducer: &R,
        env: &R::Environment,
        mut state: R::State,
        actions: impl IntoIterator<Item = R::Action>,
    ) -> (R::State, Vec<Effect<R::Action>>)
    where
        R: Reducer,
    {
        let mut effects = Vec::new();
        for action in actions {
            effects.extend(reducer.reduce(&mut state, action, env));
        }
        (state, effects)
    }

    /// Sequences of up to `max_len` actions drawn from `action`
    pub fn action_sequences<A>(
        action: impl Strategy<Value = A>,
        max_len: usize,
    ) -> impl Strategy<Value = Vec<A>>
    where
        A: std::fmt::Debug,
    {
        proptest::collection::vec(action, 0..=max_len)
    }
}

// Re-export commonly used items
pub use effects::{collect_actions, collect_all};
pub use mocks::{FixedClock, ManualClock, test_clock};
