//! Reducer composition utilities
//!
//! - **`combine_reducers`**: Run multiple reducers on the same state/action
//! - **`scope_reducer`**: Focus a reducer on a subset of state
//!
//! # Examples
//!
//! ```
//! use boardflow_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//! use boardflow_core::composition::combine_reducers;
//!
//! #[derive(Clone, Default)]
//! struct AppState {
//!     counter: i32,
//!     logged: bool,
//! }
//!
//! #[derive(Clone)]
//! enum AppAction {
//!     Increment,
//!     Log,
//! }
//!
//! struct CounterReducer;
//! struct LoggingReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = AppState;
//!     type Action = AppAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut AppState, action: AppAction, _env: &()) -> SmallVec<[Effect<AppAction>; 4]> {
//!         if matches!(action, AppAction::Increment) {
//!             state.counter += 1;
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! impl Reducer for LoggingReducer {
//!     type State = AppState;
//!     type Action = AppAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut AppState, action: AppAction, _env: &()) -> SmallVec<[Effect<AppAction>; 4]> {
//!         if matches!(action, AppAction::Log) {
//!             state.logged = true;
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let combined = combine_reducers(vec![Box::new(CounterReducer), Box::new(LoggingReducer)]);
//!
//! let mut state = AppState::default();
//! let _ = combined.reduce(&mut state, AppAction::Increment, &());
//! assert_eq!(state.counter, 1);
//! ```

use crate::effect::Effect;
use crate::reducer::{BoxedReducer, Reducer};
use smallvec::SmallVec;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer runs in list order against the same state, so later reducers
/// observe the mutations of earlier ones. The returned list holds the effects
/// of the first reducer followed by those of the second, and so on. Nothing
/// is wrapped or reordered, so the store starts them like any other list.
///
/// # Type Parameters
///
/// - `S`: The state type
/// - `A`: The action type
/// - `E`: The environment type
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<BoxedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    reducers: Vec<BoxedReducer<S, A, E>>,
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in &self.reducers {
            all_effects.extend(reducer.reduce(state, action.clone(), env));
        }

        all_effects
    }
}

/// Scopes a reducer to operate on a subset of a larger state.
///
/// # Type Parameters
///
/// - `S`: The parent state type
/// - `SubS`: The child state type (subset of `S`)
/// - `A`: The action type
/// - `E`: The environment type
///
/// # Examples
///
/// ```
/// use boardflow_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
/// use boardflow_core::composition::scope_reducer;
///
/// #[derive(Clone, Default)]
/// struct CounterState {
///     count: i32,
/// }
///
/// #[derive(Clone)]
/// enum CounterAction {
///     Increment,
/// }
///
/// struct CounterReducer;
///
/// impl Reducer for CounterReducer {
///     type State = CounterState;
///     type Action = CounterAction;
///     type Environment = ();
///
///     fn reduce(&self, state: &mut CounterState, _action: CounterAction, _env: &()) -> SmallVec<[Effect<CounterAction>; 4]> {
///         state.count += 1;
///         smallvec![Effect::None]
///     }
/// }
///
/// #[derive(Clone, Default)]
/// struct AppState {
///     counter: CounterState,
///     other_data: String,
/// }
///
/// let scoped = scope_reducer(
///     CounterReducer,
///     |app: &AppState| &app.counter,
///     |app: &mut AppState, counter: CounterState| app.counter = counter,
/// );
///
/// let mut state = AppState::default();
/// let _ = scoped.reduce(&mut state, CounterAction::Increment, &());
/// assert_eq!(state.counter.count, 1);
/// ```
pub fn scope_reducer<S, SubS, A, E, R>(
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
) -> ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    ScopedReducer {
        reducer,
        get_state,
        set_state,
        _phantom: std::marker::PhantomData,
    }
}

/// A scoped reducer that operates on a subset of state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
    _phantom: std::marker::PhantomData<fn() -> (A, E)>,
}

impl<S, SubS, A, E, R> Reducer for ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut sub_state = (self.get_state)(state).clone();
        let effects = self.reducer.reduce(&mut sub_state, action, env);
        (self.set_state)(state, sub_state);
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::TaskPriority;
    use crate::smallvec;
    use proptest::prelude::*;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct TestState {
        counter: i32,
        name: String,
        log: Vec<String>,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Increment,
        Decrement,
        SetName(String),
        Noted(&'static str),
    }

    struct CounterReducer;

    impl Reducer for CounterReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.counter += 1;
                    smallvec![Effect::send(TestAction::Noted("counter"))]
                },
                TestAction::Decrement => {
                    state.counter -= 1;
                    smallvec![Effect::None]
                },
                TestAction::SetName(_) | TestAction::Noted(_) => smallvec![Effect::None],
            }
        }
    }

    struct NameReducer;

    impl Reducer for NameReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::SetName(name) => {
                    state.name = name;
                    smallvec![Effect::None]
                },
                TestAction::Increment => {
                    // Sees the counter already bumped by CounterReducer
                    state.log.push(format!("after:{}", state.counter));
                    smallvec![Effect::send(TestAction::Noted("name"))]
                },
                _ => smallvec![Effect::None],
            }
        }
    }

    fn combined() -> CombinedReducer<TestState, TestAction, ()> {
        combine_reducers(vec![Box::new(CounterReducer), Box::new(NameReducer)])
    }

    #[test]
    fn test_combine_reducers() {
        let combined = combined();
        let mut state = TestState::default();

        let _ = combined.reduce(&mut state, TestAction::Increment, &());
        assert_eq!(state.counter, 1);
        assert_eq!(state.log, vec!["after:1".to_string()]);

        let _ = combined.reduce(&mut state, TestAction::SetName("Alice".to_string()), &());
        assert_eq!(state.name, "Alice");

        let _ = combined.reduce(&mut state, TestAction::Decrement, &());
        assert_eq!(state.counter, 0);
        assert_eq!(state.name, "Alice");
    }

    #[test]
    fn test_combined_effects_are_joined_in_order() {
        let mut state = TestState::default();
        let effects = combined().reduce(&mut state, TestAction::Increment, &());

        assert_eq!(effects.len(), 2);
        let actions: Vec<_> = effects
            .into_iter()
            .filter_map(|effect| match effect {
                Effect::Send(action) => Some(action),
                _ => None,
            })
            .collect();
        assert_eq!(
            actions,
            vec![TestAction::Noted("counter"), TestAction::Noted("name")]
        );
    }

    #[test]
    fn test_combined_keeps_every_effect_of_each_reducer() {
        let mut state = TestState::default();
        let effects = combined().reduce(&mut state, TestAction::Decrement, &());
        assert_eq!(effects.len(), 2);
        assert!(effects.iter().all(Effect::is_none));
    }

    struct SlowReducer;

    impl Reducer for SlowReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            _state: &mut Self::State,
            _action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            smallvec![Effect::task(TaskPriority::Utility, async {
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                TestAction::Noted("slow")
            })]
        }
    }

    #[test]
    fn test_slow_task_does_not_wrap_later_effects() {
        let combined =
            combine_reducers(vec![Box::new(SlowReducer), Box::new(CounterReducer)]);
        let mut state = TestState::default();

        let effects = combined.reduce(&mut state, TestAction::Increment, &());

        assert_eq!(effects.len(), 2);
        assert!(matches!(effects[0], Effect::Task { .. }));
        assert!(matches!(&effects[1], Effect::Send(TestAction::Noted("counter"))));
    }

    proptest! {
        #[test]
        fn prop_combine_matches_sequential_application(
            ops in proptest::collection::vec(0u8..3, 0..32)
        ) {
            let actions: Vec<TestAction> = ops
                .into_iter()
                .map(|op| match op {
                    0 => TestAction::Increment,
                    1 => TestAction::Decrement,
                    _ => TestAction::SetName("n".to_string()),
                })
                .collect();

            let combined = combined();
            let mut combined_state = TestState::default();
            let mut manual_state = TestState::default();

            for action in actions {
                let _ = combined.reduce(&mut combined_state, action.clone(), &());
                let _ = CounterReducer.reduce(&mut manual_state, action.clone(), &());
                let _ = NameReducer.reduce(&mut manual_state, action, &());
            }

            prop_assert_eq!(combined_state, manual_state);
        }
    }

    #[derive(Clone, Default)]
    struct SubState {
        value: i32,
    }

    #[derive(Clone)]
    enum SubAction {
        Add(i32),
        Multiply(i32),
    }

    struct SubReducer;

    impl Reducer for SubReducer {
        type State = SubState;
        type Action = SubAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                SubAction::Add(n) => state.value += n,
                SubAction::Multiply(n) => state.value *= n,
            }
            smallvec![Effect::None]
        }
    }

    #[derive(Clone, Default)]
    struct ParentState {
        sub: SubState,
        other: String,
    }

    #[test]
    fn test_scope_reducer() {
        let scoped = scope_reducer(
            SubReducer,
            |parent: &ParentState| &parent.sub,
            |parent: &mut ParentState, sub: SubState| {
                parent.sub = sub;
            },
        );

        let mut state = ParentState {
            sub: SubState { value: 5 },
            other: "test".to_string(),
        };

        let _ = scoped.reduce(&mut state, SubAction::Add(3), &());
        assert_eq!(state.sub.value, 8);
        assert_eq!(state.other, "test");

        let _ = scoped.reduce(&mut state, SubAction::Multiply(2), &());
        assert_eq!(state.sub.value, 16);
        assert_eq!(state.other, "test");
    }
}
