//! Counter scenarios driven through a real Store

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use boardflow_runtime::{Store, StoreError, ViewStore};
use boardflow_testing::test_clock;
use counter_demo::{CounterAction, CounterEnvironment, CounterReducer, CounterState};

fn new_store() -> Store<
    CounterState,
    CounterAction,
    CounterEnvironment<boardflow_testing::FixedClock>,
    CounterReducer<boardflow_testing::FixedClock>,
> {
    Store::new(
        CounterState::default(),
        CounterReducer::new(),
        CounterEnvironment::new(test_clock()),
    )
}

#[tokio::test]
async fn increment_twice_then_decrement() -> Result<(), StoreError> {
    let store = new_store();

    store.send(CounterAction::Increment)?;
    store.send(CounterAction::Increment)?;
    store.send(CounterAction::Decrement)?;

    assert_eq!(store.state(|s| s.count), 1);
    Ok(())
}

#[tokio::test]
async fn increment_async_applies_after_settling() -> Result<(), StoreError> {
    let store = new_store();

    store.send(CounterAction::IncrementAsync)?;
    assert_eq!(store.state(|s| s.count), 0);

    store.settled().await;
    assert_eq!(store.state(|s| s.count), 1);
    Ok(())
}

#[tokio::test]
async fn concurrent_increments() {
    let store = new_store();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                let _ = store.send(CounterAction::Increment);
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.state(|s| s.count), 10);
}

#[tokio::test]
async fn view_store_follows_async_updates() -> Result<(), StoreError> {
    let store = new_store();
    let view = ViewStore::new(&store);
    let mut changes = view.changes();

    view.send(CounterAction::IncrementAsync)?;
    let seen = changes.wait_for(|state| state.count == 1).await.map(|s| s.count);

    assert_eq!(seen.ok(), Some(1));
    assert_eq!(view.state(), store.snapshot());
    Ok(())
}

#[tokio::test]
async fn large_counts_saturate() -> Result<(), StoreError> {
    let store = Store::new(
        CounterState {
            count: i64::MAX - 1,
            last_changed: None,
        },
        CounterReducer::new(),
        CounterEnvironment::new(test_clock()),
    );

    for _ in 0..3 {
        store.send(CounterAction::Increment)?;
    }

    assert_eq!(store.state(|s| s.count), i64::MAX);
    Ok(())
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn count_is_increments_minus_decrements(
            ups in prop::collection::vec(any::<bool>(), 0..64)
        ) {
            let store = new_store();
            for up in &ups {
                let action = if *up { CounterAction::Increment } else { CounterAction::Decrement };
                store.send(action).map_err(|e| TestCaseError::fail(e.to_string()))?;
            }

            let increments =
                i64::try_from(ups.iter().filter(|up| **up).count()).unwrap_or_default();
            let decrements = i64::try_from(ups.len()).unwrap_or_default() - increments;
            prop_assert_eq!(store.state(|s| s.count), increments - decrements);
        }
    }
}
