//! Counter demo binary
//!
//! Wires a [`Store`] and a [`ViewStore`] around the counter reducer and logs
//! every published state.

use boardflow_runtime::{Store, ViewStore};
use boardflow_testing::test_clock;
use counter_demo::{CounterAction, CounterEnvironment, CounterReducer, CounterState};
use std::ops::ControlFlow;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "counter_demo=debug,boardflow_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Counter Demo: Boardflow ===\n");

    let env = CounterEnvironment::new(test_clock());
    let store = Store::new(CounterState::default(), CounterReducer::new(), env);

    let _logger = store.observe(|state: &CounterState| {
        tracing::info!(count = state.count, "State published");
        ControlFlow::Continue(())
    });

    let view = ViewStore::new(&store);
    let _printer = view.observe(|state| println!("  view sees count = {}", state.count));

    println!("Initial count: {}", view.state().count);

    for action in [
        CounterAction::Increment,
        CounterAction::Increment,
        CounterAction::Decrement,
    ] {
        println!("\n>>> Sending: {action:?}");
        view.send(action)?;
    }
    println!("Count after synchronous actions: {}", store.state(|s| s.count));

    println!("\n>>> Sending: IncrementAsync");
    let mut handle = view.send(CounterAction::IncrementAsync)?;
    println!("Count right after send: {}", store.state(|s| s.count));
    handle.wait().await;
    store.settled().await;
    println!("Count after the effect settled: {}", store.state(|s| s.count));

    println!("\n>>> Sending: Reset (observing while count > 0)");
    let observation = store.send_while(CounterAction::Reset, |state| state.count > 0)?;
    println!("Observation still active: {}", observation.is_active());

    store.shutdown_default().await?;
    println!("\n=== Demo complete ===");
    Ok(())
}
