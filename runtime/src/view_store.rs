//! `ViewStore`: a cached view of a [`Store`] for many observers
//!
//! The view store attaches exactly one observer to its store, keeps the last
//! published state as a snapshot and fans every update out to its own
//! subscribers. Dropping the view store detaches it from the store.

use crate::observer::{ObserverRegistry, Subscription};
use crate::store::{Store, WhileObservation};
use crate::{EffectHandle, StoreError};
use boardflow_core::reducer::Reducer;
use std::ops::ControlFlow;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;

/// Observable snapshot of a store's state
///
/// # Example
///
/// ```ignore
/// let view = ViewStore::new(&store);
/// let _subscription = view.observe(|state| render(state));
///
/// view.send(SignInAction::EmailChanged("me@example.com".into()))?;
/// assert_eq!(view.state().email, "me@example.com");
/// ```
pub struct ViewStore<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    store: Store<S, A, E, R>,
    snapshot: Arc<RwLock<S>>,
    subscribers: ObserverRegistry<S>,
    changes: watch::Receiver<S>,
    attachment: Subscription,
}

impl<S, A, E, R> ViewStore<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Send + 'static,
    S: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Attach a new view to `store`, starting from its current state
    #[must_use]
    pub fn new(store: &Store<S, A, E, R>) -> Self {
        let subscribers = ObserverRegistry::new();
        let fan_out = subscribers.clone();

        let ((snapshot, changes), attachment) = store.observe_with(|current: &S| {
            let snapshot = Arc::new(RwLock::new(current.clone()));
            let (changes_tx, changes) = watch::channel(current.clone());
            let latest = Arc::clone(&snapshot);

            let callback = move |state: &S| {
                *latest.write().unwrap_or_else(PoisonError::into_inner) = state.clone();
                changes_tx.send_replace(state.clone());
                fan_out.notify(state);
                ControlFlow::Continue(())
            };
            ((snapshot, changes), callback)
        });

        tracing::trace!("ViewStore attached");

        Self {
            store: store.clone(),
            snapshot,
            subscribers,
            changes,
            attachment,
        }
    }

    /// The last state published by the store
    #[must_use]
    pub fn state(&self) -> S {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read the cached state via a closure
    pub fn with_state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        f(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Forward an action to the store
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    pub fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
        self.store.send(action)
    }

    /// Forward an action and observe the store while `predicate` holds
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    pub fn send_while<P>(&self, action: A, predicate: P) -> Result<WhileObservation, StoreError>
    where
        P: FnMut(&S) -> bool + Send + 'static,
    {
        self.store.send_while(action, predicate)
    }

    /// Subscribe to every state this view republishes
    pub fn observe<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(&S) + Send + 'static,
    {
        Subscription::new(self.subscribers.register(Box::new(move |state| {
            callback(state);
            ControlFlow::Continue(())
        })))
    }

    /// Receiver yielding the latest state for async consumers
    #[must_use]
    pub fn changes(&self) -> watch::Receiver<S> {
        self.changes.clone()
    }

    /// Number of subscribers attached to this view
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Detach from the store now; equivalent to dropping the view
    pub fn detach(self) {
        self.attachment.cancel();
    }
}

impl<S, A, E, R> std::fmt::Debug for ViewStore<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewStore")
            .field("state", &*self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardflow_core::effect::{Effect, TaskPriority};
    use boardflow_core::{smallvec, SmallVec};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Counter {
        count: i64,
    }

    #[derive(Debug, Clone)]
    enum CounterAction {
        Increment,
        IncrementLater,
    }

    struct CounterReducer;

    impl Reducer for CounterReducer {
        type State = Counter;
        type Action = CounterAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Counter,
            action: CounterAction,
            _env: &(),
        ) -> SmallVec<[Effect<CounterAction>; 4]> {
            match action {
                CounterAction::Increment => {
                    state.count += 1;
                    smallvec![Effect::None]
                },
                CounterAction::IncrementLater => {
                    smallvec![Effect::task(TaskPriority::default(), async {
                        CounterAction::Increment
                    })]
                },
            }
        }
    }

    #[tokio::test]
    async fn view_tracks_store_updates() -> Result<(), StoreError> {
        let store = Store::new(Counter::default(), CounterReducer, ());
        store.send(CounterAction::Increment)?;

        let view = ViewStore::new(&store);
        assert_eq!(view.state().count, 1);

        view.send(CounterAction::Increment)?;
        assert_eq!(view.state().count, 2);
        assert_eq!(view.with_state(|s| s.count), store.state(|s| s.count));
        Ok(())
    }

    #[tokio::test]
    async fn view_fans_out_to_subscribers() -> Result<(), StoreError> {
        let store = Store::new(Counter::default(), CounterReducer, ());
        let view = ViewStore::new(&store);
        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(AtomicUsize::new(0));

        let sink = Arc::clone(&first);
        let _a = view.observe(move |state| {
            if let Ok(mut seen) = sink.lock() {
                seen.push(state.count);
            }
        });
        let hits = Arc::clone(&second);
        let b = view.observe(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(view.subscriber_count(), 2);

        store.send(CounterAction::Increment)?;
        drop(b);
        store.send(CounterAction::Increment)?;

        let seen = first.lock().map(|s| s.clone()).unwrap_or_default();
        assert_eq!(seen, vec![1, 2]);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn dropped_view_stops_receiving() -> Result<(), StoreError> {
        let store = Store::new(Counter::default(), CounterReducer, ());
        let view = ViewStore::new(&store);
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        let subscription = view.observe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.send(CounterAction::Increment)?;
        drop(view);
        store.send(CounterAction::Increment)?;
        drop(subscription);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn changes_follow_effect_feedback() -> Result<(), StoreError> {
        let store = Store::new(Counter::default(), CounterReducer, ());
        let view = ViewStore::new(&store);
        let mut changes = view.changes();

        view.send(CounterAction::IncrementLater)?;
        let seen = changes.wait_for(|state| state.count == 1).await.map(|s| s.count);

        assert_eq!(seen.ok(), Some(1));
        Ok(())
    }
}
