//! # Boardflow Runtime
//!
//! Runtime implementation for the Boardflow architecture.
//!
//! This crate provides the Store runtime that coordinates reducer execution,
//! state publication and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: Owns state, runs the reducer, publishes state, starts effects
//! - **Effect execution**: Drives effect descriptions and feeds actions back
//! - **`ViewStore`**: Caches the latest state for many observers
//!
//! ## Example
//!
//! ```ignore
//! use boardflow_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action; the reduction is applied before `send` returns
//! let mut handle = store.send(Action::DoSomething)?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field);
//!
//! // Wait for the action's effects
//! handle.wait().await;
//! ```

use std::sync::Arc;

/// Effect execution on the tokio runtime
pub mod execution;

mod observer;

/// Cached, multi-observer view of a store
pub mod view_store;

pub use execution::{EffectExt, EffectTask};
pub use observer::Subscription;
pub use view_store::ViewStore;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// Returned when `send()` is called after shutdown was initiated.
        /// Actions delivered by already running effects are still accepted.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// An effect needed to suspend but no tokio runtime was available
        #[error("No tokio runtime available to execute effect")]
        NoRuntime,

        /// Timeout waiting for effects to settle
        #[error("Timeout waiting for effects")]
        Timeout,
    }
}

pub use error::StoreError;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Configuration for Store instances
///
/// # Example
///
/// ```ignore
/// let config = StoreConfig::default()
///     .with_mailbox_warn_depth(512)
///     .with_shutdown_timeout(Duration::from_secs(5));
///
/// let store = Store::with_config(state, reducer, env, config);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Queue depth above which a warning is logged for every new action
    pub mailbox_warn_depth: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
    /// Runtime used to spawn effects. Falls back to the runtime the store was
    /// created on, then to the runtime of the thread that starts the effect.
    pub runtime: Option<tokio::runtime::Handle>,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub const fn new(mailbox_warn_depth: usize, default_shutdown_timeout: Duration) -> Self {
        Self {
            mailbox_warn_depth,
            default_shutdown_timeout,
            runtime: None,
        }
    }

    /// Set the mailbox warning threshold
    #[must_use]
    pub const fn with_mailbox_warn_depth(mut self, depth: usize) -> Self {
        self.mailbox_warn_depth = depth;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }

    /// Spawn effects on an explicit runtime
    #[must_use]
    pub fn with_runtime(mut self, runtime: tokio::runtime::Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(1024, Duration::from_secs(30))
    }
}

/// Effect tracking mode - controls how effects are tracked for completion
///
/// # Modes
///
/// - **Direct**: the action's reduction, its effects, and the reductions of
///   the actions those effects deliver (default)
/// - **Cascading**: additionally follows the effects of delivered actions,
///   transitively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingMode {
    /// Track only immediate effects spawned by this action
    #[default]
    Direct,

    /// Track effects transitively through the feedback loop
    Cascading,
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for effects to complete.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start)?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // All effects from Action::Start are now complete
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    mode: TrackingMode,
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a new effect handle with the given tracking mode
    ///
    /// Returns the caller-facing handle and the tracking context threaded
    /// through effect execution.
    fn new(mode: TrackingMode) -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            mode,
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            mode,
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    ///
    /// Useful for initialization in loops where you need a `last_handle`.
    #[must_use]
    pub fn completed() -> Self {
        let (_tx, rx) = watch::channel(());

        Self {
            mode: TrackingMode::Direct,
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// The tracking mode this handle was created with
    #[must_use]
    pub const fn mode(&self) -> TrackingMode {
        self.mode
    }

    /// Returns `true` once everything tracked by this handle is done
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.effects.load(Ordering::SeqCst) == 0
    }

    /// Wait for all tracked work to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all tracked work to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires first.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("mode", &self.mode)
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: Effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    mode: TrackingMode,
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    /// Tracking nobody waits on
    fn detached() -> Self {
        EffectHandle::new(TrackingMode::Direct).1
    }

    /// Count one more unit of work, released when the guard drops
    fn begin(&self) -> DecrementGuard {
        self.counter.fetch_add(1, Ordering::SeqCst);
        DecrementGuard(self.clone())
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.notifier.send_replace(());
        }
    }

    /// Tracking for an action delivered by an effect: `(reduction, effects)`
    fn feedback(&self) -> (Self, Self) {
        match self.mode {
            TrackingMode::Direct => (self.clone(), Self::detached()),
            TrackingMode::Cascading => (self.clone(), self.clone()),
        }
    }
}

/// Internal: RAII guard that decrements the effect counter on drop
///
/// Ensures the counter is always decremented, even if the effect panics or
/// is aborted.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Internal: store-wide count of queued actions and running effects
struct PendingCounter {
    count: AtomicUsize,
    idle: watch::Sender<()>,
}

impl PendingCounter {
    fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
            idle: watch::channel(()).0,
        }
    }

    fn enter(self: &Arc<Self>) -> PendingGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        PendingGuard(Arc::clone(self))
    }

    fn load(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    async fn wait_idle(&self) {
        let mut idle = self.idle.subscribe();
        while self.load() > 0 {
            if idle.changed().await.is_err() {
                break;
            }
        }
    }
}

/// Guard that decrements the store-wide pending counter on drop
struct PendingGuard(Arc<PendingCounter>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.send_replace(());
        }
    }
}

/// Store module - The runtime for reducers
pub mod store {
    use super::{
        Arc, Duration, EffectHandle, EffectTracking, DecrementGuard, PendingCounter,
        PendingGuard, StoreConfig, StoreError, TrackingMode,
    };
    use crate::execution::into_stream;
    use crate::observer::{Detacher, ObserverRegistry, Subscription};
    use boardflow_core::{effect::Effect, reducer::Reducer};
    use futures::StreamExt;
    use std::collections::{HashMap, VecDeque};
    use std::ops::ControlFlow;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::{Mutex, PoisonError, RwLock, Weak};
    use std::thread::{self, ThreadId};
    use tokio::sync::watch;
    use tokio::task::AbortHandle;
    use tracing::Instrument;

    /// An action waiting to be reduced
    struct Envelope<A> {
        action: A,
        reduction: DecrementGuard,
        effects: EffectTracking,
        _pending: PendingGuard,
    }

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (the only place it is mutated is the reducer)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Observers (notified synchronously after each reduction)
    /// 5. Effect execution (with feedback loop)
    ///
    /// Cloning a `Store` yields another handle to the same store. When the
    /// last handle is dropped, running effects are cancelled.
    ///
    /// # Reduction order
    ///
    /// Actions go through a mailbox. Exactly one thread drains it at a time,
    /// so reductions never overlap. A `send` from outside a reduction returns
    /// after its action has been reduced and observers notified. A `send`
    /// made re-entrantly (from an observer, or by a synchronous effect) is
    /// queued behind the current action instead of recursing.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        inner: Arc<StoreInner<S, A, E, R>>,
    }

    struct StoreInner<S, A, E, R> {
        state: RwLock<S>,
        reducer: R,
        environment: E,
        config: StoreConfig,
        runtime: Option<tokio::runtime::Handle>,
        mailbox: Mutex<VecDeque<Envelope<A>>>,
        drain_lock: Mutex<()>,
        drainer: Mutex<Option<ThreadId>>,
        observers: ObserverRegistry<S>,
        tasks: Mutex<HashMap<u64, AbortHandle>>,
        next_task_id: AtomicU64,
        pending: Arc<PendingCounter>,
        shutdown: AtomicBool,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// No effect runs at construction.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        ///
        /// # Example
        ///
        /// ```ignore
        /// let config = StoreConfig::default()
        ///     .with_shutdown_timeout(Duration::from_secs(60));
        ///
        /// let store = Store::with_config(
        ///     MyState::default(),
        ///     MyReducer,
        ///     my_environment,
        ///     config,
        /// );
        /// ```
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let runtime = config
                .runtime
                .clone()
                .or_else(|| tokio::runtime::Handle::try_current().ok());

            Self {
                inner: Arc::new(StoreInner {
                    state: RwLock::new(initial_state),
                    reducer,
                    environment,
                    config,
                    runtime,
                    mailbox: Mutex::new(VecDeque::new()),
                    drain_lock: Mutex::new(()),
                    drainer: Mutex::new(None),
                    observers: ObserverRegistry::new(),
                    tasks: Mutex::new(HashMap::new()),
                    next_task_id: AtomicU64::new(0),
                    pending: Arc::new(PendingCounter::new()),
                    shutdown: AtomicBool::new(false),
                }),
            }
        }

        /// Send an action to the store
        ///
        /// 1. Queues the action
        /// 2. Reduces it under the state write lock
        /// 3. Publishes the new state to observers
        /// 4. Starts the returned effects; synchronous ones are delivered in
        ///    the same drain, the rest are spawned
        ///
        /// # Returns
        ///
        /// An [`EffectHandle`] tracking the reduction, its effects and the
        /// reductions of the actions they deliver.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        ///
        /// # Panics
        ///
        /// If the reducer panics, the panic propagates to the caller.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            self.send_with_mode(action, TrackingMode::Direct)
        }

        /// Send an action, tracking effects transitively
        ///
        /// The returned handle settles only when the whole effect tree rooted
        /// at this action has finished.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send_cascading")]
        pub fn send_cascading(&self, action: A) -> Result<EffectHandle, StoreError> {
            self.send_with_mode(action, TrackingMode::Cascading)
        }

        fn send_with_mode(
            &self,
            action: A,
            mode: TrackingMode,
        ) -> Result<EffectHandle, StoreError> {
            if self.inner.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new(mode);
            self.inner.enqueue(action, &tracking, tracking.clone());
            self.inner.drain();

            Ok(handle)
        }

        /// Send an action and keep observing state while `predicate` holds
        ///
        /// The observer is registered before the action is sent and detaches
        /// on the first published state for which `predicate` returns
        /// `false`. It never outlives the store.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        ///
        /// # Example
        ///
        /// ```ignore
        /// let observation = store.send_while(Action::PullToRefresh, |s| s.is_refreshing)?;
        /// observation.finished().await;
        /// ```
        pub fn send_while<P>(
            &self,
            action: A,
            mut predicate: P,
        ) -> Result<WhileObservation, StoreError>
        where
            P: FnMut(&S) -> bool + Send + 'static,
        {
            let (active_tx, active) = watch::channel(true);
            let detacher = self.inner.observers.register(Box::new(move |state| {
                if predicate(state) {
                    ControlFlow::Continue(())
                } else {
                    active_tx.send_replace(false);
                    ControlFlow::Break(())
                }
            }));

            match self.send(action) {
                Ok(_) => Ok(WhileObservation { detacher, active }),
                Err(error) => {
                    detacher.detach();
                    Err(error)
                },
            }
        }

        /// Observe every state published after a reduction
        ///
        /// Return [`ControlFlow::Break`] from the callback to detach it.
        /// Callbacks run on the thread draining the mailbox, after the state
        /// write lock is released and before the reduction's effects start.
        pub fn observe<F>(&self, callback: F) -> Subscription
        where
            F: FnMut(&S) -> ControlFlow<()> + Send + 'static,
        {
            Subscription::new(self.inner.observers.register(Box::new(callback)))
        }

        /// Build an observer from the current state and register it, with no
        /// reduction able to slip in between.
        pub(crate) fn observe_with<F, T, M>(&self, make: M) -> (T, Subscription)
        where
            M: FnOnce(&S) -> (T, F),
            F: FnMut(&S) -> ControlFlow<()> + Send + 'static,
        {
            let state = self.inner.read_state();
            let (value, callback) = make(&state);
            let subscription = Subscription::new(self.inner.observers.register(Box::new(callback)));
            (value, subscription)
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.count);
        /// ```
        ///
        /// Do not call `send` from inside the closure.
        pub fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            f(&self.inner.read_state())
        }

        /// Clone the current state
        #[must_use]
        pub fn snapshot(&self) -> S
        where
            S: Clone,
        {
            self.state(S::clone)
        }

        /// Number of effect tasks currently running
        #[must_use]
        pub fn running_effects(&self) -> usize {
            self.inner.lock_tasks().len()
        }

        /// Wait until the mailbox is empty and no effect is running
        pub async fn settled(&self) {
            self.inner.pending.wait_idle().await;
        }

        /// Cancel every running effect
        ///
        /// Cancelled effects deliver nothing further.
        pub fn cancel_effects(&self) {
            let cancelled = self.inner.abort_all();
            tracing::debug!(cancelled, "Cancelled running effects");
        }

        /// Initiate graceful shutdown of the store
        ///
        /// This method:
        /// 1. Sets the shutdown flag (rejecting new actions from `send`)
        /// 2. Waits for queued actions and running effects to finish
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before
        /// all pending work completes.
        ///
        /// # Example
        ///
        /// ```ignore
        /// store.shutdown(Duration::from_secs(30)).await?;
        /// ```
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.inner.shutdown.store(true, Ordering::Release);

            if tokio::time::timeout(timeout, self.settled()).await.is_ok() {
                tracing::info!("All effects completed, shutdown successful");
                metrics::counter!("store.shutdown.completed").increment(1);
                Ok(())
            } else {
                let pending = self.inner.pending.load();
                tracing::error!(
                    pending_effects = pending,
                    "Shutdown timeout: {pending} effects still running"
                );
                metrics::counter!("store.shutdown.timeout").increment(1);
                Err(StoreError::ShutdownTimeout(pending))
            }
        }

        /// Shut down using [`StoreConfig::default_shutdown_timeout`]
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if pending work does not finish in time.
        pub async fn shutdown_default(&self) -> Result<(), StoreError> {
            self.shutdown(self.inner.config.default_shutdown_timeout).await
        }

        /// Returns `true` once shutdown has been initiated
        #[must_use]
        pub fn is_shutting_down(&self) -> bool {
            self.inner.shutdown.load(Ordering::Acquire)
        }
    }

    impl<S, A, E, R> StoreInner<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        fn read_state(&self) -> std::sync::RwLockReadGuard<'_, S> {
            self.state.read().unwrap_or_else(PoisonError::into_inner)
        }

        fn lock_tasks(&self) -> std::sync::MutexGuard<'_, HashMap<u64, AbortHandle>> {
            self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn abort_all(&self) -> usize {
            let tasks: Vec<_> = self.lock_tasks().drain().collect();
            for (_, task) in &tasks {
                task.abort();
            }
            tasks.len()
        }

        fn enqueue(&self, action: A, reduction: &EffectTracking, effects: EffectTracking) {
            let envelope = Envelope {
                action,
                reduction: reduction.begin(),
                effects,
                _pending: self.pending.enter(),
            };

            let mut mailbox = self.mailbox.lock().unwrap_or_else(PoisonError::into_inner);
            mailbox.push_back(envelope);
            let depth = mailbox.len();
            drop(mailbox);

            if depth > self.config.mailbox_warn_depth {
                tracing::warn!(depth, "Store mailbox is backing up");
            }
        }

        fn is_draining_here(&self) -> bool {
            let drainer = self.drainer.lock().unwrap_or_else(PoisonError::into_inner);
            *drainer == Some(thread::current().id())
        }

        /// Reduce queued actions until the mailbox is empty.
        ///
        /// Re-entrant calls return immediately; the outer drain picks up
        /// whatever they queued.
        fn drain(self: &Arc<Self>) {
            if self.is_draining_here() {
                tracing::trace!("Re-entrant send queued behind current action");
                return;
            }

            let _exclusive = self.drain_lock.lock().unwrap_or_else(PoisonError::into_inner);
            let _owner = DrainOwner::claim(&self.drainer);

            loop {
                let next = self
                    .mailbox
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pop_front();
                let Some(envelope) = next else {
                    break;
                };
                self.process(envelope);
            }
        }

        fn process(self: &Arc<Self>, envelope: Envelope<A>) {
            let Envelope {
                action,
                reduction,
                effects: tracking,
                _pending,
            } = envelope;

            let effects = {
                let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
                tracing::trace!("Acquired write lock on state");

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());

                // Note: Precision loss acceptable for metrics (effect counts < 2^52)
                #[allow(clippy::cast_precision_loss)]
                metrics::histogram!("store.effects.count").record(effects.len() as f64);

                effects
            };

            self.observers.notify(&self.read_state());

            for effect in effects {
                self.start_effect(effect, &tracking);
            }

            // Released last so effect work is counted before the reduction is
            drop(reduction);
        }

        fn start_effect(self: &Arc<Self>, effect: Effect<A>, tracking: &EffectTracking) {
            if effect.is_none() {
                metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                return;
            }

            let effect = match effect.try_into_actions() {
                Ok(actions) => {
                    metrics::counter!("store.effects.executed", "type" => "sync").increment(1);
                    for action in actions {
                        let (reduction, effects) = tracking.feedback();
                        self.enqueue(action, &reduction, effects);
                    }
                    return;
                },
                Err(effect) => effect,
            };

            match effect {
                Effect::Parallel(effects) => {
                    tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    for effect in effects {
                        self.start_effect(effect, tracking);
                    }
                },
                effect => self.spawn_effect(effect, tracking),
            }
        }

        fn spawn_effect(self: &Arc<Self>, effect: Effect<A>, tracking: &EffectTracking) {
            let kind = match &effect {
                Effect::Delay { .. } => "delay",
                Effect::Task { .. } => "task",
                _ => "sequential",
            };

            let Some(runtime) = self
                .runtime
                .clone()
                .or_else(|| tokio::runtime::Handle::try_current().ok())
            else {
                tracing::error!(kind, "No tokio runtime available, effect dropped");
                metrics::counter!("store.effects.dropped").increment(1);
                return;
            };

            metrics::counter!("store.effects.spawned", "type" => kind).increment(1);

            let id = self.next_task_id.fetch_add(1, Ordering::Relaxed);
            let store = Arc::downgrade(self);
            let guard = tracking.begin();
            let pending = self.pending.enter();
            let tracking = tracking.clone();

            let work = async move {
                let _guard = guard;
                let _pending = pending;
                let _registration = TaskRegistration {
                    store: store.clone(),
                    id,
                };

                let mut actions = into_stream(effect);
                while let Some(action) = actions.next().await {
                    let Some(inner) = store.upgrade() else {
                        tracing::trace!("Store dropped, discarding effect output");
                        break;
                    };
                    let (reduction, effects) = tracking.feedback();
                    inner.enqueue(action, &reduction, effects);
                    inner.drain();
                }
            };

            // Held across spawn so the task cannot deregister before it is registered
            let mut tasks = self.lock_tasks();
            let task = runtime.spawn(work.instrument(tracing::debug_span!("effect", kind)));
            tasks.insert(id, task.abort_handle());
        }
    }

    impl<S, A, E, R> Drop for StoreInner<S, A, E, R> {
        fn drop(&mut self) {
            let tasks = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
            for (_, task) in tasks.drain() {
                task.abort();
            }
        }
    }

    /// Removes a finished effect task from its store's registry
    struct TaskRegistration<S, A, E, R> {
        store: Weak<StoreInner<S, A, E, R>>,
        id: u64,
    }

    impl<S, A, E, R> Drop for TaskRegistration<S, A, E, R> {
        fn drop(&mut self) {
            if let Some(store) = self.store.upgrade() {
                store
                    .tasks
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&self.id);
            }
        }
    }

    /// Marks the current thread as the mailbox drainer until dropped
    struct DrainOwner<'a>(&'a Mutex<Option<ThreadId>>);

    impl<'a> DrainOwner<'a> {
        fn claim(slot: &'a Mutex<Option<ThreadId>>) -> Self {
            *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(thread::current().id());
            Self(slot)
        }
    }

    impl Drop for DrainOwner<'_> {
        fn drop(&mut self) {
            *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
        }
    }

    /// Observation started by [`Store::send_while`]
    ///
    /// Dropping it does not stop the observation; call
    /// [`WhileObservation::cancel`] for that.
    pub struct WhileObservation {
        detacher: Detacher,
        active: watch::Receiver<bool>,
    }

    impl WhileObservation {
        /// Stop observing now
        pub fn cancel(&self) {
            self.detacher.detach();
        }

        /// Returns `true` while the predicate has held for every published state
        #[must_use]
        pub fn is_active(&self) -> bool {
            *self.active.borrow() && self.active.has_changed().is_ok()
        }

        /// Wait until the predicate fails, the observation is cancelled or the
        /// store is dropped
        pub async fn finished(&self) {
            let mut active = self.active.clone();
            let _ = active.wait_for(|active| !*active).await;
        }
    }

    impl std::fmt::Debug for WhileObservation {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("WhileObservation")
                .field("active", &self.is_active())
                .finish_non_exhaustive()
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }
}

// Re-export for convenience
pub use store::{Store, WhileObservation};
