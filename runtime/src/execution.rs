//! Effect execution
//!
//! Turns an [`Effect`] description into a stream of actions and drives it on
//! the tokio runtime. The [`Store`](crate::Store) uses [`into_stream`] for every
//! effect that cannot be delivered synchronously; [`EffectExt::run`] exposes the
//! same machinery for running an effect outside a store.

use crate::StoreError;
use boardflow_core::effect::{Effect, Operation, TaskPriority};
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::Instrument;

/// Convert an effect into the stream of actions it delivers.
///
/// - `Parallel` children are polled concurrently (`select_all`)
/// - `Sequential` children are flattened in order, each one exhausted before
///   the next is started
/// - `Task` operations are spawned onto the runtime so that independent tasks
///   make progress in parallel; dropping the stream aborts them
///
/// Must be polled from within a tokio runtime when the effect contains a task
/// or a delay.
pub fn into_stream<A>(effect: Effect<A>) -> BoxStream<'static, A>
where
    A: Send + 'static,
{
    match effect {
        Effect::None => stream::empty().boxed(),
        Effect::Send(action) => stream::once(futures::future::ready(action)).boxed(),
        Effect::Sequence(actions) => stream::iter(actions).boxed(),
        Effect::Parallel(effects) => {
            stream::select_all(effects.into_iter().map(into_stream)).boxed()
        },
        Effect::Sequential(effects) => stream::iter(effects).flat_map(into_stream).boxed(),
        Effect::Delay { duration, action } => stream::once(async move {
            tokio::time::sleep(duration).await;
            tracing::trace!(?duration, "Effect::Delay elapsed");
            *action
        })
        .boxed(),
        Effect::Task {
            priority,
            operation,
        } => stream::once(run_task(priority, operation))
            .filter_map(futures::future::ready)
            .boxed(),
    }
}

/// Aborts the wrapped task when dropped.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn run_task<A>(priority: TaskPriority, operation: Operation<A>) -> Option<A>
where
    A: Send + 'static,
{
    if priority == TaskPriority::Background {
        tokio::task::yield_now().await;
    }

    metrics::counter!("store.effects.executed", "type" => "task", "priority" => priority.as_str())
        .increment(1);
    let span = tracing::debug_span!("effect_task", priority = priority.as_str());
    let mut task = AbortOnDrop(tokio::spawn(operation.instrument(span)));

    match (&mut task.0).await {
        Ok(action) => Some(action),
        Err(error) if error.is_panic() => {
            tracing::error!(error = %error, "Effect task panicked, no action delivered");
            metrics::counter!("store.effects.panicked").increment(1);
            None
        },
        Err(_) => {
            tracing::trace!("Effect task cancelled");
            None
        },
    }
}

/// Handle to an effect started with [`EffectExt::run`].
///
/// Cancelling stops further delivery and aborts in-flight operations. It is
/// idempotent and safe to call after the effect finished.
#[derive(Debug, Clone)]
pub struct EffectTask {
    abort: Option<AbortHandle>,
    done: watch::Receiver<bool>,
}

impl EffectTask {
    fn finished() -> Self {
        let (_, done) = watch::channel(true);
        Self { abort: None, done }
    }

    /// Stop delivering actions
    pub fn cancel(&self) {
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    /// Returns `true` once the effect delivered everything or was cancelled
    #[must_use]
    pub fn is_finished(&self) -> bool {
        *self.done.borrow() || self.abort.as_ref().is_none_or(AbortHandle::is_finished)
    }

    /// Wait until the effect has finished or been cancelled
    pub async fn completed(&self) {
        let mut done = self.done.clone();
        // A closed channel means the driver was dropped, i.e. cancelled.
        let _ = done.wait_for(|finished| *finished).await;
    }
}

/// Running effects outside a [`Store`](crate::Store).
pub trait EffectExt<A> {
    /// Execute the effect, delivering each produced action to `callback`.
    ///
    /// Effects without tasks or delays deliver every action before this
    /// returns. Anything else is driven by a spawned tokio task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoRuntime`] if the effect needs to suspend and no
    /// tokio runtime is available on the calling thread.
    fn run<F>(self, callback: F) -> Result<EffectTask, StoreError>
    where
        F: FnMut(A) + Send + 'static;
}

impl<A> EffectExt<A> for Effect<A>
where
    A: Send + 'static,
{
    fn run<F>(self, mut callback: F) -> Result<EffectTask, StoreError>
    where
        F: FnMut(A) + Send + 'static,
    {
        let effect = match self.try_into_actions() {
            Ok(actions) => {
                actions.into_iter().for_each(&mut callback);
                return Ok(EffectTask::finished());
            },
            Err(effect) => effect,
        };

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| StoreError::NoRuntime)?;
        let (done_tx, done) = watch::channel(false);

        let driver = runtime.spawn(
            async move {
                let mut actions = into_stream(effect);
                while let Some(action) = actions.next().await {
                    callback(action);
                }
                done_tx.send_replace(true);
            }
            .instrument(tracing::debug_span!("effect_run")),
        );

        Ok(EffectTask {
            abort: Some(driver.abort_handle()),
            done,
        })
    }
}
