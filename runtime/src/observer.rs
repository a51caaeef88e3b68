//! Synchronous state observers
//!
//! Observers are called with the freshly reduced state after every reduction,
//! before that reduction's effects start. Registration hands back a
//! [`Subscription`] that detaches the observer when dropped.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

type Callback<S> = Box<dyn FnMut(&S) -> ControlFlow<()> + Send>;

struct Entry<S> {
    id: u64,
    // Cleared by the detacher; checked before every call
    alive: Arc<AtomicBool>,
    callback: Callback<S>,
}

impl<S> Entry<S> {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

struct Registry<S> {
    next_id: u64,
    entries: Vec<Entry<S>>,
}

/// A list of observers shared between a store and its subscriptions.
pub(crate) struct ObserverRegistry<S> {
    inner: Arc<Mutex<Registry<S>>>,
}

impl<S> Clone for ObserverRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: 'static> ObserverRegistry<S> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a callback, returning a handle able to remove it again.
    pub(crate) fn register(&self, callback: Callback<S>) -> Detacher {
        let alive = Arc::new(AtomicBool::new(true));

        let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push(Entry {
            id,
            alive: Arc::clone(&alive),
            callback,
        });
        drop(registry);

        let weak: Weak<Mutex<Registry<S>>> = Arc::downgrade(&self.inner);
        Detacher {
            detach: Box::new(move || {
                alive.store(false, Ordering::Release);
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                // While a notification pass holds the entries, the cleared
                // flag alone keeps the callback from running again
                let mut registry = inner.lock().unwrap_or_else(PoisonError::into_inner);
                registry.entries.retain(|entry| entry.id != id);
            }),
        }
    }

    /// Call every live observer with `state`, dropping those that break.
    ///
    /// Callbacks run without the registry lock held, so they may register or
    /// detach observers (including themselves). An observer detached earlier
    /// in the same pass is skipped.
    pub(crate) fn notify(&self, state: &S) {
        let mut active = {
            let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut registry.entries)
        };

        for entry in &mut active {
            if entry.is_alive() && (entry.callback)(state).is_break() {
                entry.alive.store(false, Ordering::Release);
            }
        }

        let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let added = std::mem::replace(&mut registry.entries, active);
        registry.entries.extend(added);
        registry.entries.retain(Entry::is_alive);
    }

    pub(crate) fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }
}

/// Removes one observer from its registry. Safe to call repeatedly and after
/// the registry is gone.
pub(crate) struct Detacher {
    detach: Box<dyn Fn() + Send + Sync>,
}

impl Detacher {
    pub(crate) fn detach(&self) {
        (self.detach)();
    }
}

/// Keeps an observer attached for as long as it is alive.
///
/// Dropping the subscription detaches the observer. Detaching an observer
/// whose store is already gone is a no-op.
#[must_use = "dropping a Subscription detaches the observer immediately"]
pub struct Subscription {
    detacher: Option<Detacher>,
}

impl Subscription {
    pub(crate) const fn new(detacher: Detacher) -> Self {
        Self {
            detacher: Some(detacher),
        }
    }

    /// Detach now instead of on drop
    pub fn cancel(mut self) {
        if let Some(detacher) = self.detacher.take() {
            detacher.detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detacher) = self.detacher.take() {
            detacher.detach();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.detacher.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting(hits: &Arc<AtomicUsize>) -> Callback<i32> {
        let hits = Arc::clone(hits);
        Box::new(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        })
    }

    #[test]
    fn subscription_drop_detaches() {
        let registry = ObserverRegistry::<i32>::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let subscription = Subscription::new(registry.register(counting(&hits)));
        registry.notify(&1);
        drop(subscription);
        registry.notify(&2);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn break_detaches_self() {
        let registry = ObserverRegistry::<i32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let _detacher = registry.register(Box::new(move |state| {
            if let Ok(mut seen) = sink.lock() {
                seen.push(*state);
            }
            if *state < 2 {
                ControlFlow::Continue(())
            } else {
                ControlFlow::Break(())
            }
        }));

        for state in 0..5 {
            registry.notify(&state);
        }

        let seen = seen.lock().map(|s| s.clone()).unwrap_or_default();
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn observer_detached_mid_pass_is_not_called() {
        let registry = ObserverRegistry::<i32>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let victim = Arc::new(Mutex::new(None::<Subscription>));

        let slot = Arc::clone(&victim);
        let _killer = registry.register(Box::new(move |_| {
            if let Some(subscription) = slot.lock().ok().and_then(|mut slot| slot.take()) {
                drop(subscription);
            }
            ControlFlow::Continue(())
        }));
        let subscription = Subscription::new(registry.register(counting(&hits)));
        if let Ok(mut slot) = victim.lock() {
            *slot = Some(subscription);
        }

        registry.notify(&0);
        registry.notify(&1);

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn observer_registered_mid_pass_survives() {
        let registry = ObserverRegistry::<i32>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let kept = Arc::new(Mutex::new(Vec::<Detacher>::new()));

        let inner = registry.clone();
        let sink = Arc::clone(&kept);
        let counter = Arc::clone(&hits);
        let _spawner = registry.register(Box::new(move |_| {
            let detacher = inner.register(counting(&counter));
            if let Ok(mut kept) = sink.lock() {
                kept.push(detacher);
            }
            ControlFlow::Break(())
        }));

        registry.notify(&0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        registry.notify(&1);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn detach_after_registry_dropped_is_noop() {
        let registry = ObserverRegistry::<i32>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let subscription = Subscription::new(registry.register(counting(&hits)));
        drop(registry);
        drop(subscription);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
