use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Handle returned by [`EventBus::subscribe`].
///
/// Ids are unique across all buses in the process, so a handle presented to
/// the wrong bus is simply unknown there.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(0);

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Subscribers<E> {
    entries: Vec<(SubscriptionId, Callback<E>)>,
}

/// Typed in-process publish/subscribe.
///
/// One bus carries one event type; owners expose it to consumers by reference
/// instead of through ambient globals.
///
/// Dispatch contract:
/// - Callbacks run synchronously on the publishing thread, in subscription order.
/// - The subscriber list is snapshotted before dispatch and the lock is released,
///   so callbacks may subscribe, unsubscribe or publish re-entrantly.
/// - A callback removed during a dispatch still receives that dispatch.
pub struct EventBus<E> {
    subscribers: Mutex<Subscribers<E>>,
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Subscribers {
                entries: Vec::new(),
            }),
        }
    }

    /// Registers `callback`. It is not invoked with any prior value.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .lock()
            .entries
            .push((id, Arc::new(callback)));
        id
    }

    /// Removes a subscription.
    ///
    /// Returns `false` if `id` was already removed or never issued by this bus.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.lock();
        let before = subs.entries.len();
        subs.entries.retain(|(sid, _)| *sid != id);
        subs.entries.len() != before
    }

    /// Delivers `event` to every current subscriber.
    ///
    /// Returns the number of callbacks invoked.
    pub fn publish(&self, event: &E) -> usize {
        let snapshot: Vec<Callback<E>> = self
            .subscribers
            .lock()
            .entries
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for cb in &snapshot {
            cb(event);
        }
        snapshot.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().entries.len()
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
