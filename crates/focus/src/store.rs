//! Process-wide focus state with change notification.
//!
//! A single `FocusStore` is created per session and handed to every consumer
//! (tracker, sync channel, UI surfaces) by `Arc`.

use std::collections::VecDeque;

use parking_lot::Mutex;
use runtime::{EventBus, SubscriptionId};
use scene::EntityRef;
use tracing::debug;

/// Who produced the current focus value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum FocusOrigin {
    /// The local focus selector.
    #[default]
    Local,
    /// An update received from the relay. Never re-broadcast.
    Remote,
}

/// Published once per actual focus change.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusChanged {
    pub focus: Option<EntityRef>,
    pub origin: FocusOrigin,
}

#[derive(Debug, Default)]
struct FocusState {
    current: Option<EntityRef>,
    origin: FocusOrigin,
    /// Committed changes not yet delivered, in commit order.
    undelivered: VecDeque<FocusChanged>,
    /// Set while some caller is delivering `undelivered`.
    dispatching: bool,
}

/// Current focus plus its notification bus.
///
/// Invariants:
/// - Changes are detected by id only; snapshots of the same id with other
///   positions or weights are the same focus and do not notify.
/// - Every subscriber sees changes in commit order, including changes made
///   from inside a callback or from another thread during delivery.
/// - No lock is held while subscribers run; a subscriber may read, write or
///   (un)subscribe re-entrantly, and may wait on other writers.
#[derive(Debug, Default)]
pub struct FocusStore {
    state: Mutex<FocusState>,
    bus: EventBus<FocusChanged>,
}

/// Releases the dispatch role if a subscriber panics mid-delivery.
struct DispatchGuard<'a> {
    state: &'a Mutex<FocusState>,
    armed: bool,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.lock().dispatching = false;
        }
    }
}

impl FocusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_current(&self) -> Option<EntityRef> {
        self.state.lock().current.clone()
    }

    /// Origin of the current value (`Local` while nothing has been set).
    pub fn origin(&self) -> FocusOrigin {
        self.state.lock().origin
    }

    /// Single update entry point.
    ///
    /// Returns `true` if the focus changed. The change is committed before
    /// this returns; if another caller is already delivering notifications
    /// (an enclosing callback, or another thread), that caller delivers this
    /// change after the ones committed before it.
    pub fn set_current(&self, focus: Option<EntityRef>, origin: FocusOrigin) -> bool {
        {
            let mut state = self.state.lock();
            let unchanged = match (&state.current, &focus) {
                (None, None) => true,
                (Some(a), Some(b)) => a.same_focus(b),
                _ => false,
            };
            if unchanged {
                return false;
            }
            match &focus {
                Some(r) => debug!("focus -> {} ({:?})", r.id, origin),
                None => debug!("focus cleared ({:?})", origin),
            }
            state.current = focus.clone();
            state.origin = origin;
            state.undelivered.push_back(FocusChanged { focus, origin });
            if state.dispatching {
                return true;
            }
            state.dispatching = true;
        }

        let mut guard = DispatchGuard {
            state: &self.state,
            armed: true,
        };
        loop {
            let event = {
                let mut state = self.state.lock();
                match state.undelivered.pop_front() {
                    Some(event) => event,
                    None => {
                        // Same critical section as the emptiness check, so a
                        // concurrent writer either sees us dispatching and
                        // gets drained, or takes over the role.
                        state.dispatching = false;
                        guard.armed = false;
                        break;
                    }
                }
            };
            self.bus.publish(&event);
        }
        true
    }

    /// Registers `callback` for future changes. Call [`Self::get_current`]
    /// first to render the value present at mount time.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&FocusChanged) + Send + Sync + 'static,
    {
        self.bus.subscribe(callback)
    }

    /// Idempotent; unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }
}
