//! Per-frame focus evaluation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use runtime::{EventBus, SubscriptionId};
use scene::{CameraPose, EntityStore, FocusConfig, select_focus};
use tracing::trace;

use crate::store::{FocusOrigin, FocusStore};

/// Camera control mode, published by the external mode controller.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Free flight; the focus follows the camera.
    #[default]
    Flight,
    /// Orbiting a fixed focus; local selection is suspended.
    Orbit,
}

/// Drives the focus selector once per rendered frame.
pub struct FocusTracker {
    store: Arc<FocusStore>,
    config: FocusConfig,
    suspended: Arc<AtomicBool>,
    mode_subscription: Option<(Arc<EventBus<ViewMode>>, SubscriptionId)>,
}

impl FocusTracker {
    pub fn new(store: Arc<FocusStore>, config: FocusConfig) -> Self {
        Self {
            store,
            config,
            suspended: Arc::new(AtomicBool::new(false)),
            mode_subscription: None,
        }
    }

    pub fn config(&self) -> &FocusConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<FocusStore> {
        &self.store
    }

    /// Follows `modes` instead of polling a mode flag. Replaces any previous
    /// mode source.
    pub fn follow_view_mode(&mut self, modes: Arc<EventBus<ViewMode>>) {
        self.unfollow_view_mode();
        let suspended = Arc::clone(&self.suspended);
        let id = modes.subscribe(move |mode| {
            suspended.store(*mode == ViewMode::Orbit, Ordering::Release);
        });
        self.mode_subscription = Some((modes, id));
    }

    pub fn view_mode(&self) -> ViewMode {
        if self.suspended.load(Ordering::Acquire) {
            ViewMode::Orbit
        } else {
            ViewMode::Flight
        }
    }

    /// Evaluates one tick against the current entity snapshot.
    ///
    /// Returns `true` if the focus changed.
    pub fn report_local_focus_candidate(&self, pose: &CameraPose, entities: &EntityStore) -> bool {
        if self.suspended.load(Ordering::Acquire) {
            trace!("focus tick skipped: orbit mode");
            return false;
        }

        let previous = self.store.get_current();
        let next = select_focus(pose, entities.as_slice(), previous.as_ref(), &self.config);
        self.store.set_current(next, FocusOrigin::Local)
    }

    fn unfollow_view_mode(&mut self) {
        if let Some((modes, id)) = self.mode_subscription.take() {
            modes.unsubscribe(id);
        }
        self.suspended.store(false, Ordering::Release);
    }
}

impl Drop for FocusTracker {
    fn drop(&mut self) {
        self.unfollow_view_mode();
    }
}
