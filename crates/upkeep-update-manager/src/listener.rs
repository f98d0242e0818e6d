//! Status change notification
//!
//! Listener registration survives concurrent dispatch: fan-out snapshots
//! the listener list before invoking anybody, so adding or removing a
//! listener while a notification is in flight neither panics nor drops
//! the in-flight dispatch. Callbacks may arrive on worker tasks;
//! consumers marshal to their own thread if they need to.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::status::{UpdateManagerStatus, UpdateStatus};

/// A single status transition on the per-component stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatusEvent {
    /// Name of the component the transition applies to
    pub component: String,

    /// The new status
    pub status: UpdateStatus,
}

/// Observer of per-component status transitions.
pub trait UpdateStatusListener: Send + Sync {
    /// Called for every status transition of every component.
    fn status_changed(&self, event: &UpdateStatusEvent);
}

/// Observer of aggregate manager status changes.
pub trait UpdateManagerListener: Send + Sync {
    /// Called when the aggregate status changes, once per change.
    fn manager_status_changed(&self, status: UpdateManagerStatus);
}

/// Opaque handle identifying a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registration-ordered listener list safe for concurrent mutation and
/// dispatch.
pub(crate) struct ListenerSet<L: ?Sized> {
    entries: RwLock<Vec<(ListenerId, Arc<L>)>>,
    next_id: AtomicU64,
}

impl<L: ?Sized> ListenerSet<L> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub(crate) fn add(&self, listener: Arc<L>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().push((id, listener));
        id
    }

    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<L>> {
        self.entries
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }
}

/// Fan-out point for the per-component status stream.
pub(crate) struct StatusFanout {
    listeners: ListenerSet<dyn UpdateStatusListener>,
}

impl StatusFanout {
    pub(crate) fn new() -> Self {
        Self {
            listeners: ListenerSet::new(),
        }
    }

    pub(crate) fn add(&self, listener: Arc<dyn UpdateStatusListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub(crate) fn fire(&self, component: &str, status: UpdateStatus) {
        let event = UpdateStatusEvent {
            component: component.to_string(),
            status,
        };
        tracing::trace!(component, status = ?status, "status transition");
        for listener in self.listeners.snapshot() {
            listener.status_changed(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Recorder {
        events: Mutex<Vec<UpdateStatusEvent>>,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(Vec::new()),
            })
        }
    }

    impl UpdateStatusListener for Recorder {
        fn status_changed(&self, event: &UpdateStatusEvent) {
            self.events.lock().push(event.clone());
        }
    }

    #[test]
    fn test_fire_reaches_all_listeners() {
        let fanout = StatusFanout::new();
        let first = Recorder::new();
        let second = Recorder::new();
        fanout.add(first.clone());
        fanout.add(second.clone());

        fanout.fire("plugin", UpdateStatus::Checking);

        assert_eq!(first.events.lock().len(), 1);
        assert_eq!(second.events.lock().len(), 1);
    }

    #[test]
    fn test_removed_listener_stops_receiving() {
        let fanout = StatusFanout::new();
        let recorder = Recorder::new();
        let id = fanout.add(recorder.clone());

        fanout.fire("plugin", UpdateStatus::Checking);
        assert!(fanout.remove(id));
        fanout.fire("plugin", UpdateStatus::Idle);

        assert_eq!(recorder.events.lock().len(), 1);
    }

    #[test]
    fn test_remove_unknown_id_is_false() {
        let fanout = StatusFanout::new();
        let recorder = Recorder::new();
        let id = fanout.add(recorder);
        assert!(fanout.remove(id));
        assert!(!fanout.remove(id));
    }
}
