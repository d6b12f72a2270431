use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tutor_core::task::TaskSnapshot;

/// Callback invoked with the full registry snapshot after every change.
pub type TaskListener = Arc<dyn Fn(&TaskSnapshot) + Send + Sync>;

/// Registered listeners keyed by subscription id.
#[derive(Default)]
pub(crate) struct ListenerSet {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<u64, TaskListener>>,
}

impl ListenerSet {
    pub(crate) fn add(self: &Arc<Self>, listener: TaskListener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, listener);

        Subscription {
            id,
            set: Arc::downgrade(self),
        }
    }

    pub(crate) fn remove(&self, id: u64) -> bool {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// Calls every listener. The lock is released first, so listeners may
    /// subscribe, unsubscribe or query the registry from inside the callback.
    pub(crate) fn notify(&self, snapshot: &TaskSnapshot) {
        let listeners: Vec<TaskListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        for listener in listeners {
            listener(snapshot);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Handle returned by `add_listener`.
///
/// Dropping it keeps the listener registered; call [`Subscription::unsubscribe`]
/// to stop receiving snapshots.
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    id: u64,
    set: Weak<ListenerSet>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Deregisters the listener. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        self.set.upgrade().is_some_and(|set| set.remove(self.id))
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
