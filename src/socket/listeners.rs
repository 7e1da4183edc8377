//! Listener registry.
//!
//! Maps each [`EventKind`] to an ordered list of callbacks. Dispatch takes a
//! snapshot of the list and releases the lock before invoking anything, so a
//! listener may add or remove listeners, or open a new socket, while it
//! runs. Changes made during a dispatch apply from the next dispatch on.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::identifiers::ListenerId;
use crate::protocol::{EventKind, SocketEvent};

// ============================================================================
// Types
// ============================================================================

/// Event listener callback.
pub type Listener = Arc<dyn Fn(&SocketEvent) + Send + Sync>;

/// Listeners of one kind, in insertion order.
type ListenerList = Vec<(ListenerId, Listener)>;

// ============================================================================
// ListenerRegistry
// ============================================================================

/// Per-socket listener storage.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    listeners: Mutex<FxHashMap<EventKind, ListenerList>>,
}

impl ListenerRegistry {
    /// Appends a listener for `kind`.
    pub(crate) fn add(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId::next();
        self.listeners
            .lock()
            .entry(kind)
            .or_default()
            .push((id, listener));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub(crate) fn remove(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(list) = listeners.get_mut(&kind) else {
            return false;
        };

        let before = list.len();
        list.retain(|(listener_id, _)| *listener_id != id);
        before != list.len()
    }

    /// Returns the number of listeners for `kind`.
    pub(crate) fn count(&self, kind: EventKind) -> usize {
        self.listeners.lock().get(&kind).map_or(0, Vec::len)
    }

    /// Invokes every listener for the event's kind, in order.
    ///
    /// Returns the number of listeners invoked.
    pub(crate) fn dispatch(&self, event: &SocketEvent) -> usize {
        let snapshot: Vec<Listener> = self
            .listeners
            .lock()
            .get(&event.kind())
            .map(|list| list.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();

        for listener in &snapshot {
            listener(event);
        }

        snapshot.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
