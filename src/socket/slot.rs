//! The connection slot.
//!
//! A host has one global callback surface, so exactly one socket may own it
//! at a time. The slot records which one. Host callbacks compare their own
//! socket's ID with the slot before acting; a mismatch means the callback is
//! stale and is dropped.
//!
//! The slot holds a [`Weak`] reference: it names the current socket but does
//! not keep it alive.

// ============================================================================
// Imports
// ============================================================================

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::identifiers::ConnectionId;

// ============================================================================
// ConnectionSlot
// ============================================================================

/// Holds the identity of the current socket, if any.
pub(crate) struct ConnectionSlot<T> {
    current: Mutex<Option<(ConnectionId, Weak<T>)>>,
}

impl<T> Default for ConnectionSlot<T> {
    fn default() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }
}

impl<T> ConnectionSlot<T> {
    /// Returns the current occupant if it is still alive.
    pub(crate) fn occupant(&self) -> Option<Arc<T>> {
        self.current
            .lock()
            .as_ref()
            .and_then(|(_, weak)| weak.upgrade())
    }

    /// Returns the ID of the current occupant.
    pub(crate) fn current_id(&self) -> Option<ConnectionId> {
        self.current.lock().as_ref().map(|(id, _)| *id)
    }

    /// Returns `true` if `id` is the current occupant.
    pub(crate) fn is_current(&self, id: ConnectionId) -> bool {
        self.current_id() == Some(id)
    }

    /// Makes `id` the current occupant. Returns the replaced ID.
    pub(crate) fn install(&self, id: ConnectionId, occupant: Weak<T>) -> Option<ConnectionId> {
        self.current
            .lock()
            .replace((id, occupant))
            .map(|(previous, _)| previous)
    }

    /// Empties the slot if `id` is the current occupant.
    ///
    /// Returns `false` and leaves the slot alone otherwise.
    pub(crate) fn clear_if(&self, id: ConnectionId) -> bool {
        let mut current = self.current.lock();
        match current.as_ref() {
            Some((current_id, _)) if *current_id == id => {
                *current = None;
                true
            }
            _ => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
