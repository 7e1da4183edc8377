//! Scripted in-process host.
//!
//! [`MemoryHost`] performs no I/O. It records what the adapter asks of it
//! and lets the caller fire the global callbacks by hand, the way a platform
//! host would fire them from its own event loop.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use host_websocket::{MemoryHost, SocketHost};
//!
//! let host = Arc::new(MemoryHost::new());
//! let sockets = SocketHost::new(host.clone());
//!
//! let socket = sockets.open("wss://x", None)?;
//! host.emit_open();
//! socket.send("hi")?;
//! assert_eq!(host.sent_messages().len(), 1);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use crate::protocol::{
    ConnectRequest, HostCloseEvent, HostErrorEvent, HostMessageEvent, MessageData,
};

use super::{
    CloseHandler, ErrorHandler, FailureCallback, HostHandlers, HostTransport, MessageHandler,
    OpenHandler,
};

// ============================================================================
// MemoryHost
// ============================================================================

/// Host transport that records actions and replays scripted callbacks.
pub struct MemoryHost {
    /// Answer to the subprotocol capability query.
    supports_protocols: AtomicBool,
    /// Failure to report inline on the next connect.
    next_connect_failure: Mutex<Option<HostErrorEvent>>,
    /// Failure callback of the last connect that did not fail inline.
    pending_failure: Mutex<Option<FailureCallback>>,
    /// Registered global handlers.
    handlers: Mutex<HostHandlers>,
    /// Every connect request, in order.
    connects: Mutex<Vec<ConnectRequest>>,
    /// Every sent message, in order.
    sent: Mutex<Vec<MessageData>>,
    /// Number of close requests.
    close_requests: AtomicUsize,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MemoryHost - Constructors
// ============================================================================

impl MemoryHost {
    /// Creates a host that supports subprotocols.
    #[must_use]
    pub fn new() -> Self {
        Self {
            supports_protocols: AtomicBool::new(true),
            next_connect_failure: Mutex::new(None),
            pending_failure: Mutex::new(None),
            handlers: Mutex::new(HostHandlers::default()),
            connects: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            close_requests: AtomicUsize::new(0),
        }
    }

    /// Sets the answer to the subprotocol capability query.
    #[inline]
    #[must_use]
    pub fn with_protocol_support(self, supported: bool) -> Self {
        self.supports_protocols.store(supported, Ordering::Relaxed);
        self
    }
}

// ============================================================================
// MemoryHost - Scripting
// ============================================================================

impl MemoryHost {
    /// Makes the next `connect_socket` call fail inline with `event`.
    pub fn fail_next_connect(&self, event: HostErrorEvent) {
        *self.next_connect_failure.lock() = Some(event);
    }

    /// Reports a failure for the last connect attempt, after the fact.
    ///
    /// Returns `false` if there is no connect attempt left to fail.
    pub fn emit_connect_failure(&self, event: HostErrorEvent) -> bool {
        let callback = self.pending_failure.lock().take();
        match callback {
            Some(callback) => {
                callback(event);
                true
            }
            None => false,
        }
    }

    /// Fires the open callback. Returns `false` if none is registered.
    pub fn emit_open(&self) -> bool {
        let handler = self.handlers.lock().open.clone();
        trace!(registered = handler.is_some(), "MemoryHost emit open");
        handler.map(|handler| handler()).is_some()
    }

    /// Fires the error callback. Returns `false` if none is registered.
    pub fn emit_error(&self, event: HostErrorEvent) -> bool {
        let handler = self.handlers.lock().error.clone();
        trace!(registered = handler.is_some(), "MemoryHost emit error");
        handler.map(|handler| handler(event)).is_some()
    }

    /// Fires the message callback. Returns `false` if none is registered.
    pub fn emit_message(&self, event: HostMessageEvent) -> bool {
        let handler = self.handlers.lock().message.clone();
        trace!(registered = handler.is_some(), "MemoryHost emit message");
        handler.map(|handler| handler(event)).is_some()
    }

    /// Fires the close callback. Returns `false` if none is registered.
    pub fn emit_close(&self, event: HostCloseEvent) -> bool {
        let handler = self.handlers.lock().close.clone();
        trace!(registered = handler.is_some(), "MemoryHost emit close");
        handler.map(|handler| handler(event)).is_some()
    }
}

// ============================================================================
// MemoryHost - Inspection
// ============================================================================

impl MemoryHost {
    /// Returns every connect request received so far.
    #[must_use]
    pub fn connect_requests(&self) -> Vec<ConnectRequest> {
        self.connects.lock().clone()
    }

    /// Returns every message sent so far.
    #[must_use]
    pub fn sent_messages(&self) -> Vec<MessageData> {
        self.sent.lock().clone()
    }

    /// Returns how many times `close_socket` was called.
    #[inline]
    #[must_use]
    pub fn close_requests(&self) -> usize {
        self.close_requests.load(Ordering::Relaxed)
    }

    /// Returns `true` once all four callbacks are registered.
    #[must_use]
    pub fn has_handlers(&self) -> bool {
        let handlers = self.handlers.lock();
        handlers.open.is_some()
            && handlers.error.is_some()
            && handlers.message.is_some()
            && handlers.close.is_some()
    }

    /// Returns `true` if the host saw no action and no registration.
    #[must_use]
    pub fn is_untouched(&self) -> bool {
        let handlers = self.handlers.lock();
        handlers.open.is_none()
            && handlers.error.is_none()
            && handlers.message.is_none()
            && handlers.close.is_none()
            && self.connects.lock().is_empty()
            && self.sent.lock().is_empty()
            && self.close_requests() == 0
    }
}

// ============================================================================
// HostTransport Implementation
// ============================================================================

impl HostTransport for MemoryHost {
    fn supports_protocols(&self) -> bool {
        self.supports_protocols.load(Ordering::Relaxed)
    }

    fn connect_socket(&self, request: ConnectRequest, on_failure: FailureCallback) {
        trace!(url = %request.url, "MemoryHost connect");
        self.connects.lock().push(request);

        let failure = self.next_connect_failure.lock().take();
        match failure {
            Some(event) => on_failure(event),
            None => *self.pending_failure.lock() = Some(on_failure),
        }
    }

    fn send_socket_message(&self, data: MessageData) {
        trace!(kind = data.kind(), len = data.len(), "MemoryHost send");
        self.sent.lock().push(data);
    }

    fn close_socket(&self) {
        self.close_requests.fetch_add(1, Ordering::Relaxed);
    }

    fn on_socket_open(&self, handler: OpenHandler) {
        self.handlers.lock().open = Some(handler);
    }

    fn on_socket_error(&self, handler: ErrorHandler) {
        self.handlers.lock().error = Some(handler);
    }

    fn on_socket_message(&self, handler: MessageHandler) {
        self.handlers.lock().message = Some(handler);
    }

    fn on_socket_close(&self, handler: CloseHandler) {
        self.handlers.lock().close = Some(handler);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    #[test]
    fn test_new_host_is_untouched() {
        let host = MemoryHost::new();
        assert!(host.is_untouched());
        assert!(host.supports_protocols());
        assert!(!host.has_handlers());
    }

    #[test]
    fn test_protocol_support_toggle() {
        let host = MemoryHost::new().with_protocol_support(false);
        assert!(!host.supports_protocols());
    }

    #[test]
    fn test_emit_without_handler() {
        let host = MemoryHost::new();
        assert!(!host.emit_open());
        assert!(!host.emit_close(HostCloseEvent::new(1000, "", true)));
    }

    #[test]
    fn test_registration_replaces_handler() {
        let host = MemoryHost::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let first = Arc::clone(&hits);
        host.on_socket_open(Arc::new(move || {
            first.fetch_add(1, Ordering::SeqCst);
        }));
        let second = Arc::clone(&hits);
        host.on_socket_open(Arc::new(move || {
            second.fetch_add(10, Ordering::SeqCst);
        }));

        assert!(host.emit_open());
        assert_eq!(hits.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_inline_connect_failure() {
        let host = MemoryHost::new();
        host.fail_next_connect(HostErrorEvent::new("connectSocket:fail", "refused"));

        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        host.connect_socket(
            ConnectRequest::new("wss://x", ""),
            Box::new(move |event: HostErrorEvent| *sink.lock() = Some(event)),
        );

        assert_eq!(
            seen.lock().as_ref().map(|e| e.err_msg.clone()),
            Some("connectSocket:fail".to_string())
        );
        assert!(!host.emit_connect_failure(HostErrorEvent::default()));
    }

    #[test]
    fn test_later_connect_failure() {
        let host = MemoryHost::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&hits);
        host.connect_socket(
            ConnectRequest::new("wss://x", ""),
            Box::new(move |_: HostErrorEvent| {
                sink.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(host.emit_connect_failure(HostErrorEvent::new("late", "")));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!host.emit_connect_failure(HostErrorEvent::new("late", "")));
    }

    #[test]
    fn test_records_actions() {
        let host = MemoryHost::new();
        host.send_socket_message(MessageData::from("hi"));
        host.close_socket();

        assert_eq!(host.sent_messages(), vec![MessageData::from("hi")]);
        assert_eq!(host.close_requests(), 1);
        assert!(!host.is_untouched());
    }
}
