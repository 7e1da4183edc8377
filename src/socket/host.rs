//! Socket factory bound to one host transport.
//!
//! [`SocketHost`] owns a [`HostTransport`] and the connection slot for it.
//! Every [`SocketHost::open`] call supersedes the previous socket:
//!
//! 1. The previous occupant receives a `close` event (state untouched)
//! 2. The new socket is installed in the slot
//! 3. Fresh global handlers are registered with the host
//! 4. The host starts connecting
//!
//! Handlers carry the identity of the socket they were registered for and
//! drop any callback once that socket has left the slot.
//!
//! # Scheduling
//!
//! Connect failures are never delivered inside `open`. On a tokio runtime
//! they are spawned onto a later turn, so code running right after `open`
//! returns can still attach listeners. The guarantee holds on a
//! current-thread runtime (or a `LocalSet`), which matches the single event
//! loop the host API assumes.
//!
//! Without a runtime the failure is parked on the host and delivered on the
//! next entry into the adapter: the next host callback, the next `open`, or
//! an explicit [`SocketHost::run_deferred`].

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{
    CloseEvent, ConnectRequest, ErrorEvent, HostCloseEvent, HostErrorEvent, HostMessageEvent,
    MessageEvent, SocketEvent,
};
use crate::transport::{FailureCallback, HostTransport};

use super::options::SocketOptions;
use super::slot::ConnectionSlot;
use super::websocket::{SocketInner, WebSocket};

// ============================================================================
// HostInner
// ============================================================================

/// Shared state of a socket host.
pub(crate) struct HostInner {
    /// Platform transport.
    pub transport: Arc<dyn HostTransport>,
    /// The current socket.
    pub slot: ConnectionSlot<SocketInner>,
    /// Adapter configuration.
    pub options: SocketOptions,
    /// Connect failures waiting for delivery outside a runtime.
    pub deferred: Mutex<Vec<(Arc<SocketInner>, HostErrorEvent)>>,
}

impl HostInner {
    /// Delivers parked connect failures in arrival order.
    fn run_deferred(&self) -> usize {
        let pending = std::mem::take(&mut *self.deferred.lock());
        let count = pending.len();
        for (socket, event) in pending {
            handle_error(self, &socket, &event);
        }
        count
    }
}

// ============================================================================
// SocketHost
// ============================================================================

/// Opens sockets on a host transport, one current socket at a time.
///
/// Cloning is cheap; clones share the transport and the slot.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use host_websocket::{NativeHost, SocketHost};
///
/// let host = SocketHost::new(Arc::new(NativeHost::new()));
/// let socket = host.open("ws://127.0.0.1:9000", None)?;
/// ```
#[derive(Clone)]
pub struct SocketHost {
    inner: Arc<HostInner>,
}

impl fmt::Debug for SocketHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketHost")
            .field("current", &self.inner.slot.current_id())
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SocketHost - Constructors
// ============================================================================

impl SocketHost {
    /// Creates a host with default options.
    #[must_use]
    pub fn new(transport: Arc<dyn HostTransport>) -> Self {
        Self::with_options(transport, SocketOptions::default())
    }

    /// Creates a host with custom options.
    #[must_use]
    pub fn with_options(transport: Arc<dyn HostTransport>, options: SocketOptions) -> Self {
        Self {
            inner: Arc::new(HostInner {
                transport,
                slot: ConnectionSlot::default(),
                options,
                deferred: Mutex::new(Vec::new()),
            }),
        }
    }
}

// ============================================================================
// SocketHost - Public API
// ============================================================================

impl SocketHost {
    /// Returns the adapter options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &SocketOptions {
        &self.inner.options
    }

    /// Returns the socket currently owning the host's callbacks.
    #[must_use]
    pub fn current(&self) -> Option<WebSocket> {
        self.inner.slot.occupant().map(WebSocket::from_inner)
    }

    /// Delivers connect failures parked while no async runtime was running.
    ///
    /// Host callbacks and `open` do this on entry; call it directly when
    /// neither is expected soon. Returns the number of failures delivered.
    pub fn run_deferred(&self) -> usize {
        self.inner.run_deferred()
    }

    /// Opens a socket to `url`, optionally requesting a subprotocol.
    ///
    /// The returned socket is [`ReadyState::Connecting`](crate::ReadyState);
    /// an `open` event follows once the host reports success.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `url` is empty
    /// - [`Error::UnsupportedFeature`] if a subprotocol is requested and the
    ///   host cannot negotiate one
    ///
    /// Neither error touches the slot or the host.
    pub fn open(&self, url: &str, protocol: Option<&str>) -> Result<WebSocket> {
        if url.is_empty() {
            return Err(Error::invalid_argument(
                "failed to construct WebSocket: url required",
            ));
        }

        let protocol = protocol.unwrap_or_default();
        if !protocol.is_empty() && !self.inner.transport.supports_protocols() {
            return Err(Error::unsupported_feature(
                "subprotocol negotiation is not supported by this host",
            ));
        }

        self.inner.run_deferred();

        let socket = WebSocket::new(url, protocol, Arc::downgrade(&self.inner));

        if let Some(previous) = self.inner.slot.occupant() {
            if previous.claim_close() {
                debug!(previous = %previous.id, id = %socket.id(), "Superseding current socket");
                previous.dispatch(&SocketEvent::Close(CloseEvent::superseded()));
            } else {
                trace!(previous = %previous.id, "Superseded socket already received its close");
            }
        }

        self.inner
            .slot
            .install(socket.id(), Arc::downgrade(&socket.inner));

        self.register_handlers(&socket.inner);

        debug!(id = %socket.id(), url, protocol, "Connecting socket");

        let on_failure =
            Self::failure_callback(Arc::downgrade(&self.inner), Arc::clone(&socket.inner));
        self.inner
            .transport
            .connect_socket(ConnectRequest::new(url, protocol), on_failure);

        Ok(socket)
    }
}

// ============================================================================
// SocketHost - Callback Routing
// ============================================================================

impl SocketHost {
    /// Registers the four global handlers for `socket`.
    ///
    /// Handlers hold the socket strongly, the way the host's registration
    /// keeps it reachable, and the host weakly.
    fn register_handlers(&self, socket: &Arc<SocketInner>) {
        let transport = &self.inner.transport;

        let (host, inner) = (Arc::downgrade(&self.inner), Arc::clone(socket));
        transport.on_socket_open(Arc::new(move || {
            if let Some(host) = host.upgrade() {
                host.run_deferred();
            }
            if current_host(&host, &inner, "open").is_some() {
                handle_open(&inner);
            }
        }));

        let (host, inner) = (Arc::downgrade(&self.inner), Arc::clone(socket));
        transport.on_socket_error(Arc::new(move |event: HostErrorEvent| {
            if let Some(host) = host.upgrade() {
                host.run_deferred();
                handle_error(&host, &inner, &event);
            }
        }));

        let (host, inner) = (Arc::downgrade(&self.inner), Arc::clone(socket));
        transport.on_socket_message(Arc::new(move |event: HostMessageEvent| {
            if let Some(host) = host.upgrade() {
                host.run_deferred();
            }
            if current_host(&host, &inner, "message").is_some() {
                inner.dispatch(&SocketEvent::Message(MessageEvent::from(event)));
            }
        }));

        let (host, inner) = (Arc::downgrade(&self.inner), Arc::clone(socket));
        transport.on_socket_close(Arc::new(move |event: HostCloseEvent| {
            if let Some(host) = host.upgrade() {
                host.run_deferred();
            }
            if let Some(host) = current_host(&host, &inner, "close") {
                handle_close(&host, &inner, event);
            }
        }));
    }

    /// Wraps the error path so connect failures arrive on a later tick.
    fn failure_callback(host: Weak<HostInner>, socket: Arc<SocketInner>) -> FailureCallback {
        Box::new(move |event: HostErrorEvent| match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Some(host) = host.upgrade() {
                        handle_error(&host, &socket, &event);
                    }
                });
            }
            Err(_) => {
                let Some(host) = host.upgrade() else {
                    return;
                };
                warn!(id = %socket.id, "No async runtime, parking connect failure");
                host.deferred.lock().push((socket, event));
            }
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Returns the host if `socket` still owns the slot.
fn current_host(
    host: &Weak<HostInner>,
    socket: &SocketInner,
    callback: &'static str,
) -> Option<Arc<HostInner>> {
    let host = host.upgrade()?;
    if host.slot.is_current(socket.id) {
        Some(host)
    } else {
        trace!(id = %socket.id, callback, "Dropping stale host callback");
        None
    }
}

fn handle_open(socket: &SocketInner) {
    if !socket.state.open() {
        trace!(id = %socket.id, state = %socket.state.load(), "Open reported for a socket past connecting");
        return;
    }

    debug!(id = %socket.id, url = %socket.url, "Socket open");
    socket.dispatch(&SocketEvent::Open);
}

fn handle_error(host: &HostInner, socket: &SocketInner, event: &HostErrorEvent) {
    if host.options.error_filter.is_spurious(event) {
        trace!(id = %socket.id, err_msg = %event.err_msg, "Ignoring spurious host error");
        return;
    }

    if !host.slot.is_current(socket.id) {
        trace!(id = %socket.id, callback = "error", "Dropping stale host callback");
        return;
    }

    let previous = socket.state.close();
    debug!(id = %socket.id, %previous, message = %event.description(), "Socket error");
    socket.dispatch(&SocketEvent::Error(ErrorEvent::from(event)));
}

fn handle_close(host: &HostInner, socket: &SocketInner, event: HostCloseEvent) {
    socket.state.close();
    if !socket.claim_close() {
        trace!(id = %socket.id, "Close already delivered");
        host.slot.clear_if(socket.id);
        return;
    }

    debug!(
        id = %socket.id,
        code = event.code,
        reason = %event.reason,
        was_clean = event.was_clean,
        "Socket closed"
    );
    socket.dispatch(&SocketEvent::Close(CloseEvent::from(event)));

    if !host.slot.clear_if(socket.id) {
        trace!(id = %socket.id, "Slot already taken by a newer socket");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use proptest::prelude::*;
    use serde_json::json;

    use crate::identifiers::ConnectionId;
    use crate::protocol::{EventKind, MessageData};
    use crate::socket::{ErrorFilter, ReadyState};
    use crate::transport::MemoryHost;

    fn current_id(host: &SocketHost) -> Option<ConnectionId> {
        host.inner.slot.current_id()
    }

    fn setup() -> (Arc<MemoryHost>, SocketHost) {
        let transport = Arc::new(MemoryHost::new());
        let host = SocketHost::new(transport.clone());
        (transport, host)
    }

    /// Records the kind of every event plus the state seen by the listener.
    fn record(socket: &WebSocket) -> Arc<Mutex<Vec<(EventKind, ReadyState)>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        for kind in EventKind::ALL {
            let log = Arc::clone(&log);
            let observed = socket.clone();
            socket.add_event_listener(kind, move |event| {
                log.lock().push((event.kind(), observed.ready_state()));
            });
        }
        log
    }

    // ------------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------------

    #[test]
    fn test_empty_url_rejected_without_side_effects() {
        let (transport, host) = setup();
        let err = host.open("", None).unwrap_err();

        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert!(transport.is_untouched());
        assert!(current_id(&host).is_none());
    }

    #[test]
    fn test_empty_url_keeps_existing_occupant() {
        let (_transport, host) = setup();
        let first = host.open("wss://x", None).unwrap();
        let log = record(&first);

        assert!(host.open("", None).is_err());
        assert!(first.is_current());
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_unsupported_protocol_rejected() {
        let transport = Arc::new(MemoryHost::new().with_protocol_support(false));
        let host = SocketHost::new(transport.clone());

        let err = host.open("wss://x", Some("chat")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature { .. }));
        assert!(transport.is_untouched());
    }

    #[test]
    fn test_empty_protocol_needs_no_capability() {
        let transport = Arc::new(MemoryHost::new().with_protocol_support(false));
        let host = SocketHost::new(transport.clone());

        let socket = host.open("wss://x", Some("")).unwrap();
        assert_eq!(socket.protocol(), "");
        assert_eq!(transport.connect_requests()[0].protocols, Vec::<String>::new());
    }

    #[test]
    fn test_open_registers_and_connects() {
        let (transport, host) = setup();
        let socket = host.open("wss://x", Some("chat")).unwrap();

        assert_eq!(socket.ready_state(), ReadyState::Connecting);
        assert_eq!(socket.url(), "wss://x");
        assert_eq!(socket.protocol(), "chat");
        assert!(socket.is_current());
        assert!(transport.has_handlers());
        assert_eq!(
            transport.connect_requests(),
            vec![ConnectRequest::new("wss://x", "chat")]
        );
    }

    // ------------------------------------------------------------------------
    // Supersession
    // ------------------------------------------------------------------------

    #[test]
    fn test_new_socket_supersedes_previous() {
        let (transport, host) = setup();
        let first = host.open("wss://a", None).unwrap();
        transport.emit_open();
        let log = record(&first);

        let second = host.open("wss://b", None).unwrap();

        assert_eq!(*log.lock(), vec![(EventKind::Close, ReadyState::Open)]);
        assert_eq!(first.ready_state(), ReadyState::Open);
        assert!(!first.is_current());
        assert!(second.is_current());
    }

    #[test]
    fn test_superseded_close_has_no_code() {
        let (_transport, host) = setup();
        let first = host.open("wss://a", None).unwrap();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        first.on_close(move |event| *sink.lock() = Some(event.clone()));

        host.open("wss://b", None).unwrap();

        assert_eq!(*seen.lock(), Some(CloseEvent::superseded()));
    }

    #[test]
    fn test_callbacks_after_leaving_slot_ignored() {
        let (transport, host) = setup();
        let socket = host.open("wss://a", None).unwrap();
        transport.emit_open();
        transport.emit_close(HostCloseEvent::new(1000, "", true));
        assert!(host.current().is_none());

        // The host still holds this socket's handlers.
        let log = record(&socket);
        assert!(transport.emit_message(HostMessageEvent::new("late")));
        assert!(transport.emit_close(HostCloseEvent::new(1006, "", false)));
        assert!(transport.emit_error(HostErrorEvent::new("onSocketError", "reset")));
        assert!(transport.emit_open());

        assert!(log.lock().is_empty());
        assert_eq!(socket.ready_state(), ReadyState::Closed);
    }

    #[test]
    fn test_superseded_socket_stays_connecting() {
        let (transport, host) = setup();
        let first = host.open("wss://a", None).unwrap();
        let first_log = record(&first);
        let second = host.open("wss://b", None).unwrap();
        first_log.lock().clear();

        transport.emit_open();
        transport.emit_close(HostCloseEvent::new(1000, "", true));

        assert!(first_log.lock().is_empty());
        assert_eq!(first.ready_state(), ReadyState::Connecting);
        assert_eq!(second.ready_state(), ReadyState::Closed);
    }

    // ------------------------------------------------------------------------
    // Event Dispatch
    // ------------------------------------------------------------------------

    #[test]
    fn test_open_sets_state_before_dispatch() {
        let (transport, host) = setup();
        let socket = host.open("wss://x", None).unwrap();
        let log = record(&socket);

        transport.emit_open();

        assert_eq!(*log.lock(), vec![(EventKind::Open, ReadyState::Open)]);
    }

    #[test]
    fn test_open_after_error_is_dropped() {
        let (transport, host) = setup();
        let socket = host.open("wss://x", None).unwrap();
        transport.emit_error(HostErrorEvent::new("onSocketError", "reset"));
        let log = record(&socket);

        transport.emit_open();

        assert!(log.lock().is_empty());
        assert_eq!(socket.ready_state(), ReadyState::Closed);
    }

    #[test]
    fn test_message_passes_metadata_through() {
        let (transport, host) = setup();
        let socket = host.open("wss://x", None).unwrap();
        transport.emit_open();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        socket.on_message(move |event| sink.lock().push(event.clone()));

        let mut event = HostMessageEvent::new("pong").with_origin("wss://x");
        event.ports = vec![json!(7)];
        event.source = Some(json!({ "frame": 1 }));
        transport.emit_message(event);

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].data, MessageData::from("pong"));
        assert_eq!(seen[0].origin, "wss://x");
        assert_eq!(seen[0].ports, vec![json!(7)]);
        assert_eq!(seen[0].source, Some(json!({ "frame": 1 })));
        assert_eq!(socket.ready_state(), ReadyState::Open);
    }

    #[test]
    fn test_genuine_error_closes_and_dispatches() {
        let (transport, host) = setup();
        let socket = host.open("wss://x", None).unwrap();
        let log = record(&socket);
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&messages);
        socket.on_error(move |event| sink.lock().push(event.message.clone()));

        transport.emit_error(HostErrorEvent::new("onSocketError", "connection reset"));

        assert_eq!(*log.lock(), vec![(EventKind::Error, ReadyState::Closed)]);
        assert_eq!(*messages.lock(), vec!["onSocketError".to_string()]);
        assert!(socket.is_current());
    }

    #[test]
    fn test_spurious_error_ignored() {
        let (transport, host) = setup();
        let socket = host.open("wss://x", None).unwrap();
        transport.emit_open();
        let log = record(&socket);

        transport.emit_error(HostErrorEvent::new("onSocketError", ""));

        assert!(log.lock().is_empty());
        assert_eq!(socket.ready_state(), ReadyState::Open);
    }

    #[test]
    fn test_disabled_filter_surfaces_empty_message() {
        let transport = Arc::new(MemoryHost::new());
        let options = SocketOptions::new().with_error_filter(ErrorFilter::Disabled);
        let host = SocketHost::with_options(transport.clone(), options);
        let socket = host.open("wss://x", None).unwrap();
        let log = record(&socket);

        transport.emit_error(HostErrorEvent::new("onSocketError", ""));

        assert_eq!(*log.lock(), vec![(EventKind::Error, ReadyState::Closed)]);
    }

    #[test]
    fn test_close_sets_state_and_clears_slot() {
        let (transport, host) = setup();
        let socket = host.open("wss://x", None).unwrap();
        transport.emit_open();

        let slot_during_dispatch = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&slot_during_dispatch);
        let observed = socket.clone();
        socket.on_close(move |event| {
            *sink.lock() = Some((event.code, observed.ready_state(), observed.is_current()));
        });

        transport.emit_close(HostCloseEvent::new(1000, "", true));

        assert_eq!(
            *slot_during_dispatch.lock(),
            Some((Some(1000), ReadyState::Closed, true))
        );
        assert!(!socket.is_current());
        assert!(host.current().is_none());
    }

    #[test]
    fn test_reopen_from_close_listener() {
        let (transport, host) = setup();
        let first = host.open("wss://a", None).unwrap();
        transport.emit_open();

        let reopened = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&reopened);
        let factory = host.clone();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        first.on_close(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            *sink.lock() = factory.open("wss://b", None).ok();
        });

        transport.emit_close(HostCloseEvent::new(1001, "going away", true));

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        let second = reopened.lock().clone().expect("reopened socket");
        assert!(second.is_current());
        assert_eq!(host.current().map(|s| s.id()), Some(second.id()));
        assert_eq!(transport.connect_requests().len(), 2);
    }

    #[test]
    fn test_closed_socket_not_notified_again_on_reopen() {
        let (transport, host) = setup();
        let first = host.open("wss://a", None).unwrap();
        transport.emit_open();
        let log = record(&first);

        transport.emit_close(HostCloseEvent::new(1000, "", true));
        host.open("wss://b", None).unwrap();

        assert_eq!(*log.lock(), vec![(EventKind::Close, ReadyState::Closed)]);
    }

    // ------------------------------------------------------------------------
    // Send / Close
    // ------------------------------------------------------------------------

    #[test]
    fn test_send_requires_open() {
        let (transport, host) = setup();
        let socket = host.open("wss://x", None).unwrap();

        let err = socket.send("hi").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidState {
                state: ReadyState::Connecting
            }
        ));

        transport.emit_open();
        transport.emit_close(HostCloseEvent::new(1000, "", true));
        assert!(socket.send("hi").is_err());
        assert!(transport.sent_messages().is_empty());
    }

    #[test]
    fn test_send_rejects_non_text_value() {
        let (transport, host) = setup();
        let socket = host.open("wss://x", None).unwrap();
        transport.emit_open();

        let err = socket.send(json!(42)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert!(transport.sent_messages().is_empty());

        socket.send(json!("text")).unwrap();
        socket.send(vec![0u8, 1]).unwrap();
        assert_eq!(
            transport.sent_messages(),
            vec![MessageData::from("text"), MessageData::from(vec![0u8, 1])]
        );
    }

    #[test]
    fn test_state_checked_before_payload() {
        let (_transport, host) = setup();
        let socket = host.open("wss://x", None).unwrap();

        let err = socket.send(json!(null)).unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
    }

    #[test]
    fn test_close_forwards_without_state_change() {
        let (transport, host) = setup();
        let socket = host.open("wss://x", None).unwrap();
        transport.emit_open();

        socket.close();

        assert_eq!(transport.close_requests(), 1);
        assert_eq!(socket.ready_state(), ReadyState::Open);
        assert!(socket.is_current());
    }

    #[test]
    fn test_close_while_connecting_still_forwards() {
        let (transport, host) = setup();
        let socket = host.open("wss://x", None).unwrap();

        socket.close();

        assert_eq!(transport.close_requests(), 1);
        assert_eq!(socket.ready_state(), ReadyState::Connecting);
    }

    #[test]
    fn test_superseded_open_socket_still_forwards() {
        let (transport, host) = setup();
        let first = host.open("wss://a", None).unwrap();
        transport.emit_open();
        host.open("wss://b", None).unwrap();

        assert_eq!(first.ready_state(), ReadyState::Open);
        assert!(!first.is_current());

        first.send("late").unwrap();
        first.close();

        assert_eq!(transport.sent_messages(), vec![MessageData::from("late")]);
        assert_eq!(transport.close_requests(), 1);
    }

    #[test]
    fn test_close_when_closed_is_noop() {
        let (transport, host) = setup();
        let socket = host.open("wss://x", None).unwrap();
        transport.emit_close(HostCloseEvent::new(1006, "", false));

        socket.close();

        assert_eq!(transport.close_requests(), 0);
    }

    // ------------------------------------------------------------------------
    // Connect Failures
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_inline_connect_failure_is_deferred() {
        let (transport, host) = setup();
        transport.fail_next_connect(HostErrorEvent::new("connectSocket:fail", "refused"));

        let socket = host.open("wss://x", None).unwrap();
        assert_eq!(socket.ready_state(), ReadyState::Connecting);

        let mut events = socket.subscribe();
        match events.recv().await {
            Some(SocketEvent::Error(event)) => assert_eq!(event.message, "connectSocket:fail"),
            other => panic!("expected error event, got {other:?}"),
        }
        assert_eq!(socket.ready_state(), ReadyState::Closed);
    }

    #[tokio::test]
    async fn test_late_connect_failure_is_deferred() {
        let (transport, host) = setup();
        let socket = host.open("wss://x", None).unwrap();
        let mut events = socket.subscribe();

        assert!(transport.emit_connect_failure(HostErrorEvent::new("timeout", "handshake")));
        assert_eq!(socket.ready_state(), ReadyState::Connecting);

        assert!(matches!(events.recv().await, Some(SocketEvent::Error(_))));
        assert_eq!(socket.ready_state(), ReadyState::Closed);
    }

    #[test]
    fn test_connect_failure_without_runtime_is_parked() {
        let (transport, host) = setup();
        transport.fail_next_connect(HostErrorEvent::new("connectSocket:fail", "refused"));

        let socket = host.open("wss://x", None).unwrap();
        assert_eq!(socket.ready_state(), ReadyState::Connecting);

        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&messages);
        socket.on_error(move |event| sink.lock().push(event.message.clone()));

        assert_eq!(host.run_deferred(), 1);
        assert_eq!(*messages.lock(), vec!["connectSocket:fail".to_string()]);
        assert_eq!(socket.ready_state(), ReadyState::Closed);
        assert_eq!(host.run_deferred(), 0);
    }

    #[test]
    fn test_parked_failure_delivered_before_next_callback() {
        let (transport, host) = setup();
        transport.fail_next_connect(HostErrorEvent::new("connectSocket:fail", "refused"));

        let socket = host.open("wss://x", None).unwrap();
        let log = record(&socket);

        transport.emit_open();

        assert_eq!(*log.lock(), vec![(EventKind::Error, ReadyState::Closed)]);
        assert_eq!(host.run_deferred(), 0);
    }

    #[test]
    fn test_parked_failure_delivered_before_next_open() {
        let (transport, host) = setup();
        transport.fail_next_connect(HostErrorEvent::new("connectSocket:fail", "refused"));

        let first = host.open("wss://a", None).unwrap();
        let log = record(&first);

        host.open("wss://b", None).unwrap();

        assert_eq!(
            *log.lock(),
            vec![
                (EventKind::Error, ReadyState::Closed),
                (EventKind::Close, ReadyState::Closed),
            ]
        );
    }

    #[tokio::test]
    async fn test_spurious_connect_failure_is_dropped() {
        let (transport, host) = setup();
        transport.fail_next_connect(HostErrorEvent::new("connectSocket:fail", ""));

        let socket = host.open("wss://x", None).unwrap();
        tokio::task::yield_now().await;

        assert_eq!(socket.ready_state(), ReadyState::Connecting);
    }

    // ------------------------------------------------------------------------
    // Full Scenario
    // ------------------------------------------------------------------------

    #[test]
    fn test_full_lifecycle() {
        let (transport, host) = setup();
        let socket = host.open("wss://x", None).unwrap();
        let log = record(&socket);
        let payloads = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&payloads);
        socket.on_message(move |event| sink.lock().push(event.data.clone()));

        assert_eq!(socket.ready_state(), ReadyState::Connecting);

        transport.emit_open();
        assert_eq!(socket.ready_state(), ReadyState::Open);

        socket.send("hi").unwrap();
        assert_eq!(transport.sent_messages(), vec![MessageData::from("hi")]);

        transport.emit_message(HostMessageEvent::new("pong"));
        assert_eq!(*payloads.lock(), vec![MessageData::from("pong")]);

        socket.close();
        transport.emit_close(HostCloseEvent::new(1000, "", true));

        assert_eq!(socket.ready_state(), ReadyState::Closed);
        assert_eq!(
            *log.lock(),
            vec![
                (EventKind::Open, ReadyState::Open),
                (EventKind::Message, ReadyState::Open),
                (EventKind::Close, ReadyState::Closed),
            ]
        );
        assert!(host.current().is_none());
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    proptest! {
        #[test]
        fn prop_protocol_requires_capability(protocol in "[a-z0-9.-]{1,16}") {
            let transport = Arc::new(MemoryHost::new().with_protocol_support(false));
            let host = SocketHost::new(transport.clone());

            let result = host.open("wss://x", Some(&protocol));
            prop_assert!(
                matches!(result, Err(Error::UnsupportedFeature { .. })),
                "expected UnsupportedFeature"
            );
            prop_assert!(transport.is_untouched());
        }

        #[test]
        fn prop_empty_url_always_rejected(protocol in proptest::option::of("[a-z]{0,8}")) {
            let (transport, host) = setup();

            let result = host.open("", protocol.as_deref());
            prop_assert!(
                matches!(result, Err(Error::InvalidArgument { .. })),
                "expected InvalidArgument"
            );
            prop_assert!(transport.is_untouched());
        }

        #[test]
        fn prop_send_outside_open_never_reaches_host(text in ".{0,32}", fail_first in any::<bool>()) {
            let (transport, host) = setup();
            let socket = host.open("wss://x", None).unwrap();
            if fail_first {
                transport.emit_close(HostCloseEvent::new(1006, "", false));
            }

            prop_assert!(socket.send(text.as_str()).is_err());
            prop_assert!(transport.sent_messages().is_empty());
        }
    }
}
