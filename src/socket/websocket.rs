//! The socket instance.
//!
//! A [`WebSocket`] is the per-connection object handed out by
//! [`SocketHost::open`](crate::SocketHost::open). Its state only changes in
//! response to host callbacks; `send` and `close` forward requests to the
//! host and never touch the state themselves.
//!
//! # Example
//!
//! ```ignore
//! let socket = host.open("wss://example.com/feed", None)?;
//!
//! socket.on_open(|| println!("connected"));
//! socket.on_message(|event| println!("received {:?}", event.data));
//! socket.on_close(|event| println!("closed with {:?}", event.code));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{ConnectionId, ListenerId};
use crate::protocol::{CloseEvent, ErrorEvent, EventKind, MessageData, MessageEvent, SocketEvent};

use super::host::HostInner;
use super::listeners::ListenerRegistry;
use super::state::{AtomicReadyState, ReadyState};

// ============================================================================
// SocketInner
// ============================================================================

/// Shared state of one socket.
pub(crate) struct SocketInner {
    /// Identity compared against the connection slot.
    pub id: ConnectionId,
    /// Target URL.
    pub url: String,
    /// Requested subprotocol, empty if none.
    pub protocol: String,
    /// Lifecycle state.
    pub state: AtomicReadyState,
    /// Event listeners.
    pub listeners: ListenerRegistry,
    /// Set once a `close` event has been handed to the listeners.
    pub close_delivered: AtomicBool,
    /// Owning host. Weak so the host's registered handlers, which hold
    /// this socket, do not form a cycle with it.
    pub host: Weak<HostInner>,
}

impl SocketInner {
    /// Delivers an event to this socket's listeners.
    pub(crate) fn dispatch(&self, event: &SocketEvent) -> usize {
        let count = self.listeners.dispatch(event);
        trace!(id = %self.id, kind = %event.kind(), listeners = count, "Event dispatched");
        count
    }

    /// Claims the single `close` delivery. Returns `false` if a close event
    /// was already delivered.
    pub(crate) fn claim_close(&self) -> bool {
        !self.close_delivered.swap(true, Ordering::AcqRel)
    }
}

// ============================================================================
// WebSocket
// ============================================================================

/// A browser-style socket bound to a host's global socket API.
///
/// Cloning is cheap; clones refer to the same socket.
#[derive(Clone)]
pub struct WebSocket {
    pub(crate) inner: Arc<SocketInner>,
}

impl fmt::Debug for WebSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocket")
            .field("id", &self.inner.id)
            .field("url", &self.inner.url)
            .field("protocol", &self.inner.protocol)
            .field("ready_state", &self.ready_state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// WebSocket - Constructor
// ============================================================================

impl WebSocket {
    /// Creates a socket in [`ReadyState::Connecting`].
    pub(crate) fn new(url: &str, protocol: &str, host: Weak<HostInner>) -> Self {
        Self {
            inner: Arc::new(SocketInner {
                id: ConnectionId::generate(),
                url: url.to_owned(),
                protocol: protocol.to_owned(),
                state: AtomicReadyState::new(ReadyState::Connecting),
                listeners: ListenerRegistry::default(),
                close_delivered: AtomicBool::new(false),
                host,
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<SocketInner>) -> Self {
        Self { inner }
    }
}

// ============================================================================
// WebSocket - Accessors
// ============================================================================

impl WebSocket {
    /// Returns the connection ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.inner.id
    }

    /// Returns the URL passed at construction.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Returns the requested subprotocol, or `""` if none.
    #[inline]
    #[must_use]
    pub fn protocol(&self) -> &str {
        &self.inner.protocol
    }

    /// Returns the current ready state.
    #[inline]
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.inner.state.load()
    }

    /// Returns `true` if this socket owns its host's callbacks.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.inner
            .host
            .upgrade()
            .is_some_and(|host| host.slot.is_current(self.inner.id))
    }
}

// ============================================================================
// WebSocket - Actions
// ============================================================================

impl WebSocket {
    /// Sends a text or binary message.
    ///
    /// Accepts anything convertible to [`MessageData`]: `&str`, `String`,
    /// `&[u8]`, `Vec<u8>`, or a `serde_json::Value` holding a string.
    ///
    /// A single best-effort attempt; delivery is not confirmed.
    ///
    /// The host has one global socket. A superseded socket that is still
    /// open forwards to whatever connection the host holds now, which
    /// belongs to its successor. Check [`is_current`](Self::is_current)
    /// first if that matters.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] if the socket is not open
    /// - [`Error::InvalidArgument`] if the payload is neither text nor binary
    pub fn send<D>(&self, data: D) -> Result<()>
    where
        D: TryInto<MessageData>,
        Error: From<D::Error>,
    {
        let state = self.ready_state();
        if state != ReadyState::Open {
            return Err(Error::invalid_state(state));
        }

        let data = data.try_into()?;

        let Some(host) = self.inner.host.upgrade() else {
            return Err(Error::invalid_state(ReadyState::Closed));
        };

        trace!(id = %self.inner.id, kind = data.kind(), len = data.len(), "Forwarding message");
        host.transport.send_socket_message(data);
        Ok(())
    }

    /// Requests closure from the host.
    ///
    /// Does nothing if already closed. The state changes only when the host
    /// reports the close.
    ///
    /// On a superseded socket this closes the host's current connection,
    /// which belongs to its successor. See [`is_current`](Self::is_current).
    pub fn close(&self) {
        match self.ready_state() {
            ReadyState::Closed => {
                trace!(id = %self.inner.id, "Close on a closed socket ignored");
                return;
            }
            ReadyState::Connecting => {
                warn!(
                    id = %self.inner.id,
                    url = %self.inner.url,
                    "Closing a socket that is still connecting might not work"
                );
            }
            ReadyState::Open | ReadyState::Closing => {}
        }

        if let Some(host) = self.inner.host.upgrade() {
            host.transport.close_socket();
        }
    }
}

// ============================================================================
// WebSocket - Events
// ============================================================================

impl WebSocket {
    /// Registers a listener for `kind`. Listeners run in insertion order.
    pub fn add_event_listener<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&SocketEvent) + Send + Sync + 'static,
    {
        self.inner.listeners.add(kind, Arc::new(listener))
    }

    /// Unregisters a listener. Returns `false` if it was not registered.
    pub fn remove_event_listener(&self, kind: EventKind, id: ListenerId) -> bool {
        self.inner.listeners.remove(kind, id)
    }

    /// Delivers `event` to the listeners of its kind.
    ///
    /// Returns the number of listeners invoked. Does not change the state.
    pub fn dispatch_event(&self, event: &SocketEvent) -> usize {
        self.inner.dispatch(event)
    }

    /// Returns the number of listeners registered for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner.listeners.count(kind)
    }

    /// Registers an `open` listener.
    pub fn on_open<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.add_event_listener(EventKind::Open, move |_| listener())
    }

    /// Registers an `error` listener.
    pub fn on_error<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ErrorEvent) + Send + Sync + 'static,
    {
        self.add_event_listener(EventKind::Error, move |event| {
            if let SocketEvent::Error(error) = event {
                listener(error);
            }
        })
    }

    /// Registers a `message` listener.
    pub fn on_message<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&MessageEvent) + Send + Sync + 'static,
    {
        self.add_event_listener(EventKind::Message, move |event| {
            if let SocketEvent::Message(message) = event {
                listener(message);
            }
        })
    }

    /// Registers a `close` listener.
    pub fn on_close<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&CloseEvent) + Send + Sync + 'static,
    {
        self.add_event_listener(EventKind::Close, move |event| {
            if let SocketEvent::Close(close) = event {
                listener(close);
            }
        })
    }

    /// Returns a channel receiving every event this socket dispatches from
    /// now on.
    ///
    /// The listeners stay registered after the receiver is dropped; sends to
    /// a dropped receiver are discarded.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SocketEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        for kind in EventKind::ALL {
            let tx = tx.clone();
            self.add_event_listener(kind, move |event| {
                let _ = tx.send(event.clone());
            });
        }
        rx
    }
}

// ============================================================================
// Tests
// ============================================================================
