//! Host WebSocket - browser-style sockets over global-callback host APIs.
//!
//! Some platforms expose sockets only through process-wide functions: one
//! `connectSocket`, one `sendSocketMessage`, one `closeSocket`, and one
//! registration hook per event kind. This crate turns that surface back
//! into the familiar per-instance object with a `readyState`, `send`,
//! `close` and `open`/`error`/`message`/`close` events.
//!
//! # Architecture
//!
//! - **[`SocketHost`]**: owns one [`HostTransport`] and the slot naming the
//!   socket that currently owns the host's callbacks
//! - **[`WebSocket`]**: one connection; opening a new one supersedes it
//! - **[`HostTransport`]**: the platform's global socket API
//!
//! Key rules:
//!
//! - At most one socket is current per host
//! - A superseded socket gets one `close` event and ignores later callbacks
//! - State changes before listeners run
//! - Transport failures arrive as `error` events, never as returned errors
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use host_websocket::{NativeHost, Result, SocketHost};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<()> {
//!     let host = SocketHost::new(Arc::new(NativeHost::new()));
//!
//!     let socket = host.open("ws://127.0.0.1:9000", None)?;
//!     let mut events = socket.subscribe();
//!
//!     while let Some(event) = events.recv().await {
//!         println!("{:?} -> {}", event.kind(), socket.ready_state());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`socket`] | [`SocketHost`], [`WebSocket`], [`ReadyState`] |
//! | [`transport`] | [`HostTransport`], [`MemoryHost`], [`NativeHost`] |
//! | [`protocol`] | Host payloads and socket events |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for sockets and listeners.
pub mod identifiers;

/// Host payloads, socket events and message data.
pub mod protocol;

/// The socket adapter.
///
/// - [`SocketHost`] - Opens sockets, routes host callbacks
/// - [`WebSocket`] - One connection
pub mod socket;

/// Host transport trait and bundled hosts.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Socket types
pub use socket::{
    CLOSED, CLOSING, CONNECTING, ErrorFilter, Listener, OPEN, ReadyState, SocketHost,
    SocketOptions, WebSocket,
};

// Protocol types
pub use protocol::{
    CloseEvent, ConnectRequest, ErrorEvent, EventKind, HostCloseEvent, HostErrorEvent,
    HostMessageEvent, MessageData, MessageEvent, SocketEvent,
};

// Transport types
pub use transport::{HostTransport, MemoryHost, NativeHost, NativeHostOptions};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ConnectionId, ListenerId};
