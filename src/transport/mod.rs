//! Host transport layer.
//!
//! A host platform exposes its socket through global functions: one set of
//! actions and one set of callback registrations shared by the whole
//! process. [`HostTransport`] captures that surface so the adapter can sit
//! on top of any such host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐   connect/send/close    ┌─────────────────┐
//! │  SocketHost     │────────────────────────►│  HostTransport  │
//! │  → WebSocket    │                         │  (platform)     │
//! │                 │◄────────────────────────│                 │
//! └─────────────────┘  open/error/msg/close   └─────────────────┘
//!                        global callbacks
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `memory` | Scripted in-process host |
//! | `native` | Host backed by tokio-tungstenite |

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use crate::protocol::{
    ConnectRequest, HostCloseEvent, HostErrorEvent, HostMessageEvent, MessageData,
};

// ============================================================================
// Submodules
// ============================================================================

/// Scripted in-process host.
pub mod memory;

/// Host backed by a real WebSocket client.
pub mod native;

// ============================================================================
// Re-exports
// ============================================================================

pub use memory::MemoryHost;
pub use native::{NativeHost, NativeHostOptions};

// ============================================================================
// Handler Types
// ============================================================================

/// Callback for the host's open notification.
pub type OpenHandler = Arc<dyn Fn() + Send + Sync>;

/// Callback for the host's error notification.
pub type ErrorHandler = Arc<dyn Fn(HostErrorEvent) + Send + Sync>;

/// Callback for the host's message notification.
pub type MessageHandler = Arc<dyn Fn(HostMessageEvent) + Send + Sync>;

/// Callback for the host's close notification.
pub type CloseHandler = Arc<dyn Fn(HostCloseEvent) + Send + Sync>;

/// Called when a connect attempt cannot be made at all.
///
/// The host may invoke it inline from `connect_socket` or later.
pub type FailureCallback = Box<dyn FnOnce(HostErrorEvent) + Send>;

// ============================================================================
// HostTransport
// ============================================================================

/// The global socket surface of a host platform.
///
/// Registrations are global: each `on_socket_*` call replaces the previous
/// handler of that kind. Actions apply to the host's one current socket.
pub trait HostTransport: Send + Sync {
    /// Returns `true` if the host can negotiate subprotocols.
    fn supports_protocols(&self) -> bool;

    /// Starts connecting. Reports outright failure through `on_failure`.
    fn connect_socket(&self, request: ConnectRequest, on_failure: FailureCallback);

    /// Sends a message on the current socket. No delivery confirmation.
    fn send_socket_message(&self, data: MessageData);

    /// Requests termination of the current socket.
    fn close_socket(&self);

    /// Registers the open handler.
    fn on_socket_open(&self, handler: OpenHandler);

    /// Registers the error handler.
    fn on_socket_error(&self, handler: ErrorHandler);

    /// Registers the message handler.
    fn on_socket_message(&self, handler: MessageHandler);

    /// Registers the close handler.
    fn on_socket_close(&self, handler: CloseHandler);
}

// ============================================================================
// HostHandlers
// ============================================================================

/// Storage for the four global handlers, shared by the bundled hosts.
///
/// Getters clone the `Arc` so callers invoke handlers without holding
/// whatever lock guards this struct.
#[derive(Default, Clone)]
pub(crate) struct HostHandlers {
    pub open: Option<OpenHandler>,
    pub error: Option<ErrorHandler>,
    pub message: Option<MessageHandler>,
    pub close: Option<CloseHandler>,
}
