//! Browser-style sockets on a global-callback host.
//!
//! This module maps a host's single global callback surface onto
//! per-instance [`WebSocket`] objects.
//!
//! # Lifecycle
//!
//! ```text
//! CONNECTING ──open──► OPEN ──close──► CLOSED
//!      │                                 ▲
//!      └────────────error/close──────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `host` | [`SocketHost`] factory and callback routing |
//! | `listeners` | Listener registry |
//! | `options` | [`SocketOptions`] and [`ErrorFilter`] |
//! | `slot` | The connection slot |
//! | `state` | [`ReadyState`] and numeric constants |
//! | `websocket` | The [`WebSocket`] instance |

// ============================================================================
// Submodules
// ============================================================================

/// Socket factory and callback routing.
pub mod host;

/// Listener registry.
pub mod listeners;

/// Adapter configuration.
pub mod options;

/// The connection slot.
mod slot;

/// Ready state.
pub mod state;

/// The socket instance.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use host::SocketHost;
pub use listeners::Listener;
pub use options::{ErrorFilter, SocketOptions};
pub use state::{CLOSED, CLOSING, CONNECTING, OPEN, ReadyState};
pub use websocket::WebSocket;
