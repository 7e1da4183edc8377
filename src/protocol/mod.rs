//! Payload and event types.
//!
//! # Overview
//!
//! | Type | Direction | Purpose |
//! |------|-----------|---------|
//! | `ConnectRequest` | Adapter → Host | Arguments for `connectSocket` |
//! | `MessageData` | Both | Text or binary payload |
//! | `Host*Event` | Host → Adapter | Global callback payloads |
//! | `SocketEvent` | Adapter → Listeners | Per-instance events |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `event` | Host payloads and socket events |
//! | `message` | Message payload |
//! | `request` | Connect request |

// ============================================================================
// Submodules
// ============================================================================

/// Host payloads and socket events.
pub mod event;

/// Message payload type.
pub mod message;

/// Connect request type.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{
    CloseEvent, ErrorEvent, EventKind, HostCloseEvent, HostErrorEvent, HostMessageEvent,
    MessageEvent, SocketEvent, decode_host_payload,
};
pub use message::MessageData;
pub use request::ConnectRequest;
