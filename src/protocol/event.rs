//! Event types.
//!
//! Two families live here:
//!
//! - Host payloads (`Host*Event`), shaped the way a platform host reports
//!   socket activity through its global callbacks.
//! - [`SocketEvent`], the per-instance event delivered to listeners.
//!
//! # Host Payloads
//!
//! | Callback | Payload |
//! |----------|---------|
//! | open | none |
//! | error | `{ errMsg, message }` |
//! | message | `{ data, origin, ports, source }` |
//! | close | `{ code, reason, wasClean }` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

use super::message::MessageData;

/// Fallback text when the host gives no description of an error.
const GENERIC_ERROR_MESSAGE: &str = "WebSocket transport error";

// ============================================================================
// HostErrorEvent
// ============================================================================

/// Error payload reported by the host.
///
/// # Format
///
/// ```json
/// { "errMsg": "connectSocket:fail", "message": "connection refused" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostErrorEvent {
    /// Host-formatted error description.
    pub err_msg: String,

    /// Free-form message. Some hosts fire spurious errors with this empty.
    pub message: String,
}

impl HostErrorEvent {
    /// Creates an error payload.
    #[inline]
    #[must_use]
    pub fn new(err_msg: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            err_msg: err_msg.into(),
            message: message.into(),
        }
    }

    /// Returns the most descriptive text available.
    #[must_use]
    pub fn description(&self) -> &str {
        if !self.err_msg.is_empty() {
            &self.err_msg
        } else if !self.message.is_empty() {
            &self.message
        } else {
            GENERIC_ERROR_MESSAGE
        }
    }
}

// ============================================================================
// HostMessageEvent
// ============================================================================

/// Inbound message payload reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostMessageEvent {
    /// Message payload.
    pub data: MessageData,

    /// Origin of the message, as the host reports it.
    #[serde(default)]
    pub origin: String,

    /// Transferred ports. Opaque to the adapter.
    #[serde(default)]
    pub ports: Vec<Value>,

    /// Message source. Opaque to the adapter.
    #[serde(default)]
    pub source: Option<Value>,
}

impl HostMessageEvent {
    /// Creates a message payload with no transport metadata.
    #[inline]
    #[must_use]
    pub fn new(data: impl Into<MessageData>) -> Self {
        Self {
            data: data.into(),
            origin: String::new(),
            ports: Vec::new(),
            source: None,
        }
    }

    /// Sets the origin.
    #[inline]
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }
}

// ============================================================================
// HostCloseEvent
// ============================================================================

/// Close payload reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostCloseEvent {
    /// Close code.
    pub code: u16,

    /// Close reason.
    #[serde(default)]
    pub reason: String,

    /// Whether the closing handshake completed.
    #[serde(default)]
    pub was_clean: bool,
}

impl HostCloseEvent {
    /// Creates a close payload.
    #[inline]
    #[must_use]
    pub fn new(code: u16, reason: impl Into<String>, was_clean: bool) -> Self {
        Self {
            code,
            reason: reason.into(),
            was_clean,
        }
    }
}

/// Decodes a host payload from its JSON form.
///
/// For hosts that hand callbacks a JSON string.
///
/// # Errors
///
/// Returns [`Error::Json`] if the text does not match the payload shape.
pub fn decode_host_payload<T: DeserializeOwned>(json: &str) -> Result<T> {
    Ok(serde_json::from_str(json)?)
}

// ============================================================================
// EventKind
// ============================================================================

/// The four event kinds a socket dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Connection established.
    Open,
    /// Transport error.
    Error,
    /// Inbound message.
    Message,
    /// Connection closed.
    Close,
}

impl EventKind {
    /// All kinds, in registration order.
    pub const ALL: [EventKind; 4] = [Self::Open, Self::Error, Self::Message, Self::Close];

    /// Returns the event type name.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Error => "error",
            Self::Message => "message",
            Self::Close => "close",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(Self::Open),
            "error" => Ok(Self::Error),
            "message" => Ok(Self::Message),
            "close" => Ok(Self::Close),
            other => Err(Error::invalid_argument(format!(
                "unknown event type: {other}"
            ))),
        }
    }
}

// ============================================================================
// SocketEvent
// ============================================================================

/// An event dispatched to a socket's listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    /// Connection established.
    Open,

    /// Transport error.
    Error(ErrorEvent),

    /// Inbound message.
    Message(MessageEvent),

    /// Connection closed.
    Close(CloseEvent),
}

impl SocketEvent {
    /// Returns the kind of this event.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Open => EventKind::Open,
            Self::Error(_) => EventKind::Error,
            Self::Message(_) => EventKind::Message,
            Self::Close(_) => EventKind::Close,
        }
    }
}

/// Payload of an `error` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    /// Description of the failure.
    pub message: String,
}

impl From<&HostErrorEvent> for ErrorEvent {
    fn from(event: &HostErrorEvent) -> Self {
        Self {
            message: event.description().to_owned(),
        }
    }
}

/// Payload of a `message` event. Fields are passed through from the host.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    /// Message payload.
    pub data: MessageData,
    /// Origin of the message.
    pub origin: String,
    /// Transferred ports.
    pub ports: Vec<Value>,
    /// Message source.
    pub source: Option<Value>,
}

impl From<HostMessageEvent> for MessageEvent {
    fn from(event: HostMessageEvent) -> Self {
        Self {
            data: event.data,
            origin: event.origin,
            ports: event.ports,
            source: event.source,
        }
    }
}

/// Payload of a `close` event.
///
/// `code` is `None` when the socket was superseded by a newer one rather
/// than closed by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseEvent {
    /// Close code from the host.
    pub code: Option<u16>,
    /// Close reason from the host.
    pub reason: String,
    /// Whether the closing handshake completed.
    pub was_clean: bool,
}

impl CloseEvent {
    /// The notification sent to a socket replaced by a newer one.
    #[inline]
    #[must_use]
    pub fn superseded() -> Self {
        Self::default()
    }
}

impl From<HostCloseEvent> for CloseEvent {
    fn from(event: HostCloseEvent) -> Self {
        Self {
            code: Some(event.code),
            reason: event.reason,
            was_clean: event.was_clean,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_description_prefers_err_msg() {
        let event = HostErrorEvent::new("connectSocket:fail", "refused");
        assert_eq!(event.description(), "connectSocket:fail");
    }

    #[test]
    fn test_error_description_fallbacks() {
        assert_eq!(HostErrorEvent::new("", "refused").description(), "refused");
        assert_eq!(
            HostErrorEvent::default().description(),
            GENERIC_ERROR_MESSAGE
        );
    }

    #[test]
    fn test_decode_error_payload() {
        let event: HostErrorEvent =
            decode_host_payload(r#"{ "errMsg": "onSocketError", "message": "" }"#).unwrap();
        assert_eq!(event.err_msg, "onSocketError");
        assert!(event.message.is_empty());
    }

    #[test]
    fn test_decode_error_payload_missing_fields() {
        let event: HostErrorEvent = decode_host_payload("{}").unwrap();
        assert_eq!(event, HostErrorEvent::default());
    }

    #[test]
    fn test_decode_message_payload() {
        let event: HostMessageEvent =
            decode_host_payload(r#"{ "data": "pong", "origin": "wss://x" }"#).unwrap();
        assert_eq!(event.data, MessageData::Text("pong".into()));
        assert_eq!(event.origin, "wss://x");
        assert!(event.ports.is_empty());
        assert!(event.source.is_none());
    }

    #[test]
    fn test_decode_close_payload() {
        let event: HostCloseEvent =
            decode_host_payload(r#"{ "code": 1000, "reason": "bye", "wasClean": true }"#)
                .unwrap();
        assert_eq!(event, HostCloseEvent::new(1000, "bye", true));
    }

    #[test]
    fn test_decode_invalid_payload() {
        let err = decode_host_payload::<HostCloseEvent>(r#"{ "reason": 5 }"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_event_kind_parsing() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
        assert!("upgrade".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_close_event_from_host() {
        let event = CloseEvent::from(HostCloseEvent::new(1006, "", false));
        assert_eq!(event.code, Some(1006));
        assert!(!event.was_clean);
        assert_eq!(CloseEvent::superseded().code, None);
    }

    #[test]
    fn test_socket_event_kind() {
        assert_eq!(SocketEvent::Open.kind(), EventKind::Open);
        let close = SocketEvent::Close(CloseEvent::superseded());
        assert_eq!(close.kind(), EventKind::Close);
    }
}
