//! Error types for the socket adapter.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use host_websocket::{Result, SocketHost};
//!
//! fn example(host: &SocketHost) -> Result<()> {
//!     let socket = host.open("wss://example.com/feed", None)?;
//!     socket.close();
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Caller | [`Error::InvalidArgument`], [`Error::InvalidState`] |
//! | Host capability | [`Error::UnsupportedFeature`] |
//! | Transport | [`Error::Transport`] |
//! | External | [`Error::Json`], [`Error::WebSocket`], [`Error::Url`] |
//!
//! Transport failures of a live socket are never returned from a call; they
//! arrive as `error` events. [`Error::Transport`] exists for host
//! implementations that need to describe such a failure.

// ============================================================================
// Imports
// ============================================================================

use std::convert::Infallible;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;
use url::ParseError as UrlError;

use crate::socket::ReadyState;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Caller Errors
    // ========================================================================
    /// Invalid argument passed to an operation.
    ///
    /// Returned for an empty url at construction and for payloads that are
    /// neither text nor binary.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// Operation not allowed in the socket's current state.
    ///
    /// Returned by `send` outside of [`ReadyState::Open`].
    #[error("Invalid state: socket is {state}")]
    InvalidState {
        /// State the socket was in.
        state: ReadyState,
    },

    // ========================================================================
    // Host Errors
    // ========================================================================
    /// Feature not supported by the host platform.
    #[error("Unsupported feature: {feature}")]
    UnsupportedFeature {
        /// Name of the missing capability.
        feature: String,
    },

    /// Transport-level failure reported by the host.
    #[error("Transport error: {message}")]
    Transport {
        /// Description from the host.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] UrlError),
}

impl From<Infallible> for Error {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an invalid state error.
    #[inline]
    pub fn invalid_state(state: ReadyState) -> Self {
        Self::InvalidState { state }
    }

    /// Creates an unsupported feature error.
    #[inline]
    pub fn unsupported_feature(feature: impl Into<String>) -> Self {
        Self::UnsupportedFeature {
            feature: feature.into(),
        }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if the caller passed something the adapter rejects.
    #[inline]
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. } | Self::InvalidState { .. }
        )
    }

    /// Returns `true` if this is a transport-level error.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::WebSocket(_) | Self::Url(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_argument("url required");
        assert_eq!(err.to_string(), "Invalid argument: url required");
    }

    #[test]
    fn test_invalid_state_display() {
        let err = Error::invalid_state(ReadyState::Connecting);
        assert_eq!(err.to_string(), "Invalid state: socket is CONNECTING");
    }

    #[test]
    fn test_unsupported_feature_display() {
        let err = Error::unsupported_feature("subprotocols");
        assert_eq!(err.to_string(), "Unsupported feature: subprotocols");
    }

    #[test]
    fn test_is_caller_error() {
        assert!(Error::invalid_argument("x").is_caller_error());
        assert!(Error::invalid_state(ReadyState::Closed).is_caller_error());
        assert!(!Error::transport("x").is_caller_error());
        assert!(!Error::unsupported_feature("x").is_caller_error());
    }

    #[test]
    fn test_is_transport_error() {
        assert!(Error::transport("reset").is_transport_error());
        assert!(!Error::invalid_argument("x").is_transport_error());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_from_url_error() {
        let url_err = url::Url::parse("not a url").unwrap_err();
        let err: Error = url_err.into();
        assert!(err.is_transport_error());
    }
}
