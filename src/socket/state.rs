//! Ready state of a socket.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// The connection is not yet open.
pub const CONNECTING: u8 = 0;

/// The connection is open and ready to communicate.
pub const OPEN: u8 = 1;

/// The connection is in the process of closing.
pub const CLOSING: u8 = 2;

/// The connection is closed or couldn't be opened.
pub const CLOSED: u8 = 3;

// ============================================================================
// ReadyState
// ============================================================================

/// Lifecycle state of a socket, with the standard numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum ReadyState {
    /// Handshake in progress.
    Connecting = CONNECTING,
    /// Open.
    Open = OPEN,
    /// Closing.
    Closing = CLOSING,
    /// Closed. Terminal.
    Closed = CLOSED,
}

impl ReadyState {
    /// Returns the numeric value.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts from the numeric value.
    #[inline]
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            CONNECTING => Some(Self::Connecting),
            OPEN => Some(Self::Open),
            CLOSING => Some(Self::Closing),
            CLOSED => Some(Self::Closed),
            _ => None,
        }
    }

    /// Returns the standard name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "CONNECTING",
            Self::Open => "OPEN",
            Self::Closing => "CLOSING",
            Self::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// AtomicReadyState
// ============================================================================

/// Ready state cell readable without locking.
///
/// Once `Closed` is stored no other state can replace it.
#[derive(Debug)]
pub(crate) struct AtomicReadyState(AtomicU8);

impl AtomicReadyState {
    pub(crate) const fn new(state: ReadyState) -> Self {
        Self(AtomicU8::new(state.as_u8()))
    }

    pub(crate) fn load(&self) -> ReadyState {
        ReadyState::from_u8(self.0.load(Ordering::SeqCst)).unwrap_or(ReadyState::Closed)
    }

    /// Moves `Connecting` to `Open`. Returns `false` if the state was not
    /// `Connecting`.
    pub(crate) fn open(&self) -> bool {
        self.0
            .compare_exchange(CONNECTING, OPEN, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Moves any state to `Closed`. Returns the previous state.
    pub(crate) fn close(&self) -> ReadyState {
        ReadyState::from_u8(self.0.swap(CLOSED, Ordering::SeqCst)).unwrap_or(ReadyState::Closed)
    }
}

// ============================================================================
// Tests
// ============================================================================
