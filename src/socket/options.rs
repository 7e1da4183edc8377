//! Adapter configuration.
//!
//! # Example
//!
//! ```ignore
//! use host_websocket::{ErrorFilter, SocketOptions};
//!
//! // Surface every host error, including empty-message ones.
//! let options = SocketOptions::new().with_error_filter(ErrorFilter::Disabled);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::protocol::HostErrorEvent;

// ============================================================================
// ErrorFilter
// ============================================================================

/// Decides which host error reports are spurious and must be dropped.
///
/// Some mobile hosts fire the error callback with an empty `message` when
/// nothing went wrong. [`ErrorFilter::EmptyMessage`] drops those and is the
/// default. Hosts without that quirk can use [`ErrorFilter::Disabled`].
#[derive(Clone, Default)]
pub enum ErrorFilter {
    /// Drop errors whose `message` field is empty.
    #[default]
    EmptyMessage,

    /// Surface every error.
    Disabled,

    /// Drop errors for which the predicate returns `true`.
    Custom(Arc<dyn Fn(&HostErrorEvent) -> bool + Send + Sync>),
}

impl ErrorFilter {
    /// Creates a filter from a predicate returning `true` for spurious errors.
    #[inline]
    #[must_use]
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&HostErrorEvent) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    /// Returns `true` if `event` should be dropped.
    #[must_use]
    pub fn is_spurious(&self, event: &HostErrorEvent) -> bool {
        match self {
            Self::EmptyMessage => event.message.is_empty(),
            Self::Disabled => false,
            Self::Custom(predicate) => predicate(event),
        }
    }
}

impl fmt::Debug for ErrorFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMessage => f.write_str("EmptyMessage"),
            Self::Disabled => f.write_str("Disabled"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

// ============================================================================
// SocketOptions
// ============================================================================

/// Configuration shared by every socket a [`SocketHost`](crate::SocketHost)
/// opens.
#[derive(Debug, Clone, Default)]
pub struct SocketOptions {
    /// Filter for spurious host errors.
    pub error_filter: ErrorFilter,
}

impl SocketOptions {
    /// Creates options with the default error filter.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the spurious error filter.
    #[inline]
    #[must_use]
    pub fn with_error_filter(mut self, error_filter: ErrorFilter) -> Self {
        self.error_filter = error_filter;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
