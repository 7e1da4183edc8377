//! Connect request sent to the host.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// ConnectRequest
// ============================================================================

/// Arguments for a host `connectSocket` call.
///
/// # Format
///
/// ```json
/// { "url": "wss://example.com", "protocols": ["chat"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRequest {
    /// Target URL.
    pub url: String,

    /// Requested subprotocols. Empty when none was requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub protocols: Vec<String>,
}

impl ConnectRequest {
    /// Creates a request for `url`, with `protocol` if it is non-empty.
    #[must_use]
    pub fn new(url: impl Into<String>, protocol: &str) -> Self {
        let protocols = if protocol.is_empty() {
            Vec::new()
        } else {
            vec![protocol.to_owned()]
        };

        Self {
            url: url.into(),
            protocols,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
