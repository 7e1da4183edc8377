//! Message payload type.
//!
//! A socket carries either text or binary frames. [`MessageData`] is the
//! payload accepted by `send` and carried by `message` events.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// MessageData
// ============================================================================

/// Text or binary message payload.
///
/// Host payloads decode untagged: a JSON string becomes [`MessageData::Text`],
/// an array of bytes becomes [`MessageData::Binary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageData {
    /// UTF-8 text.
    Text(String),

    /// Raw bytes.
    Binary(Vec<u8>),
}

impl MessageData {
    /// Returns the text if this is a text payload.
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    /// Returns the payload bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    /// Returns the payload length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns `true` if the payload is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `"text"` or `"binary"`, for log fields.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<String> for MessageData {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for MessageData {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for MessageData {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

impl From<&[u8]> for MessageData {
    fn from(bytes: &[u8]) -> Self {
        Self::Binary(bytes.to_vec())
    }
}

/// Dynamically typed payloads: only strings are accepted.
impl TryFrom<Value> for MessageData {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(Self::Text(text)),
            other => Err(Error::invalid_argument(format!(
                "only text or binary payloads are supported, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_text_accessors() {
        let data = MessageData::from("hi");
        assert_eq!(data.as_text(), Some("hi"));
        assert_eq!(data.len(), 2);
        assert_eq!(data.kind(), "text");
    }

    #[test]
    fn test_binary_accessors() {
        let data = MessageData::from(vec![1u8, 2, 3]);
        assert_eq!(data.as_text(), None);
        assert_eq!(data.as_bytes(), &[1, 2, 3]);
        assert_eq!(data.kind(), "binary");
        assert!(!data.is_empty());
    }

    #[test]
    fn test_try_from_string_value() {
        let data = MessageData::try_from(json!("pong")).unwrap();
        assert_eq!(data, MessageData::Text("pong".into()));
    }

    #[test]
    fn test_try_from_rejects_non_text() {
        for value in [json!(42), json!(null), json!({ "a": 1 }), json!(true)] {
            let err = MessageData::try_from(value).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument { .. }));
        }
    }

    #[test]
    fn test_untagged_decoding() {
        let text: MessageData = serde_json::from_str(r#""pong""#).unwrap();
        let binary: MessageData = serde_json::from_str("[0, 255]").unwrap();
        assert_eq!(text, MessageData::Text("pong".into()));
        assert_eq!(binary, MessageData::Binary(vec![0, 255]));
    }
}
