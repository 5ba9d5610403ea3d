use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// The `jsonrpc` version marker carried by every envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JsonRpcVersion {
    #[serde(rename = "2.0")]
    V2_0,
}

impl Default for JsonRpcVersion {
    fn default() -> Self {
        JsonRpcVersion::V2_0
    }
}

/// A request identifier, preserved as the raw bytes the client sent.
///
/// The protocol allows numbers and strings; a response must echo the request
/// id byte-for-byte, so the id is never reparsed into a native type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Box<RawValue>);

impl RequestId {
    /// Create a numeric identifier.
    pub fn number(id: i64) -> Self {
        Self(RawValue::from_string(id.to_string()).expect("integer is valid JSON"))
    }

    /// Create a string identifier.
    pub fn string(id: impl AsRef<str>) -> Self {
        let encoded = serde_json::to_string(id.as_ref()).expect("string is valid JSON");
        Self(RawValue::from_string(encoded).expect("encoded string is valid JSON"))
    }

    /// The raw JSON text of the identifier.
    pub fn as_str(&self) -> &str {
        self.0.get()
    }

    /// Whether the identifier is the JSON literal `null`.
    ///
    /// A null id marks a notification-shaped envelope; responses are never
    /// emitted for it.
    pub fn is_null(&self) -> bool {
        self.0.get() == "null"
    }
}

impl PartialEq for RequestId {
    fn eq(&self, other: &Self) -> bool {
        self.0.get() == other.0.get()
    }
}

impl Eq for RequestId {}

impl Hash for RequestId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.get().hash(state);
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.get())
    }
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        Self::number(id)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self::string(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_serializes_as_marker() {
        let json = serde_json::to_string(&JsonRpcVersion::V2_0).unwrap();
        assert_eq!(json, "\"2.0\"");
    }

    #[test]
    fn test_number_id_round_trip() {
        let id = RequestId::number(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");

        let parsed: RequestId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_string_id_round_trip() {
        let id = RequestId::string("req-7");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"req-7\"");

        let parsed: RequestId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_id_bytes_preserved_verbatim() {
        // A large number that would lose precision as f64 must survive.
        let parsed: RequestId = serde_json::from_str("9007199254740993").unwrap();
        assert_eq!(parsed.as_str(), "9007199254740993");
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "9007199254740993");
    }

    #[test]
    fn test_null_detection() {
        let parsed: RequestId = serde_json::from_str("null").unwrap();
        assert!(parsed.is_null());
        assert!(!RequestId::number(0).is_null());
    }
}
