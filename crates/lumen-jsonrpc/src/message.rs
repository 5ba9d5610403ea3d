use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use thiserror::Error;

use crate::error::{ErrorCode, ErrorObject};
use crate::types::{JsonRpcVersion, RequestId};

/// A JSON-RPC request: carries an id and demands exactly one response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMessage {
    pub jsonrpc: JsonRpcVersion,
    pub id: RequestId,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Box<RawValue>>,
}

impl RequestMessage {
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Box<RawValue>>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion::V2_0,
            id,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC notification: no id, no response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub jsonrpc: JsonRpcVersion,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Box<RawValue>>,
}

impl NotificationMessage {
    pub fn new(method: impl Into<String>, params: Option<Box<RawValue>>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion::V2_0,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC response: result or error, never both.
///
/// When a request succeeds with no payload the `result` field still must be
/// present as the literal `null`, so constructors always populate one side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub jsonrpc: JsonRpcVersion,
    pub id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Box<RawValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl ResponseMessage {
    /// A successful response carrying `result`.
    pub fn success(id: RequestId, result: Box<RawValue>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion::V2_0,
            id,
            result: Some(result),
            error: None,
        }
    }

    /// A successful response with an explicit `result: null`.
    pub fn null(id: RequestId) -> Self {
        Self::success(id, null_raw_value())
    }

    /// An error response.
    pub fn error(id: RequestId, error: ErrorObject) -> Self {
        Self {
            jsonrpc: JsonRpcVersion::V2_0,
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// The JSON literal `null` as a raw value.
pub fn null_raw_value() -> Box<RawValue> {
    RawValue::from_string("null".to_string()).expect("null is valid JSON")
}

/// A classified inbound or outbound message
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Message {
    Request(RequestMessage),
    Notification(NotificationMessage),
    Response(ResponseMessage),
}

/// Why an inbound payload could not be classified
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("failed to parse message: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("message is not a valid request, notification, or response")]
    InvalidEnvelope,
}

impl ClassifyError {
    /// The protocol error code this failure maps to.
    pub fn code(&self) -> ErrorCode {
        match self {
            ClassifyError::Parse(_) => ErrorCode::ParseError,
            ClassifyError::InvalidEnvelope => ErrorCode::InvalidRequest,
        }
    }
}

/// First-pass decode: just enough of the envelope to pick a shape.
#[derive(Deserialize)]
struct Probe {
    #[serde(default)]
    id: Option<Box<RawValue>>,
    #[serde(default)]
    method: Option<String>,
}

impl Message {
    /// Classify a raw payload as a request, notification, or response.
    ///
    /// A partial decode inspects `method` and `id`; the matching envelope is
    /// then decoded fully. Parameters stay raw for the dispatcher to decode
    /// against the handler's declared shape.
    pub fn classify(payload: &[u8]) -> Result<Message, ClassifyError> {
        let probe: Probe = serde_json::from_slice(payload)?;

        let id_present = probe
            .id
            .as_ref()
            .map(|id| id.get() != "null")
            .unwrap_or(false);

        match (probe.method.as_deref(), id_present) {
            (Some(method), true) if !method.is_empty() => {
                Ok(Message::Request(serde_json::from_slice(payload)?))
            }
            (Some(method), false) if !method.is_empty() => {
                Ok(Message::Notification(serde_json::from_slice(payload)?))
            }
            (None, true) => Ok(Message::Response(serde_json::from_slice(payload)?)),
            _ => Err(ClassifyError::InvalidEnvelope),
        }
    }
}
