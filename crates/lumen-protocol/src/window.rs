//! Window (user-facing message) payloads.

use serde::{Deserialize, Serialize};

/// Severity of a user-facing message: 1 error, 2 warning, 3 info, 4 log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageType(pub i32);

impl MessageType {
    pub const ERROR: MessageType = MessageType(1);
    pub const WARNING: MessageType = MessageType(2);
    pub const INFO: MessageType = MessageType(3);
    pub const LOG: MessageType = MessageType(4);
}

/// Parameters of the window/showMessage notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShowMessageParams {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub message: String,
}

/// Parameters of the window/logMessage notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogMessageParams {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub message: String,
}

/// Parameters of the window/showMessageRequest request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShowMessageRequestParams {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<MessageActionItem>>,
}

/// One action offered in a showMessageRequest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageActionItem {
    pub title: String,
}
