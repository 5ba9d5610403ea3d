//! Types for the lifecycle handshake: initialize, initialized, shutdown,
//! exit, and the `$/`-prefixed protocol notifications.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::capabilities::ServerCapabilities;
use crate::types::DocumentUri;

/// Information about the client implementation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Information about the server implementation, echoed in the initialize
/// result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A workspace folder open in the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceFolder {
    pub uri: String,
    pub name: String,
}

/// Client capabilities for text document synchronization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentSyncClientCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did_save: Option<bool>,
}

/// Client capabilities for completion requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionClientCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_registration: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_item: Option<CompletionItemClientCapabilities>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionItemClientCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet_support: Option<bool>,
}

/// Client capabilities for hover requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoverClientCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_registration: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_format: Option<Vec<crate::types::MarkupKind>>,
}

/// Workspace-specific client capabilities. Truncated to what the framework
/// consults; clients send far more and the unknown fields are dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceClientCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_edit: Option<bool>,
}

/// Text-document-specific client capabilities. Truncated like
/// [`WorkspaceClientCapabilities`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentClientCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synchronization: Option<TextDocumentSyncClientCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<CompletionClientCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover: Option<HoverClientCapabilities>,
}

/// The capabilities the client declares during initialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<WorkspaceClientCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_document: Option<TextDocumentClientCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<Value>,
}

/// Parameters of the `initialize` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_info: Option<ClientInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_uri: Option<DocumentUri>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initialization_options: Option<Value>,
    #[serde(default)]
    pub capabilities: ClientCapabilities,
    /// off, messages, or verbose.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_folders: Option<Vec<WorkspaceFolder>>,
}

/// Result of the `initialize` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub capabilities: ServerCapabilities,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_info: Option<ServerInfo>,
}

/// Parameters of the `initialized` notification. Empty on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitializedParams {}

/// Parameters of the `$/cancelRequest` notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelParams {
    /// The id of the request to cancel: a number or a string.
    pub id: Value,
}

/// Parameters of the `$/progress` notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressParams {
    /// The token of the progress operation: a number or a string.
    pub token: Value,
    pub value: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_params_decode() {
        let params: InitializeParams = serde_json::from_str(
            r#"{
                "processId": 1234,
                "clientInfo": {"name": "editor", "version": "1.2.3"},
                "rootUri": "file:///workspace",
                "capabilities": {"textDocument": {"hover": {"contentFormat": ["markdown"]}}}
            }"#,
        )
        .unwrap();

        assert_eq!(params.process_id, Some(1234));
        assert_eq!(params.client_info.unwrap().name, "editor");
        assert_eq!(params.root_uri.unwrap().as_str(), "file:///workspace");
        assert!(params.capabilities.text_document.unwrap().hover.is_some());
    }

    #[test]
    fn test_initialize_params_tolerate_missing_capabilities() {
        let params: InitializeParams = serde_json::from_str("{}").unwrap();
        assert!(params.process_id.is_none());
    }

    #[test]
    fn test_cancel_params_id_shapes() {
        let numeric: CancelParams = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        let string: CancelParams = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(numeric.id, serde_json::json!(7));
        assert_eq!(string.id, serde_json::json!("abc"));
    }
}
