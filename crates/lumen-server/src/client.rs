//! Convenience methods for talking back to the client.

use async_trait::async_trait;
use serde::Serialize;

use lumen_jsonrpc::{Connection, FrameError, RequestId};
use lumen_protocol::document::{Diagnostic, PublishDiagnosticsParams};
use lumen_protocol::methods;
use lumen_protocol::types::{DocumentUri, WorkspaceEdit};
use lumen_protocol::window::{LogMessageParams, MessageType, ShowMessageParams};

/// Parameters of the workspace/applyEdit server-initiated request.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyWorkspaceEditParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub edit: WorkspaceEdit,
}

/// Client-facing operations layered over a [`Connection`].
///
/// Handlers built with the `with_conn` shapes get the connection handle and
/// can call these directly.
#[async_trait]
pub trait ConnectionExt {
    /// Show a message in the client's UI (window/showMessage).
    async fn show_message(
        &self,
        message_type: MessageType,
        message: impl Into<String> + Send,
    ) -> Result<(), FrameError>;

    /// Log a message to the client's output channel (window/logMessage).
    async fn log_message(
        &self,
        message_type: MessageType,
        message: impl Into<String> + Send,
    ) -> Result<(), FrameError>;

    /// Publish the full current diagnostic set for a document.
    async fn publish_diagnostics(
        &self,
        uri: DocumentUri,
        diagnostics: Vec<Diagnostic>,
    ) -> Result<(), FrameError>;

    /// Ask the client to apply a workspace edit.
    ///
    /// Fire-and-forget: returns the assigned request id without awaiting the
    /// client's response.
    async fn apply_edit(&self, edit: WorkspaceEdit) -> Result<RequestId, FrameError>;
}

#[async_trait]
impl ConnectionExt for Connection {
    async fn show_message(
        &self,
        message_type: MessageType,
        message: impl Into<String> + Send,
    ) -> Result<(), FrameError> {
        self.notify(
            methods::WINDOW_SHOW_MESSAGE,
            ShowMessageParams {
                message_type,
                message: message.into(),
            },
        )
        .await
    }

    async fn log_message(
        &self,
        message_type: MessageType,
        message: impl Into<String> + Send,
    ) -> Result<(), FrameError> {
        self.notify(
            methods::WINDOW_LOG_MESSAGE,
            LogMessageParams {
                message_type,
                message: message.into(),
            },
        )
        .await
    }

    async fn publish_diagnostics(
        &self,
        uri: DocumentUri,
        diagnostics: Vec<Diagnostic>,
    ) -> Result<(), FrameError> {
        self.notify(
            methods::TEXT_DOCUMENT_PUBLISH_DIAGNOSTICS,
            PublishDiagnosticsParams {
                uri,
                version: None,
                diagnostics,
            },
        )
        .await
    }

    async fn apply_edit(&self, edit: WorkspaceEdit) -> Result<RequestId, FrameError> {
        self.request(
            methods::WORKSPACE_APPLY_EDIT,
            ApplyWorkspaceEditParams { label: None, edit },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_jsonrpc::MessageReader;
    use lumen_protocol::document::DiagnosticSeverity;
    use lumen_protocol::types::Range;

    fn pipe() -> (
        Connection,
        MessageReader<tokio::io::ReadHalf<tokio::io::DuplexStream>>,
    ) {
        let (client, server) = tokio::io::duplex(4096);
        let (client_read, _client_write) = tokio::io::split(client);
        let (_server_read, server_write) = tokio::io::split(server);
        (Connection::new(server_write), MessageReader::new(client_read))
    }

    #[tokio::test]
    async fn test_show_message_wire_shape() {
        let (conn, mut reader) = pipe();

        conn.show_message(MessageType::WARNING, "careful")
            .await
            .unwrap();

        let payload = reader.read_message().await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value["method"], "window/showMessage");
        assert_eq!(value["params"]["type"], 2);
        assert_eq!(value["params"]["message"], "careful");
    }

    #[tokio::test]
    async fn test_publish_diagnostics_wire_shape() {
        let (conn, mut reader) = pipe();

        let diagnostic = Diagnostic {
            range: Range::default(),
            severity: Some(DiagnosticSeverity::ERROR),
            message: "syntax error".to_string(),
            ..Default::default()
        };
        conn.publish_diagnostics("file:///a.rs".into(), vec![diagnostic])
            .await
            .unwrap();

        let payload = reader.read_message().await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value["method"], "textDocument/publishDiagnostics");
        assert_eq!(value["params"]["uri"], "file:///a.rs");
        assert_eq!(value["params"]["diagnostics"][0]["severity"], 1);
    }

    #[tokio::test]
    async fn test_apply_edit_is_a_request() {
        let (conn, mut reader) = pipe();

        let id = conn.apply_edit(WorkspaceEdit::default()).await.unwrap();

        let payload = reader.read_message().await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value["method"], "workspace/applyEdit");
        assert_eq!(value["id"].to_string(), id.as_str());
        assert!(value["params"]["edit"].is_object());
    }
}
