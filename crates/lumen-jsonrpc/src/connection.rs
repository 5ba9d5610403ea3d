use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use serde::Serialize;
use serde_json::value::to_raw_value;
use tokio::io::AsyncWrite;
use tokio::sync::Mutex;

use crate::codec::{FrameError, MessageWriter};
use crate::message::{Message, NotificationMessage, RequestMessage};
use crate::types::RequestId;

/// The shared write half of a JSON-RPC connection.
///
/// Responses, outbound notifications, and server-initiated requests are all
/// produced concurrently, so every write goes through a single mutex and each
/// frame reaches the stream whole. The read half has exactly one owner and
/// lives in [`crate::MessageReader`].
pub struct Connection {
    writer: Mutex<MessageWriter<Box<dyn AsyncWrite + Send + Unpin>>>,
    closed: AtomicBool,
    next_request_id: AtomicI64,
}

impl Connection {
    pub fn new(writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            writer: Mutex::new(MessageWriter::new(Box::new(writer))),
            closed: AtomicBool::new(false),
            next_request_id: AtomicI64::new(1),
        }
    }

    /// Serialize and write one message. Safe for concurrent use.
    pub async fn write(&self, message: &Message) -> Result<(), FrameError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(FrameError::Closed);
        }

        let payload = serde_json::to_vec(message)?;

        let mut writer = self.writer.lock().await;
        if self.closed.load(Ordering::SeqCst) {
            return Err(FrameError::Closed);
        }
        writer.write_message(&payload).await
    }

    /// Send a notification to the peer.
    ///
    /// Params serializing to `null` are omitted from the envelope.
    pub async fn notify(&self, method: &str, params: impl Serialize) -> Result<(), FrameError> {
        let raw = to_raw_value(&params)?;
        let params = if raw.get() == "null" { None } else { Some(raw) };
        self.write(&Message::Notification(NotificationMessage::new(
            method, params,
        )))
        .await
    }

    /// Send a server-initiated request and return its assigned id.
    ///
    /// Fire-and-forget: the peer's eventual response is not awaited or
    /// correlated here. Callers that need the answer must watch for it at a
    /// higher level.
    pub async fn request(
        &self,
        method: &str,
        params: impl Serialize,
    ) -> Result<RequestId, FrameError> {
        let id = RequestId::number(self.next_request_id.fetch_add(1, Ordering::Relaxed));
        let raw = to_raw_value(&params)?;
        let params = if raw.get() == "null" { None } else { Some(raw) };
        self.write(&Message::Request(RequestMessage::new(
            id.clone(),
            method,
            params,
        )))
        .await?;
        Ok(id)
    }

    /// Close the connection. Further writes fail with [`FrameError::Closed`].
    ///
    /// Idempotent; the underlying writer is shut down best-effort.
    pub async fn close(&self) -> Result<(), FrameError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let mut writer = self.writer.lock().await;
        writer.shutdown().await
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MessageReader;
    use serde_json::json;

    fn pipe() -> (Connection, MessageReader<tokio::io::ReadHalf<tokio::io::DuplexStream>>) {
        let (client, server) = tokio::io::duplex(4096);
        let (client_read, _client_write) = tokio::io::split(client);
        let (_server_read, server_write) = tokio::io::split(server);
        (Connection::new(server_write), MessageReader::new(client_read))
    }

    #[tokio::test]
    async fn test_notify_writes_framed_notification() {
        let (conn, mut reader) = pipe();

        conn.notify("window/logMessage", json!({"type": 3, "message": "hi"}))
            .await
            .unwrap();

        let payload = reader.read_message().await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["method"], "window/logMessage");
        assert_eq!(value["params"]["message"], "hi");
        assert!(value.get("id").is_none());
    }

    #[tokio::test]
    async fn test_notify_omits_null_params() {
        let (conn, mut reader) = pipe();

        conn.notify("exit", ()).await.unwrap();

        let payload = reader.read_message().await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert!(value.get("params").is_none());
    }

    #[tokio::test]
    async fn test_request_assigns_monotone_ids() {
        let (conn, mut reader) = pipe();

        let first = conn
            .request("workspace/applyEdit", json!({"edit": {}}))
            .await
            .unwrap();
        let second = conn
            .request("window/showMessageRequest", json!({"type": 3}))
            .await
            .unwrap();

        assert_eq!(first, RequestId::number(1));
        assert_eq!(second, RequestId::number(2));

        let payload = reader.read_message().await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["method"], "workspace/applyEdit");
    }

    #[tokio::test]
    async fn test_write_after_close_fails() {
        let (conn, _reader) = pipe();

        conn.close().await.unwrap();
        let err = conn.notify("initialized", ()).await.unwrap_err();
        assert!(matches!(err, FrameError::Closed));

        // Closing again is a no-op.
        conn.close().await.unwrap();
    }
}
