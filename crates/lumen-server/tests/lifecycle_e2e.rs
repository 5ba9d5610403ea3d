//! End-to-end tests driving a full server over an in-memory duplex stream.
//!
//! The test client speaks the real wire format through the framing codec;
//! the exit hook is captured on a channel instead of terminating the test
//! process.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{DuplexStream, ReadHalf, WriteHalf};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use lumen_jsonrpc::{MessageReader, MessageWriter};
use lumen_protocol::hover::{Hover, HoverParams};
use lumen_protocol::types::{MarkupContent, MarkupKind};
use lumen_protocol::window::MessageType;
use lumen_server::{handler, BoxError, ConnectionExt, Server, ServerError};

struct TestClient {
    reader: MessageReader<ReadHalf<DuplexStream>>,
    writer: MessageWriter<WriteHalf<DuplexStream>>,
}

impl TestClient {
    async fn send(&mut self, message: Value) {
        self.writer
            .write_message(message.to_string().as_bytes())
            .await
            .unwrap();
    }

    async fn recv(&mut self) -> Value {
        let payload = timeout(Duration::from_secs(5), self.reader.read_message())
            .await
            .expect("timed out waiting for a server message")
            .unwrap();
        serde_json::from_slice(&payload).unwrap()
    }
}

struct TestServer {
    client: TestClient,
    run: JoinHandle<Result<(), ServerError>>,
    exit_codes: mpsc::UnboundedReceiver<i32>,
}

impl TestServer {
    /// initialize + initialized, returning the initialize response.
    async fn handshake(&mut self) -> Value {
        self.client
            .send(json!({
                "jsonrpc": "2.0",
                "id": "init-1",
                "method": "initialize",
                "params": {"processId": 1234, "clientInfo": {"name": "e2e-client"}}
            }))
            .await;
        let response = self.client.recv().await;
        assert_eq!(response["id"], "init-1");
        assert!(response.get("error").is_none(), "initialize failed: {response}");

        self.client
            .send(json!({"jsonrpc": "2.0", "method": "initialized", "params": {}}))
            .await;
        response
    }

    async fn exit_code(&mut self) -> i32 {
        timeout(Duration::from_secs(5), self.exit_codes.recv())
            .await
            .expect("timed out waiting for exit")
            .expect("exit hook dropped without firing")
    }
}

fn start_with_cancel(configure: impl FnOnce(&Server), cancel: CancellationToken) -> TestServer {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let (client_read, client_write) = tokio::io::split(client_io);
    let (server_read, server_write) = tokio::io::split(server_io);

    let (exit_tx, exit_codes) = mpsc::unbounded_channel();
    let server = Server::builder()
        .name("lumen-test-server")
        .version("0.0.1")
        .drain_timeout(Duration::from_millis(200))
        .on_exit(move |code| {
            let _ = exit_tx.send(code);
        })
        .build(server_read, server_write);

    configure(&server);

    let run = tokio::spawn(server.run_until(cancel));

    TestServer {
        client: TestClient {
            reader: MessageReader::new(client_read),
            writer: MessageWriter::new(client_write),
        },
        run,
        exit_codes,
    }
}

fn start(configure: impl FnOnce(&Server)) -> TestServer {
    start_with_cancel(configure, CancellationToken::new())
}

fn register_hover(server: &Server) {
    server
        .register(
            "textDocument/hover",
            handler::request(|_ctx, _params: HoverParams| async move {
                Ok::<_, BoxError>(Some(Hover {
                    contents: MarkupContent {
                        kind: MarkupKind::PlainText,
                        value: "hover text".to_string(),
                    },
                    range: None,
                }))
            }),
        )
        .unwrap();
}

#[tokio::test]
async fn test_clean_handshake_shutdown_and_exit() {
    let mut ts = start(register_hover);

    let response = ts.handshake().await;
    let capabilities = &response["result"]["capabilities"];
    assert!(capabilities["hoverProvider"].is_object());
    assert!(capabilities.get("completionProvider").is_none());
    assert_eq!(response["result"]["serverInfo"]["name"], "lumen-test-server");

    ts.client
        .send(json!({"jsonrpc": "2.0", "id": 2, "method": "shutdown"}))
        .await;
    let response = ts.client.recv().await;
    assert_eq!(response["id"], 2);
    assert_eq!(response["result"], Value::Null);
    assert!(response.get("error").is_none());

    ts.client
        .send(json!({"jsonrpc": "2.0", "method": "exit"}))
        .await;
    assert_eq!(ts.exit_code().await, 0);

    // Client disconnect after a clean shutdown ends the run loop cleanly.
    drop(ts.client);
    ts.run.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_method_not_found() {
    let mut ts = start(register_hover);
    ts.handshake().await;

    ts.client
        .send(json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "textDocument/definition",
            "params": {}
        }))
        .await;

    let response = ts.client.recv().await;
    assert_eq!(response["id"], 7);
    assert_eq!(response["error"]["code"], -32601);
    assert_eq!(
        response["error"]["message"],
        "method not found: textDocument/definition"
    );
    assert!(response.get("result").is_none());
}

#[tokio::test]
async fn test_malformed_params_rejected() {
    #[derive(Debug, Default, serde::Deserialize)]
    struct MyParams {
        x: i64,
    }

    let mut ts = start(|server| {
        server
            .register(
                "myMethod",
                handler::request(|_ctx, params: MyParams| async move {
                    Ok::<_, BoxError>(params.x)
                }),
            )
            .unwrap();
    });
    ts.handshake().await;

    ts.client
        .send(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "myMethod",
            "params": {"x": "not-a-number"}
        }))
        .await;

    let response = ts.client.recv().await;
    assert_eq!(response["id"], 3);
    assert_eq!(response["error"]["code"], -32602);
}

#[tokio::test]
async fn test_concurrent_notifications_do_not_block_responses() {
    let barrier = Arc::new(Notify::new());
    let release = Arc::clone(&barrier);

    let mut ts = start(move |server| {
        server
            .register(
                "test/slow",
                handler::notification(move |_ctx, _params: Value| {
                    let barrier = Arc::clone(&barrier);
                    async move {
                        barrier.notified().await;
                        Ok(())
                    }
                }),
            )
            .unwrap();
        server
            .register(
                "test/ping",
                handler::request_no_params(|_ctx| async move { Ok::<_, BoxError>("pong") }),
            )
            .unwrap();
    });
    ts.handshake().await;

    // Two long notifications in flight...
    ts.client
        .send(json!({"jsonrpc": "2.0", "method": "test/slow"}))
        .await;
    ts.client
        .send(json!({"jsonrpc": "2.0", "method": "test/slow"}))
        .await;

    // ...must not delay a fast request's response.
    ts.client
        .send(json!({"jsonrpc": "2.0", "id": 5, "method": "test/ping"}))
        .await;

    let response = ts.client.recv().await;
    assert_eq!(response["id"], 5);
    assert_eq!(response["result"], "pong");

    release.notify_waiters();
}

#[tokio::test]
async fn test_pre_initialize_protection() {
    let mut ts = start(register_hover);

    ts.client
        .send(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "textDocument/hover",
            "params": {}
        }))
        .await;
    let response = ts.client.recv().await;
    assert_eq!(response["error"]["code"], -32002);
    assert_eq!(response["error"]["message"], "server not initialized");

    // $/cancelRequest is admitted before initialization and changes nothing.
    ts.client
        .send(json!({"jsonrpc": "2.0", "method": "$/cancelRequest", "params": {"id": 1}}))
        .await;

    // The server is still uninitialized, so initialize must succeed.
    ts.handshake().await;
}

#[tokio::test]
async fn test_capability_inference_code_action_resolve() {
    let mut ts = start(|server| {
        server
            .register(
                "textDocument/codeAction",
                handler::request(|_ctx, _params: Value| async move {
                    Ok::<_, BoxError>(Vec::<Value>::new())
                }),
            )
            .unwrap();
        server
            .register(
                "codeAction/resolve",
                handler::request(|_ctx, params: Value| async move {
                    Ok::<_, BoxError>(params)
                }),
            )
            .unwrap();
    });

    let response = ts.handshake().await;
    let capabilities = &response["result"]["capabilities"];
    assert_eq!(capabilities["codeActionProvider"]["resolveProvider"], true);
    assert!(capabilities.get("hoverProvider").is_none());
    assert!(capabilities.get("textDocumentSync").is_none());
}

#[tokio::test]
async fn test_second_initialize_rejected() {
    let mut ts = start(register_hover);
    ts.handshake().await;

    ts.client
        .send(json!({"jsonrpc": "2.0", "id": 9, "method": "initialize", "params": {}}))
        .await;
    let response = ts.client.recv().await;
    assert_eq!(response["id"], 9);
    assert_eq!(response["error"]["code"], -32600);
}

#[tokio::test]
async fn test_initialize_twice_while_initializing() {
    let mut ts = start(register_hover);

    ts.client
        .send(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}))
        .await;
    assert!(ts.client.recv().await.get("error").is_none());

    // No initialized notification yet; a second initialize is invalid.
    ts.client
        .send(json!({"jsonrpc": "2.0", "id": 2, "method": "initialize", "params": {}}))
        .await;
    let response = ts.client.recv().await;
    assert_eq!(response["error"]["code"], -32600);
    assert_eq!(
        response["error"]["message"],
        "server already initialized or is shutting down"
    );
}

#[tokio::test]
async fn test_shutdown_gates_requests_and_is_idempotent() {
    let mut ts = start(register_hover);
    ts.handshake().await;

    ts.client
        .send(json!({"jsonrpc": "2.0", "id": 3, "method": "shutdown"}))
        .await;
    assert_eq!(ts.client.recv().await["result"], Value::Null);

    // Any non-shutdown request is now invalid.
    ts.client
        .send(json!({"jsonrpc": "2.0", "id": 4, "method": "textDocument/hover", "params": {}}))
        .await;
    let response = ts.client.recv().await;
    assert_eq!(response["error"]["code"], -32600);
    assert_eq!(response["error"]["message"], "server is shutting down");

    // Further shutdowns still answer null.
    ts.client
        .send(json!({"jsonrpc": "2.0", "id": 5, "method": "shutdown"}))
        .await;
    let response = ts.client.recv().await;
    assert_eq!(response["id"], 5);
    assert_eq!(response["result"], Value::Null);

    ts.client
        .send(json!({"jsonrpc": "2.0", "method": "exit"}))
        .await;
    assert_eq!(ts.exit_code().await, 0);
}

#[tokio::test]
async fn test_exit_without_shutdown_is_unclean() {
    let mut ts = start(register_hover);
    ts.handshake().await;

    ts.client
        .send(json!({"jsonrpc": "2.0", "method": "exit"}))
        .await;
    assert_eq!(ts.exit_code().await, 1);

    drop(ts.client);
    let result = ts.run.await.unwrap();
    assert!(matches!(result, Err(ServerError::UnexpectedDisconnect)));
}

#[tokio::test]
async fn test_response_id_echoed_byte_exact() {
    let mut ts = start(register_hover);
    ts.handshake().await;

    // An id above 2^53 would be mangled by any float round trip.
    ts.client
        .send(json!({
            "jsonrpc": "2.0",
            "id": 9007199254740993i64,
            "method": "shutdown"
        }))
        .await;
    let response = ts.client.recv().await;
    assert_eq!(response["id"], json!(9007199254740993i64));
}

#[tokio::test]
async fn test_unknown_notification_ignored() {
    let mut ts = start(|server| {
        server
            .register(
                "test/ping",
                handler::request_no_params(|_ctx| async move { Ok::<_, BoxError>("pong") }),
            )
            .unwrap();
    });
    ts.handshake().await;

    ts.client
        .send(json!({"jsonrpc": "2.0", "method": "test/nope", "params": {}}))
        .await;

    // The next inbound message is the ping response; the unknown
    // notification produced nothing.
    ts.client
        .send(json!({"jsonrpc": "2.0", "id": 6, "method": "test/ping"}))
        .await;
    let response = ts.client.recv().await;
    assert_eq!(response["id"], 6);
    assert_eq!(response["result"], "pong");
}

#[tokio::test]
async fn test_handler_emits_notification_through_conn() {
    let mut ts = start(|server| {
        server
            .register(
                "test/emit",
                handler::request_with_conn(|_ctx, conn, _params: Value| async move {
                    conn.show_message(MessageType::INFO, "working on it")
                        .await
                        .map_err(BoxError::from)?;
                    Ok::<_, BoxError>("done")
                }),
            )
            .unwrap();
    });
    ts.handshake().await;

    ts.client
        .send(json!({"jsonrpc": "2.0", "id": 8, "method": "test/emit"}))
        .await;

    // The handler's notification precedes its response on the wire.
    let notification = ts.client.recv().await;
    assert_eq!(notification["method"], "window/showMessage");
    assert_eq!(notification["params"]["message"], "working on it");

    let response = ts.client.recv().await;
    assert_eq!(response["id"], 8);
    assert_eq!(response["result"], "done");
}

#[tokio::test]
async fn test_malformed_message_does_not_kill_loop() {
    let mut ts = start(register_hover);

    // Valid frame, unparsable payload: dropped.
    ts.client
        .writer
        .write_message(b"{this is not json")
        .await
        .unwrap();
    // Valid JSON but no recognizable shape: dropped.
    ts.client.send(json!({"jsonrpc": "2.0", "id": null})).await;

    // The server is still alive and serves the handshake.
    ts.handshake().await;
}

#[tokio::test]
async fn test_cancellation_stops_run_loop() {
    let cancel = CancellationToken::new();
    let ts = start_with_cancel(register_hover, cancel.clone());

    cancel.cancel();
    let result = ts.run.await.unwrap();
    assert!(matches!(result, Err(ServerError::Cancelled)));
}

#[tokio::test]
async fn test_duplicate_and_core_registrations_rejected() {
    let (client_io, server_io) = tokio::io::duplex(1024);
    drop(client_io);
    let (server_read, server_write) = tokio::io::split(server_io);
    let server = Server::builder().build(server_read, server_write);

    register_hover(&server);
    let err = server
        .register(
            "textDocument/hover",
            handler::request_no_params(|_ctx| async move { Ok::<_, BoxError>(()) }),
        )
        .unwrap_err();
    assert!(matches!(err, ServerError::DuplicateHandler(_)));

    let err = server
        .register(
            "initialize",
            handler::request_no_params(|_ctx| async move { Ok::<_, BoxError>(()) }),
        )
        .unwrap_err();
    assert!(matches!(err, ServerError::DuplicateHandler(_)));
}
