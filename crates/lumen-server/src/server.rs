//! The server core: read loop, dispatch, state gating, and the lifecycle
//! methods the framework owns.

use std::sync::Arc;

use serde_json::value::{to_raw_value, RawValue};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use lumen_jsonrpc::{
    Connection, ErrorObject, FrameError, Message, MessageReader, NotificationMessage,
    RequestId, RequestMessage, ResponseMessage,
};
use lumen_protocol::lifecycle::{CancelParams, InitializeParams, InitializeResult, ProgressParams, ServerInfo};
use lumen_protocol::methods;

use crate::builder::ServerBuilder;
use crate::capabilities::infer_capabilities;
use crate::handler::{decode_params, encode_result, Handler, HandlerResult, RequestContext};
use crate::lifecycle::{Lifecycle, LifecycleState, PendingWork, PendingWorkGuard};
use crate::registry::HandlerRegistry;

/// Errors terminating the server's run loop or failing registration
#[derive(Debug, Error)]
pub enum ServerError {
    /// A handler is already registered for the method, or the method is one
    /// the framework dispatches itself.
    #[error("handler already registered for method: {0}")]
    DuplicateHandler(String),

    /// The client dropped the connection without a prior `shutdown`.
    #[error("client disconnected before shutdown")]
    UnexpectedDisconnect,

    /// The run loop's cancellation token tripped.
    #[error("run loop cancelled")]
    Cancelled,

    /// A fatal transport or framing failure.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Called with the exit status when the client sends `exit`. The default
/// terminates the process.
pub(crate) type ExitHook = Box<dyn Fn(i32) + Send + Sync>;

/// A language server speaking framed JSON-RPC over a duplex byte stream.
///
/// Construct with [`Server::builder`], register handlers, then call
/// [`Server::run`]. `run` consumes the server, so handler registration after
/// the read loop starts is unrepresentable.
pub struct Server {
    inner: Arc<ServerInner>,
    reader: MessageReader<Box<dyn AsyncRead + Send + Unpin>>,
}

pub(crate) struct ServerInner {
    conn: Arc<Connection>,
    registry: HandlerRegistry,
    lifecycle: Lifecycle,
    pending: Arc<PendingWork>,
    server_info: ServerInfo,
    commands: Vec<String>,
    drain_timeout: std::time::Duration,
    exit_hook: ExitHook,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub(crate) fn new(
        reader: Box<dyn AsyncRead + Send + Unpin>,
        writer: Box<dyn AsyncWrite + Send + Unpin>,
        server_info: ServerInfo,
        commands: Vec<String>,
        drain_timeout: std::time::Duration,
        exit_hook: ExitHook,
    ) -> Self {
        Self {
            inner: Arc::new(ServerInner {
                conn: Arc::new(Connection::new(writer)),
                registry: HandlerRegistry::new(),
                lifecycle: Lifecycle::new(),
                pending: Arc::new(PendingWork::new()),
                server_info,
                commands,
                drain_timeout,
                exit_hook,
            }),
            reader: MessageReader::new(reader),
        }
    }

    /// Associate a handler with a protocol method name.
    ///
    /// Fails with [`ServerError::DuplicateHandler`] on a second registration
    /// for the same method, and for the lifecycle methods the framework
    /// dispatches itself (`initialize`, `initialized`, `shutdown`, `exit`,
    /// `$/cancelRequest`, `$/progress`).
    pub fn register(&self, method: &str, handler: Handler) -> Result<(), ServerError> {
        self.inner.registry.register(method, handler)
    }

    /// The shared write handle, for emitting notifications outside handlers.
    pub fn connection(&self) -> Arc<Connection> {
        Arc::clone(&self.inner.conn)
    }

    /// Run the read loop until disconnect or a fatal error.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(CancellationToken::new()).await
    }

    /// Run the read loop until disconnect, a fatal error, or cancellation.
    ///
    /// Each inbound message is handled on its own task; responses to
    /// distinct requests may interleave in any order. Returns `Ok(())` when
    /// the client disconnects after a clean `shutdown`.
    pub async fn run_until(mut self, cancel: CancellationToken) -> Result<(), ServerError> {
        info!(
            name = %self.inner.server_info.name,
            version = self.inner.server_info.version.as_deref().unwrap_or(""),
            "server starting listener loop"
        );

        loop {
            let payload = tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("cancellation requested, closing connection");
                    if let Err(error) = self.inner.conn.close().await {
                        warn!(%error, "error closing connection after cancellation");
                    }
                    return Err(ServerError::Cancelled);
                }

                read = self.reader.read_message() => match read {
                    Ok(payload) => payload,
                    Err(FrameError::EndOfStream) => {
                        if self.inner.lifecycle.current() == LifecycleState::ShuttingDown {
                            info!("connection closed after shutdown, exiting run loop");
                            return Ok(());
                        }
                        warn!("client closed connection before shutdown");
                        return Err(ServerError::UnexpectedDisconnect);
                    }
                    Err(error) => {
                        error!(%error, "fatal error reading message");
                        return Err(ServerError::Frame(error));
                    }
                },
            };

            let message = match Message::classify(&payload) {
                Ok(message) => message,
                Err(error) => {
                    // No id is recoverable from an unclassifiable blob, so no
                    // error response is possible. Drop it and keep reading.
                    warn!(%error, code = error.code().code(), "dropping unclassifiable message");
                    continue;
                }
            };

            // Lifecycle notifications the dispatcher owns are processed in
            // read order, inline. A message sent right after `initialized`
            // must never observe the pre-transition state, and `exit` must
            // not count itself among the work it drains.
            match message {
                Message::Notification(notification)
                    if CORE_NOTIFICATIONS.contains(&notification.method.as_str()) =>
                {
                    self.inner.handle_core_notification(notification).await;
                }
                message => {
                    let inner = Arc::clone(&self.inner);
                    let guard = PendingWork::begin(&self.inner.pending);
                    tokio::spawn(inner.handle_message(message, cancel.child_token(), guard));
                }
            }
        }
    }
}

/// Notifications the dispatcher handles itself, in read order.
const CORE_NOTIFICATIONS: [&str; 4] = [
    methods::INITIALIZED,
    methods::EXIT,
    methods::CANCEL_REQUEST,
    methods::PROGRESS,
];

impl ServerInner {
    async fn handle_message(
        self: Arc<Self>,
        message: Message,
        cancel: CancellationToken,
        _guard: PendingWorkGuard,
    ) {
        match message {
            Message::Request(request) => self.handle_request(request, cancel).await,
            Message::Notification(notification) => {
                self.handle_notification(notification, cancel).await
            }
            Message::Response(response) => {
                // Server-initiated requests are fire-and-forget; a client
                // response to one is not correlated.
                debug!(id = %response.id, "ignoring response from client");
            }
        }
    }

    async fn handle_request(&self, request: RequestMessage, cancel: CancellationToken) {
        let RequestMessage {
            id, method, params, ..
        } = request;
        debug!(%id, %method, "--> request");

        let state = self.lifecycle.current();
        if state == LifecycleState::ShuttingDown && method != methods::SHUTDOWN {
            self.send_response(
                id,
                None,
                Some(ErrorObject::invalid_request("server is shutting down")),
            )
            .await;
            return;
        }
        if state == LifecycleState::Uninitialized && method != methods::INITIALIZE {
            self.send_response(
                id,
                None,
                Some(ErrorObject::server_not_initialized("server not initialized")),
            )
            .await;
            return;
        }
        if state == LifecycleState::Initializing && method != methods::INITIALIZE {
            self.send_response(
                id,
                None,
                Some(ErrorObject::server_not_initialized("server is initializing")),
            )
            .await;
            return;
        }

        let outcome = match method.as_str() {
            methods::INITIALIZE => self.handle_initialize(params.as_deref()),
            methods::SHUTDOWN => self.handle_shutdown(),
            _ => match self.registry.get(&method) {
                Some(handler) => {
                    let ctx = RequestContext::new(cancel);
                    (handler.invoke)(ctx, Arc::clone(&self.conn), params).await
                }
                None => {
                    debug!(%id, %method, "no handler for request method");
                    Err(ErrorObject::method_not_found(&method).into())
                }
            },
        };

        match outcome {
            Ok(result) => self.send_response(id, result, None).await,
            Err(error) => {
                // Pre-formed protocol errors travel verbatim; everything
                // else becomes an internal error carrying the display text.
                let error_object = match error.downcast::<ErrorObject>() {
                    Ok(protocol_error) => *protocol_error,
                    Err(other) => {
                        warn!(%id, %method, error = %other, "internal handler error");
                        ErrorObject::internal_error(other.to_string())
                    }
                };
                self.send_response(id, None, Some(error_object)).await;
            }
        }
    }

    /// Dispatch a user notification on its own task. No response, ever.
    async fn handle_notification(&self, notification: NotificationMessage, cancel: CancellationToken) {
        let NotificationMessage { method, params, .. } = notification;
        debug!(%method, "--> notification");

        match self.lifecycle.current() {
            LifecycleState::ShuttingDown => {
                debug!(%method, "ignoring notification during shutdown");
                return;
            }
            LifecycleState::Uninitialized | LifecycleState::Initializing => {
                debug!(%method, "ignoring notification before server is running");
                return;
            }
            LifecycleState::Running => {}
        }

        let Some(handler) = self.registry.get(&method) else {
            // Notifications unknown to the server are ignored.
            debug!(%method, "no handler for notification method, ignoring");
            return;
        };
        let ctx = RequestContext::new(cancel);
        if let Err(error) = (handler.invoke)(ctx, Arc::clone(&self.conn), params).await {
            warn!(%method, %error, "handler error processing notification");
        }
    }

    /// Dispatch one of the framework-owned notifications, inline on the read
    /// loop so lifecycle transitions are ordered with the messages around
    /// them.
    async fn handle_core_notification(&self, notification: NotificationMessage) {
        let NotificationMessage { method, params, .. } = notification;
        debug!(%method, "--> notification");

        let state = self.lifecycle.current();
        match method.as_str() {
            methods::EXIT => match state {
                LifecycleState::Uninitialized | LifecycleState::Initializing => {
                    debug!("ignoring exit notification before initialization");
                }
                LifecycleState::Running | LifecycleState::ShuttingDown => {
                    self.handle_exit().await;
                }
            },
            methods::INITIALIZED => {
                if state == LifecycleState::ShuttingDown {
                    debug!(%method, "ignoring notification during shutdown");
                } else {
                    self.handle_initialized();
                }
            }
            methods::CANCEL_REQUEST => {
                if state == LifecycleState::ShuttingDown {
                    debug!(%method, "ignoring notification during shutdown");
                } else {
                    self.handle_cancel(params.as_deref());
                }
            }
            methods::PROGRESS => {
                if state == LifecycleState::ShuttingDown {
                    debug!(%method, "ignoring notification during shutdown");
                } else {
                    self.handle_progress(params.as_deref());
                }
            }
            other => debug!(method = other, "unexpected core notification"),
        }
    }

    /// `initialize`: swap Uninitialized → Initializing and answer with the
    /// inferred capabilities. Handled synchronously; a concurrent second
    /// attempt loses the swap and gets InvalidRequest.
    fn handle_initialize(&self, params: Option<&RawValue>) -> HandlerResult<Option<Value>> {
        let params: InitializeParams = decode_params(params)?;

        if !self
            .lifecycle
            .transition(LifecycleState::Uninitialized, LifecycleState::Initializing)
        {
            warn!(state = ?self.lifecycle.current(), "rejecting repeated initialize request");
            return Err(
                ErrorObject::invalid_request("server already initialized or is shutting down")
                    .into(),
            );
        }

        if let Some(client) = &params.client_info {
            info!(
                client = %client.name,
                version = client.version.as_deref().unwrap_or(""),
                "client connected"
            );
        }

        let capabilities = infer_capabilities(&self.registry.methods(), &self.commands);
        let result = InitializeResult {
            capabilities,
            server_info: Some(self.server_info.clone()),
        };

        info!("initialize successful, waiting for initialized notification");
        encode_result(result)
    }

    /// `initialized`: advance Initializing → Running. Ignored elsewhere.
    fn handle_initialized(&self) {
        if self
            .lifecycle
            .transition(LifecycleState::Initializing, LifecycleState::Running)
        {
            info!("server transitioned to running state");
        } else {
            warn!(
                state = ?self.lifecycle.current(),
                "received initialized notification in unexpected state"
            );
        }
    }

    /// `shutdown`: enter ShuttingDown exactly once and reply null
    /// immediately. Draining happens on `exit`, not here.
    fn handle_shutdown(&self) -> HandlerResult<Option<Value>> {
        if self.lifecycle.begin_shutdown() {
            info!("server transitioning to shutdown state");
        } else {
            debug!("shutdown requested while already shutting down");
        }
        Ok(None)
    }

    /// `exit`: drain in-flight work (bounded), close the connection, and
    /// terminate. Status 0 iff a clean shutdown preceded.
    async fn handle_exit(&self) {
        let exit_code = if self.lifecycle.current() == LifecycleState::ShuttingDown {
            info!("shutdown complete, draining pending tasks before clean exit");
            0
        } else {
            warn!("exit requested without prior shutdown");
            1
        };

        if !self.pending.wait_idle(self.drain_timeout).await {
            warn!(
                in_flight = self.pending.in_flight(),
                "timed out waiting for pending tasks, exiting anyway"
            );
        }

        info!(exit_code, "closing connection and terminating");
        if let Err(error) = self.conn.close().await {
            warn!(%error, "error closing connection during exit");
        }

        (self.exit_hook)(exit_code);
    }

    /// `$/cancelRequest`: acknowledged and logged. Per-request cancellation
    /// is not wired through; handlers observe only the run loop's token.
    fn handle_cancel(&self, params: Option<&RawValue>) {
        match params {
            Some(raw) => match serde_json::from_str::<CancelParams>(raw.get()) {
                Ok(cancel) => debug!(
                    id = %cancel.id,
                    "cancellation requested; per-request cancellation is not wired through"
                ),
                Err(error) => warn!(%error, "malformed $/cancelRequest params"),
            },
            None => warn!("$/cancelRequest notification with no params"),
        }
    }

    /// `$/progress`: logged; the framework does not route progress tokens.
    fn handle_progress(&self, params: Option<&RawValue>) {
        match params {
            Some(raw) => match serde_json::from_str::<ProgressParams>(raw.get()) {
                Ok(progress) => debug!(token = %progress.token, "progress notification"),
                Err(error) => warn!(%error, "malformed $/progress params"),
            },
            None => warn!("$/progress notification with no params"),
        }
    }

    /// Emit exactly one response for a request id.
    ///
    /// Null ids never produce a response. With neither result nor error the
    /// response carries an explicit `result: null`.
    async fn send_response(
        &self,
        id: RequestId,
        result: Option<Value>,
        error: Option<ErrorObject>,
    ) {
        if id.is_null() {
            warn!("refusing to send a response without a request id");
            return;
        }

        let response = match error {
            Some(error) => ResponseMessage::error(id, error),
            None => match result {
                Some(value) => match to_raw_value(&value) {
                    Ok(raw) => ResponseMessage::success(id, raw),
                    Err(marshal_error) => {
                        warn!(%marshal_error, "failed to marshal result, sending internal error");
                        ResponseMessage::error(
                            id,
                            ErrorObject::internal_error(format!(
                                "failed to marshal result: {marshal_error}"
                            )),
                        )
                    }
                },
                None => ResponseMessage::null(id),
            },
        };

        if let Some(error) = &response.error {
            debug!(id = %response.id, code = error.code, "<-- response (error)");
        } else {
            debug!(id = %response.id, "<-- response");
        }

        if let Err(error) = self.conn.write(&Message::Response(response)).await {
            warn!(%error, "error writing response");
        }
    }
}
