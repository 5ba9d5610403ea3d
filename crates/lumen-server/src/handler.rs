//! Handler shapes and the adapters that erase them.
//!
//! A handler is registered for one method name and is drawn from a fixed sum
//! of shapes. Arguments, in order: a [`RequestContext`] (always), a
//! connection handle (optional), a parameters value (optional). Request
//! handlers return a serializable result; notification handlers return
//! nothing. Every shape may fail with any error: pre-formed
//! [`ErrorObject`]s travel to the client verbatim, anything else is wrapped
//! as an internal error by the dispatcher.
//!
//! Each constructor below fixes one shape at compile time and records the
//! shape flags on the erased [`Handler`], so the dispatcher needs no
//! signature inspection at call time.
//!
//! Parameter shapes decode with `Default` as the fallback: when the client
//! omits `params` (or sends `null`) the handler sees the shape's default
//! value. Declare `Option<T>` to observe omission as `None` instead.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::value::RawValue;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use lumen_jsonrpc::{Connection, ErrorObject};

/// Any error a handler can produce.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by handler functions.
pub type HandlerResult<T> = Result<T, BoxError>;

/// The execution context passed to every handler.
///
/// Carries the cancellable scope of the invocation: the token trips when the
/// server's run loop is cancelled. Long-running handlers should poll it.
#[derive(Debug, Clone)]
pub struct RequestContext {
    cancel: CancellationToken,
}

impl RequestContext {
    pub(crate) fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Whether the invocation's scope has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when the invocation's scope is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

type InvokeFn = Box<
    dyn Fn(
            RequestContext,
            Arc<Connection>,
            Option<Box<RawValue>>,
        ) -> BoxFuture<'static, HandlerResult<Option<Value>>>
        + Send
        + Sync,
>;

/// A registered handler: the erased callable plus its validated shape.
pub struct Handler {
    pub(crate) invoke: InvokeFn,
    pub(crate) takes_conn: bool,
    pub(crate) takes_params: bool,
    pub(crate) returns_result: bool,
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler")
            .field("takes_conn", &self.takes_conn)
            .field("takes_params", &self.takes_params)
            .field("returns_result", &self.returns_result)
            .finish()
    }
}

/// Decode a raw payload into the handler's declared shape.
///
/// Absent or `null` params yield the shape's default value; a decode failure
/// is an InvalidParams protocol error.
pub(crate) fn decode_params<P: DeserializeOwned + Default>(
    params: Option<&RawValue>,
) -> Result<P, BoxError> {
    match params {
        Some(raw) if raw.get() != "null" => serde_json::from_str(raw.get()).map_err(|e| {
            BoxError::from(ErrorObject::invalid_params(format!(
                "failed to decode params: {e}"
            )))
        }),
        _ => Ok(P::default()),
    }
}

/// Reject a non-null payload sent to a handler that declares no parameters.
fn reject_unexpected_params(params: Option<&RawValue>) -> Result<(), BoxError> {
    if let Some(raw) = params {
        if raw.get() != "null" {
            return Err(ErrorObject::invalid_params("method received unexpected parameters").into());
        }
    }
    Ok(())
}

/// Marshal a handler's result for the response.
pub(crate) fn encode_result<R: Serialize>(result: R) -> HandlerResult<Option<Value>> {
    serde_json::to_value(result).map(Some).map_err(|e| {
        BoxError::from(ErrorObject::internal_error(format!(
            "failed to marshal result: {e}"
        )))
    })
}

/// A request handler taking decoded parameters: `(ctx, params) -> result`.
pub fn request<P, R, F, Fut>(f: F) -> Handler
where
    P: DeserializeOwned + Default + Send + 'static,
    R: Serialize + 'static,
    F: Fn(RequestContext, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<R>> + Send + 'static,
{
    let f = Arc::new(f);
    Handler {
        invoke: Box::new(move |ctx, _conn, params| {
            let f = Arc::clone(&f);
            Box::pin(async move {
                let params = decode_params::<P>(params.as_deref())?;
                encode_result(f(ctx, params).await?)
            })
        }),
        takes_conn: false,
        takes_params: true,
        returns_result: true,
    }
}

/// A request handler declaring no parameters: `(ctx) -> result`.
///
/// A non-null payload sent to it is answered with InvalidParams.
pub fn request_no_params<R, F, Fut>(f: F) -> Handler
where
    R: Serialize + 'static,
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<R>> + Send + 'static,
{
    let f = Arc::new(f);
    Handler {
        invoke: Box::new(move |ctx, _conn, params| {
            let f = Arc::clone(&f);
            Box::pin(async move {
                reject_unexpected_params(params.as_deref())?;
                encode_result(f(ctx).await?)
            })
        }),
        takes_conn: false,
        takes_params: false,
        returns_result: true,
    }
}

/// A request handler that also emits outbound traffic:
/// `(ctx, conn, params) -> result`.
pub fn request_with_conn<P, R, F, Fut>(f: F) -> Handler
where
    P: DeserializeOwned + Default + Send + 'static,
    R: Serialize + 'static,
    F: Fn(RequestContext, Arc<Connection>, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<R>> + Send + 'static,
{
    let f = Arc::new(f);
    Handler {
        invoke: Box::new(move |ctx, conn, params| {
            let f = Arc::clone(&f);
            Box::pin(async move {
                let params = decode_params::<P>(params.as_deref())?;
                encode_result(f(ctx, conn, params).await?)
            })
        }),
        takes_conn: true,
        takes_params: true,
        returns_result: true,
    }
}

/// A notification handler taking decoded parameters: `(ctx, params)`.
pub fn notification<P, F, Fut>(f: F) -> Handler
where
    P: DeserializeOwned + Default + Send + 'static,
    F: Fn(RequestContext, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<()>> + Send + 'static,
{
    let f = Arc::new(f);
    Handler {
        invoke: Box::new(move |ctx, _conn, params| {
            let f = Arc::clone(&f);
            Box::pin(async move {
                let params = decode_params::<P>(params.as_deref())?;
                f(ctx, params).await?;
                Ok(None)
            })
        }),
        takes_conn: false,
        takes_params: true,
        returns_result: false,
    }
}

/// A notification handler declaring no parameters: `(ctx)`.
pub fn notification_no_params<F, Fut>(f: F) -> Handler
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<()>> + Send + 'static,
{
    let f = Arc::new(f);
    Handler {
        invoke: Box::new(move |ctx, _conn, params| {
            let f = Arc::clone(&f);
            Box::pin(async move {
                reject_unexpected_params(params.as_deref())?;
                f(ctx).await?;
                Ok(None)
            })
        }),
        takes_conn: false,
        takes_params: false,
        returns_result: false,
    }
}

/// A notification handler that also emits outbound traffic:
/// `(ctx, conn, params)`.
pub fn notification_with_conn<P, F, Fut>(f: F) -> Handler
where
    P: DeserializeOwned + Default + Send + 'static,
    F: Fn(RequestContext, Arc<Connection>, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<()>> + Send + 'static,
{
    let f = Arc::new(f);
    Handler {
        invoke: Box::new(move |ctx, conn, params| {
            let f = Arc::clone(&f);
            Box::pin(async move {
                let params = decode_params::<P>(params.as_deref())?;
                f(ctx, conn, params).await?;
                Ok(None)
            })
        }),
        takes_conn: true,
        takes_params: true,
        returns_result: false,
    }
}

/// The escape hatch: a request handler receiving the raw, undecoded payload.
///
/// Returns `None` for a `result: null` response.
pub fn raw<F, Fut>(f: F) -> Handler
where
    F: Fn(RequestContext, Arc<Connection>, Option<Box<RawValue>>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<Option<Value>>> + Send + 'static,
{
    let f = Arc::new(f);
    Handler {
        invoke: Box::new(move |ctx, conn, params| {
            let f = Arc::clone(&f);
            Box::pin(async move { f(ctx, conn, params).await })
        }),
        takes_conn: true,
        takes_params: true,
        returns_result: true,
    }
}
