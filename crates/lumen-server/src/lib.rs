//! # Lumen Language Server Framework
//!
//! A framework for building language servers in Rust. It speaks framed
//! JSON-RPC 2.0 over any duplex byte stream and dispatches messages to
//! registered handlers with decoded, strongly shaped parameters.
//!
//! The framework owns the hard parts of the message plane:
//!
//! - **Dispatch**: one task per inbound message; requests get exactly one
//!   response with the original id echoed byte-for-byte, notifications get
//!   none.
//! - **Lifecycle**: the uninitialized → initializing → running →
//!   shutting-down state machine, enforced by gating every inbound method
//!   against the current state.
//! - **Capability inference**: the initialize response advertises exactly
//!   what the registered handler set can serve.
//! - **Graceful termination**: `shutdown` answers immediately; `exit` drains
//!   in-flight handlers (bounded) and terminates with status 0 after a clean
//!   shutdown, 1 otherwise.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use lumen_server::{handler, Server};
//! use lumen_protocol::hover::{Hover, HoverParams};
//! use lumen_protocol::types::{MarkupContent, MarkupKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::builder()
//!         .name("hello-lsp")
//!         .version("0.1.0")
//!         .build_stdio();
//!
//!     server.register(
//!         "textDocument/hover",
//!         handler::request(|_ctx, _params: HoverParams| async move {
//!             Ok(Some(Hover {
//!                 contents: MarkupContent {
//!                     kind: MarkupKind::PlainText,
//!                     value: "hello from lumen".to_string(),
//!                 },
//!                 range: None,
//!             }))
//!         }),
//!     )?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! Handlers are registered before `run`; `run` consumes the server, so the
//! registry is immutable while the read loop is live. Handler shapes and the
//! rules for parameter decoding live in [`handler`].

pub mod builder;
pub mod client;
pub mod handler;
pub mod server;

mod capabilities;
mod lifecycle;
mod registry;

pub use builder::ServerBuilder;
pub use client::{ApplyWorkspaceEditParams, ConnectionExt};
pub use handler::{BoxError, Handler, HandlerResult, RequestContext};
pub use lifecycle::LifecycleState;
pub use server::{Server, ServerError};

// Re-export the layers below for single-crate consumption.
pub use lumen_jsonrpc::{Connection, ErrorCode, ErrorObject, FrameError, RequestId};
pub use lumen_protocol as protocol;
