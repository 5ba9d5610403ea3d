//! # JSON-RPC 2.0 Wire Layer
//!
//! A transport-level JSON-RPC 2.0 implementation for editor protocols that
//! frame messages with `Content-Length` headers over a duplex byte stream
//! (the encoding used by the Language Server Protocol).
//!
//! This crate provides the pieces below the dispatcher:
//!
//! - **Framing codec**: [`MessageReader`] / [`MessageWriter`] read and write
//!   `Content-Length`-prefixed payloads on any tokio byte stream.
//! - **Envelope types**: [`RequestMessage`], [`NotificationMessage`],
//!   [`ResponseMessage`] with identifiers preserved byte-for-byte.
//! - **Classification**: [`Message::classify`] partially decodes an inbound
//!   payload to decide whether it is a request, notification, or response.
//! - **Connection handle**: [`Connection`] serializes concurrent writers
//!   through a single mutex so frames are never torn.
//!
//! Dispatch, lifecycle, and handler typing live in `lumen-server`; payload
//! schemas live in `lumen-protocol`. Identifiers and parameters are carried
//! as [`serde_json::value::RawValue`] so the envelope is interpreted exactly
//! once and response ids echo the request ids bit for bit.

pub mod codec;
pub mod connection;
pub mod error;
pub mod message;
pub mod types;

pub use codec::{FrameError, MessageReader, MessageWriter};
pub use connection::Connection;
pub use error::{ErrorCode, ErrorObject};
pub use message::{ClassifyError, Message, NotificationMessage, RequestMessage, ResponseMessage};
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes, plus the LSP extensions
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;

    // LSP-specific codes
    pub const SERVER_NOT_INITIALIZED: i64 = -32002;
    pub const REQUEST_CANCELLED: i64 = -32800;
    pub const CONTENT_MODIFIED: i64 = -32801;
}
