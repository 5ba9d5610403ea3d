use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error_codes;

/// JSON-RPC error codes, including the LSP-defined extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ServerNotInitialized,
    RequestCancelled,
    ContentModified,
    ServerError(i64), // -32099 to -32000
}

impl ErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            ErrorCode::ParseError => error_codes::PARSE_ERROR,
            ErrorCode::InvalidRequest => error_codes::INVALID_REQUEST,
            ErrorCode::MethodNotFound => error_codes::METHOD_NOT_FOUND,
            ErrorCode::InvalidParams => error_codes::INVALID_PARAMS,
            ErrorCode::InternalError => error_codes::INTERNAL_ERROR,
            ErrorCode::ServerNotInitialized => error_codes::SERVER_NOT_INITIALIZED,
            ErrorCode::RequestCancelled => error_codes::REQUEST_CANCELLED,
            ErrorCode::ContentModified => error_codes::CONTENT_MODIFIED,
            ErrorCode::ServerError(code) => *code,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidRequest => "Invalid Request",
            ErrorCode::MethodNotFound => "Method not found",
            ErrorCode::InvalidParams => "Invalid params",
            ErrorCode::InternalError => "Internal error",
            ErrorCode::ServerNotInitialized => "Server not initialized",
            ErrorCode::RequestCancelled => "Request cancelled",
            ErrorCode::ContentModified => "Content modified",
            ErrorCode::ServerError(_) => "Server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// The wire-level JSON-RPC error object: `{code, message, data?}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            ErrorCode::MethodNotFound,
            format!("method not found: {method}"),
        )
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn server_not_initialized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServerNotInitialized, message)
    }
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorObject {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::ParseError.code(), -32700);
        assert_eq!(ErrorCode::MethodNotFound.code(), -32601);
        assert_eq!(ErrorCode::ServerNotInitialized.code(), -32002);
        assert_eq!(ErrorCode::RequestCancelled.code(), -32800);
        assert_eq!(ErrorCode::ServerError(-32050).code(), -32050);
    }

    #[test]
    fn test_method_not_found_message() {
        let error = ErrorObject::method_not_found("textDocument/definition");
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "method not found: textDocument/definition");
    }

    #[test]
    fn test_data_omitted_when_absent() {
        let json = serde_json::to_string(&ErrorObject::internal_error("boom")).unwrap();
        assert!(!json.contains("\"data\""));
    }
}
