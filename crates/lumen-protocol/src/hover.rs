//! Hover request payloads.

use serde::{Deserialize, Serialize};

use crate::types::{MarkupContent, Range, TextDocumentPositionParams};

/// Parameters of the textDocument/hover request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoverParams {
    #[serde(flatten)]
    pub text_document_position: TextDocumentPositionParams,
}

/// Result of the textDocument/hover request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hover {
    pub contents: MarkupContent,
    /// The range the hover applies to, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}
