//! Code-action request payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Diagnostic;
use crate::types::{Command, Range, TextDocumentIdentifier, WorkspaceEdit};

/// Parameters of the textDocument/codeAction request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeActionParams {
    /// The document in which the command was invoked.
    pub text_document: TextDocumentIdentifier,
    /// The range for which the command was invoked.
    pub range: Range,
    pub context: CodeActionContext,
}

/// Additional context for a code-action request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeActionContext {
    /// Diagnostics known on the client side overlapping the range.
    pub diagnostics: Vec<Diagnostic>,
    /// Requested kinds; empty means all. The client filters by these before
    /// showing actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only: Option<Vec<CodeActionKind>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_kind: Option<CodeActionTriggerKind>,
}

/// How a code action was triggered: 1 invoked, 2 automatic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeActionTriggerKind(pub i32);

impl CodeActionTriggerKind {
    pub const INVOKED: CodeActionTriggerKind = CodeActionTriggerKind(1);
    pub const AUTOMATIC: CodeActionTriggerKind = CodeActionTriggerKind(2);
}

/// The kind of a code action. Kinds are hierarchical dotted identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeActionKind(pub String);

impl CodeActionKind {
    pub const EMPTY: &'static str = "";
    pub const QUICK_FIX: &'static str = "quickfix";
    pub const REFACTOR: &'static str = "refactor";
    pub const REFACTOR_EXTRACT: &'static str = "refactor.extract";
    pub const REFACTOR_INLINE: &'static str = "refactor.inline";
    pub const REFACTOR_REWRITE: &'static str = "refactor.rewrite";
    pub const SOURCE: &'static str = "source";
    pub const SOURCE_ORGANIZE_IMPORTS: &'static str = "source.organizeImports";
    pub const SOURCE_FIX_ALL: &'static str = "source.fixAll";

    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A potential change to a document, offered to the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeAction {
    /// A short, human-readable title for this action.
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<CodeActionKind>,
    /// The diagnostics this action resolves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Vec<Diagnostic>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_preferred: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<CodeActionDisabled>,
    /// The workspace edit this action performs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit: Option<WorkspaceEdit>,
    /// A command to execute after the edit, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Command>,
    /// Preserved between codeAction and codeAction/resolve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Marks a code action as disabled, with a human-readable reason.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeActionDisabled {
    pub reason: String,
}
