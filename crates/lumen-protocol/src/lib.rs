//! # Language Server Protocol Types
//!
//! Payload types for the subset of the Language Server Protocol the Lumen
//! framework core touches: the lifecycle handshake, the capability
//! descriptor, and the common payload families (document sync, diagnostics,
//! hover, completion, code actions, window messages).
//!
//! All types serialize with the wire's camelCase field names and omit
//! optional fields that are unset. Numeric protocol enums (sync kinds,
//! severities, completion kinds) are transparent newtypes over their wire
//! integers so unknown values survive a round trip.
//!
//! The set is intentionally not the whole protocol. Anything a concrete
//! server needs beyond it decodes cleanly through handler-declared shapes of
//! its own.

pub mod capabilities;
pub mod code_action;
pub mod completion;
pub mod document;
pub mod hover;
pub mod lifecycle;
pub mod methods;
pub mod types;
pub mod window;

pub use capabilities::{
    CodeActionOptions, CompletionOptions, DefinitionOptions, ExecuteCommandOptions, HoverOptions,
    SaveOptions, ServerCapabilities, TextDocumentSyncKind, TextDocumentSyncOptions,
    WorkDoneProgressOptions,
};
pub use code_action::{
    CodeAction, CodeActionContext, CodeActionDisabled, CodeActionKind, CodeActionParams,
    CodeActionTriggerKind,
};
pub use completion::{
    CompletionItem, CompletionItemKind, CompletionList, CompletionParams, InsertTextFormat,
};
pub use document::{
    Diagnostic, DiagnosticSeverity, DidChangeTextDocumentParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, DidSaveTextDocumentParams, PublishDiagnosticsParams,
    TextDocumentContentChangeEvent,
};
pub use hover::{Hover, HoverParams};
pub use lifecycle::{
    CancelParams, ClientCapabilities, ClientInfo, InitializeParams, InitializeResult,
    InitializedParams, ProgressParams, ServerInfo, WorkspaceFolder,
};
pub use types::{
    Command, DocumentUri, Location, MarkupContent, MarkupKind, Position, Range, TextDocumentItem,
    TextDocumentIdentifier, TextDocumentPositionParams, TextEdit,
    VersionedTextDocumentIdentifier, WorkspaceEdit,
};
pub use window::{
    LogMessageParams, MessageActionItem, MessageType, ShowMessageParams, ShowMessageRequestParams,
};
