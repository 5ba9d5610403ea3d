//! Method-name constants for the protocol operations the framework consults.

// General lifecycle
pub const INITIALIZE: &str = "initialize";
pub const INITIALIZED: &str = "initialized";
pub const SHUTDOWN: &str = "shutdown";
pub const EXIT: &str = "exit";
pub const CANCEL_REQUEST: &str = "$/cancelRequest";
pub const PROGRESS: &str = "$/progress";

// Text document synchronization
pub const TEXT_DOCUMENT_DID_OPEN: &str = "textDocument/didOpen";
pub const TEXT_DOCUMENT_DID_CHANGE: &str = "textDocument/didChange";
pub const TEXT_DOCUMENT_DID_SAVE: &str = "textDocument/didSave";
pub const TEXT_DOCUMENT_DID_CLOSE: &str = "textDocument/didClose";

// Language features
pub const TEXT_DOCUMENT_HOVER: &str = "textDocument/hover";
pub const TEXT_DOCUMENT_COMPLETION: &str = "textDocument/completion";
pub const COMPLETION_ITEM_RESOLVE: &str = "completionItem/resolve";
pub const TEXT_DOCUMENT_DEFINITION: &str = "textDocument/definition";
pub const TEXT_DOCUMENT_CODE_ACTION: &str = "textDocument/codeAction";
pub const CODE_ACTION_RESOLVE: &str = "codeAction/resolve";

// Workspace features
pub const WORKSPACE_EXECUTE_COMMAND: &str = "workspace/executeCommand";
pub const WORKSPACE_APPLY_EDIT: &str = "workspace/applyEdit";

// Window features
pub const WINDOW_SHOW_MESSAGE: &str = "window/showMessage";
pub const WINDOW_SHOW_MESSAGE_REQUEST: &str = "window/showMessageRequest";
pub const WINDOW_LOG_MESSAGE: &str = "window/logMessage";

// Diagnostics
pub const TEXT_DOCUMENT_PUBLISH_DIAGNOSTICS: &str = "textDocument/publishDiagnostics";
