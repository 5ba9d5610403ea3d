//! Derives the advertised capability descriptor from the registered methods.

use std::collections::HashSet;

use lumen_protocol::capabilities::{
    CodeActionOptions, CompletionOptions, DefinitionOptions, ExecuteCommandOptions, HoverOptions,
    SaveOptions, ServerCapabilities, TextDocumentSyncKind, TextDocumentSyncOptions,
};
use lumen_protocol::methods;

/// Compute the capability set to advertise from `initialize`.
///
/// A capability is claimed iff a handler for its method is registered, so the
/// descriptor never promises an operation the dispatcher would answer with
/// MethodNotFound. The document-sync change kind is always Full; servers
/// wanting incremental sync override the descriptor in their own initialize
/// path once the framework grows that hook.
pub(crate) fn infer_capabilities(
    registered: &HashSet<String>,
    commands: &[String],
) -> ServerCapabilities {
    let has = |method: &str| registered.contains(method);

    let mut capabilities = ServerCapabilities::default();

    let has_open = has(methods::TEXT_DOCUMENT_DID_OPEN);
    let has_change = has(methods::TEXT_DOCUMENT_DID_CHANGE);
    let has_close = has(methods::TEXT_DOCUMENT_DID_CLOSE);
    let has_save = has(methods::TEXT_DOCUMENT_DID_SAVE);

    if has_open || has_change || has_close || has_save {
        capabilities.text_document_sync = Some(TextDocumentSyncOptions {
            open_close: Some(has_open || has_close),
            change: Some(TextDocumentSyncKind::FULL),
            save: has_save.then(|| SaveOptions {
                include_text: Some(false),
            }),
        });
    }

    if has(methods::TEXT_DOCUMENT_HOVER) {
        capabilities.hover_provider = Some(HoverOptions::default());
    }

    if has(methods::TEXT_DOCUMENT_COMPLETION) {
        capabilities.completion_provider = Some(CompletionOptions {
            resolve_provider: has(methods::COMPLETION_ITEM_RESOLVE).then_some(true),
            trigger_characters: None,
        });
    }

    if has(methods::TEXT_DOCUMENT_DEFINITION) {
        capabilities.definition_provider = Some(DefinitionOptions::default());
    }

    if has(methods::TEXT_DOCUMENT_CODE_ACTION) {
        capabilities.code_action_provider = Some(CodeActionOptions {
            resolve_provider: has(methods::CODE_ACTION_RESOLVE).then_some(true),
            ..Default::default()
        });
    }

    if has(methods::WORKSPACE_EXECUTE_COMMAND) {
        capabilities.execute_command_provider = Some(ExecuteCommandOptions {
            commands: commands.to_vec(),
            ..Default::default()
        });
    }

    capabilities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn methods_of(names: &[&str]) -> HashSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_no_handlers_no_capabilities() {
        let capabilities = infer_capabilities(&HashSet::new(), &[]);
        let json = serde_json::to_string(&capabilities).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_document_sync_from_open_close() {
        let capabilities = infer_capabilities(
            &methods_of(&[
                methods::TEXT_DOCUMENT_DID_OPEN,
                methods::TEXT_DOCUMENT_DID_CHANGE,
                methods::TEXT_DOCUMENT_DID_CLOSE,
            ]),
            &[],
        );

        let sync = capabilities.text_document_sync.unwrap();
        assert_eq!(sync.open_close, Some(true));
        assert_eq!(sync.change, Some(TextDocumentSyncKind::FULL));
        assert!(sync.save.is_none());
    }

    #[test]
    fn test_save_suboption() {
        let capabilities =
            infer_capabilities(&methods_of(&[methods::TEXT_DOCUMENT_DID_SAVE]), &[]);

        let sync = capabilities.text_document_sync.unwrap();
        assert_eq!(sync.open_close, Some(false));
        assert!(sync.save.is_some());
    }

    #[test]
    fn test_code_action_with_resolve_and_nothing_else() {
        let capabilities = infer_capabilities(
            &methods_of(&[
                methods::TEXT_DOCUMENT_CODE_ACTION,
                methods::CODE_ACTION_RESOLVE,
            ]),
            &[],
        );

        let code_action = capabilities.code_action_provider.unwrap();
        assert_eq!(code_action.resolve_provider, Some(true));
        assert!(capabilities.hover_provider.is_none());
        assert!(capabilities.completion_provider.is_none());
        assert!(capabilities.text_document_sync.is_none());
    }

    #[test]
    fn test_completion_without_resolve() {
        let capabilities =
            infer_capabilities(&methods_of(&[methods::TEXT_DOCUMENT_COMPLETION]), &[]);

        let completion = capabilities.completion_provider.unwrap();
        assert!(completion.resolve_provider.is_none());
    }

    #[test]
    fn test_execute_command_lists_user_commands() {
        let commands = vec!["lumen/applyFix".to_string()];
        let capabilities = infer_capabilities(
            &methods_of(&[methods::WORKSPACE_EXECUTE_COMMAND]),
            &commands,
        );

        let provider = capabilities.execute_command_provider.unwrap();
        assert_eq!(provider.commands, commands);
    }

    #[test]
    fn test_hover_and_definition_simple_providers() {
        let capabilities = infer_capabilities(
            &methods_of(&[
                methods::TEXT_DOCUMENT_HOVER,
                methods::TEXT_DOCUMENT_DEFINITION,
            ]),
            &[],
        );

        assert!(capabilities.hover_provider.is_some());
        assert!(capabilities.definition_provider.is_some());
    }
}
