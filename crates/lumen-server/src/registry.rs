use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use tracing::debug;

use lumen_protocol::methods;

use crate::handler::Handler;
use crate::server::ServerError;

/// Method names the dispatcher owns; user handlers cannot shadow them.
pub(crate) const CORE_METHODS: [&str; 6] = [
    methods::INITIALIZE,
    methods::INITIALIZED,
    methods::SHUTDOWN,
    methods::EXIT,
    methods::CANCEL_REQUEST,
    methods::PROGRESS,
];

/// The method → handler map.
///
/// Writes happen during single-threaded setup, before the read loop starts;
/// after that the map is only read, concurrently, from handler tasks. The
/// `Server` is consumed by `run`, so late registration is unrepresentable.
pub(crate) struct HandlerRegistry {
    handlers: RwLock<HashMap<String, Arc<Handler>>>,
}

impl HandlerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn register(&self, method: &str, handler: Handler) -> Result<(), ServerError> {
        if CORE_METHODS.contains(&method) {
            return Err(ServerError::DuplicateHandler(method.to_string()));
        }

        let mut handlers = self.handlers.write().expect("registry lock poisoned");
        if handlers.contains_key(method) {
            return Err(ServerError::DuplicateHandler(method.to_string()));
        }

        debug!(
            method,
            takes_conn = handler.takes_conn,
            takes_params = handler.takes_params,
            returns_result = handler.returns_result,
            "registered handler"
        );
        handlers.insert(method.to_string(), Arc::new(handler));
        Ok(())
    }

    pub(crate) fn get(&self, method: &str) -> Option<Arc<Handler>> {
        self.handlers
            .read()
            .expect("registry lock poisoned")
            .get(method)
            .cloned()
    }

    /// The set of registered method names, for capability inference.
    pub(crate) fn methods(&self) -> HashSet<String> {
        self.handlers
            .read()
            .expect("registry lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler;
    use crate::handler::BoxError;

    fn ping() -> Handler {
        handler::request_no_params(|_ctx| async move { Ok::<_, BoxError>("pong") })
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = HandlerRegistry::new();
        registry.register("textDocument/hover", ping()).unwrap();

        assert!(registry.get("textDocument/hover").is_some());
        assert!(registry.get("textDocument/definition").is_none());
        assert!(registry.methods().contains("textDocument/hover"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = HandlerRegistry::new();
        registry.register("textDocument/hover", ping()).unwrap();

        let err = registry.register("textDocument/hover", ping()).unwrap_err();
        assert!(matches!(err, ServerError::DuplicateHandler(method) if method == "textDocument/hover"));
    }

    #[test]
    fn test_core_methods_cannot_be_shadowed() {
        let registry = HandlerRegistry::new();
        for method in CORE_METHODS {
            let err = registry.register(method, ping()).unwrap_err();
            assert!(matches!(err, ServerError::DuplicateHandler(_)));
        }
    }
}
