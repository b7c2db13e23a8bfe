/// Method registry
/// Maps method names to handlers; shared by every request-handling task
use crate::server::jsonrpc::{JsonRpcError, JsonRpcRequest};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

/// Method-specific request handler
#[cfg_attr(test, mockall::automock)]
pub trait Handler: Send + Sync {
    /// Produce the result value for a request, or the error to report
    fn handle(&self, request: &JsonRpcRequest) -> Result<Value, JsonRpcError>;
}

impl<F> Handler for F
where
    F: Fn(&JsonRpcRequest) -> Result<Value, JsonRpcError> + Send + Sync,
{
    fn handle(&self, request: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
        self(request)
    }
}

/// Registry errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("method already registered: {method:?}")]
    MethodAlreadyRegistered { method: String },
}

/// Concurrency-safe method table: shared lookups, exclusive registration
#[derive(Default)]
pub struct Registry {
    handlers: RwLock<HashMap<String, Arc<dyn Handler>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `method`.
    ///
    /// Fails if the name is already taken; the existing handler is kept.
    pub fn register<H>(&self, method: impl Into<String>, handler: H) -> Result<(), RegistryError>
    where
        H: Handler + 'static,
    {
        let method = method.into();
        // A poisoned map is still consistent: every mutation is a single insert.
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);

        if handlers.contains_key(&method) {
            warn!(method = %method, "Rejected duplicate method registration");
            return Err(RegistryError::MethodAlreadyRegistered { method });
        }

        info!(method = %method, "Registered method");
        handlers.insert(method, Arc::new(handler));
        Ok(())
    }

    /// Look up the handler for `method`
    pub fn get(&self, method: &str) -> Option<Arc<dyn Handler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(method)
            .cloned()
    }

    pub fn contains(&self, method: &str) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(method)
    }

    pub fn len(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered method names, sorted
    pub fn methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("methods", &self.methods())
            .finish()
    }
}
