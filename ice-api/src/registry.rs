//! Handler registry
//!
//! Explicit name -> handler table, built once at startup. Registering a
//! name twice is an error, never a silent overwrite.

use crate::runtime::WorkspaceRuntime;
use async_trait::async_trait;
use ice_catalog::CatalogError;
use ice_core::{ActionName, JsonMap, RequestId, WorkspaceId};
use ice_ipc::{ApiError, ApiResult};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Handler for '{0}' is already registered")]
    Duplicate(ActionName),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Duplicate(name) => ApiError::duplicate_registration(&name),
            RegistryError::Catalog(err) => err.into(),
        }
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// Everything a handler receives for one call.
#[derive(Clone)]
pub struct Invocation {
    pub action: ActionName,
    pub params: JsonMap,
    pub runtime: Arc<dyn WorkspaceRuntime>,
    /// Workspace resolved by the dispatcher, if any.
    pub workspace_id: Option<WorkspaceId>,
    pub request_id: Option<RequestId>,
}

impl Invocation {
    /// String parameter, ignoring empty values.
    pub fn str_param(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn bool_param(&self, name: &str) -> Option<bool> {
        self.params.get(name).and_then(|v| v.as_bool())
    }
}

/// An action implementation. Success yields the payload merged into
/// `{ok: true, ...}`; failure yields a coded error.
///
/// Payload keys must not collide with `RESERVED_PAYLOAD_KEYS`
/// (`ok`, `error`, `code`, `details`, `warnings`); such payloads are turned
/// into an `api.internal` failure and fire no lifecycle events.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn call(&self, invocation: Invocation) -> ApiResult<JsonMap>;
}

struct AsyncFnHandler<F>(F);

#[async_trait]
impl<F, Fut> ActionHandler for AsyncFnHandler<F>
where
    F: Fn(Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ApiResult<JsonMap>> + Send + 'static,
{
    async fn call(&self, invocation: Invocation) -> ApiResult<JsonMap> {
        (self.0)(invocation).await
    }
}

struct SyncFnHandler<F>(F);

#[async_trait]
impl<F> ActionHandler for SyncFnHandler<F>
where
    F: Fn(Invocation) -> ApiResult<JsonMap> + Send + Sync + 'static,
{
    async fn call(&self, invocation: Invocation) -> ApiResult<JsonMap> {
        (self.0)(invocation)
    }
}

/// Wrap an async closure as a handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ActionHandler>
where
    F: Fn(Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ApiResult<JsonMap>> + Send + 'static,
{
    Arc::new(AsyncFnHandler(f))
}

/// Wrap an immediate closure as a handler.
pub fn sync_handler<F>(f: F) -> Arc<dyn ActionHandler>
where
    F: Fn(Invocation) -> ApiResult<JsonMap> + Send + Sync + 'static,
{
    Arc::new(SyncFnHandler(f))
}

// ============================================================================
// REGISTRY
// ============================================================================

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<ActionName, Arc<dyn ActionHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Fails if the name is already taken.
    pub fn register(
        &mut self,
        name: impl Into<ActionName>,
        handler: Arc<dyn ActionHandler>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.handlers.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        tracing::debug!(action = %name, "Handler registered");
        self.handlers.insert(name, handler);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Sorted handler names.
    pub fn names(&self) -> Vec<ActionName> {
        let mut names: Vec<_> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ice_ipc::ErrorCode;

    fn ok_handler() -> Arc<dyn ActionHandler> {
        sync_handler(|_| Ok(JsonMap::new()))
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = HandlerRegistry::new();
        registry.register("docs.list", ok_handler()).unwrap();
        let err = registry.register("docs.list", ok_handler()).unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("docs.list".to_string()));
        assert_eq!(registry.len(), 1);

        let api: ApiError = err.into();
        assert_eq!(api.code, ErrorCode::DuplicateRegistration);
    }

    #[test]
    fn test_names_sorted() {
        let mut registry = HandlerRegistry::new();
        registry.register("b.two", ok_handler()).unwrap();
        registry.register("a.one", ok_handler()).unwrap();
        assert_eq!(registry.names(), vec!["a.one", "b.two"]);
        assert!(registry.contains("a.one"));
        assert!(registry.get("c.three").is_none());
    }
}
