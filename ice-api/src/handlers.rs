//! Built-in action handlers
//!
//! Workspace lifecycle, documentation browsing, the chat placeholder and
//! catalog introspection. Hosts add their own handlers next to these.

use crate::config::DispatchConfig;
use crate::chat::CHAT_STREAM_ACTION;
use crate::introspection::CatalogSnapshot;
use crate::registry::{handler_fn, sync_handler, HandlerRegistry, Invocation, RegistryError};
use crate::runtime::NewWorkspace;
use ice_catalog::Catalog;
use ice_core::JsonMap;
use ice_ipc::{ApiError, ApiResult, ErrorCode};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Workspace type used by `workspace.create` when none is given.
pub const DEFAULT_CREATED_WORKSPACE_TYPE: &str = "multi_agent";

fn payload(value: Value) -> JsonMap {
    match value {
        Value::Object(map) => map,
        _ => JsonMap::new(),
    }
}

fn require_workspace_id(invocation: &Invocation) -> ApiResult<String> {
    invocation
        .str_param("workspace_id")
        .map(str::to_string)
        .ok_or_else(|| ApiError::missing_workspace(&invocation.action))
}

// ============================================================================
// WORKSPACE HANDLERS
// ============================================================================

async fn workspace_list(invocation: Invocation) -> ApiResult<JsonMap> {
    let workspaces: Vec<Value> = invocation
        .runtime
        .list_workspaces()?
        .into_iter()
        .map(|ws| json!({ "id": ws.id, "path": ws.root.display().to_string() }))
        .collect();
    Ok(payload(json!({ "workspaces": workspaces })))
}

async fn workspace_create(invocation: Invocation) -> ApiResult<JsonMap> {
    let name = invocation
        .str_param("name")
        .map(str::to_string)
        .unwrap_or_else(|| format!("workspace-{}", chrono::Utc::now().timestamp()));
    let description = invocation.str_param("description").unwrap_or_default().to_string();
    let tags = invocation
        .params
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let workspace_type = invocation
        .str_param("type")
        .unwrap_or(DEFAULT_CREATED_WORKSPACE_TYPE)
        .to_string();

    let ws = invocation
        .runtime
        .create_workspace(NewWorkspace {
            name,
            description,
            tags,
            workspace_type,
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "workspace.create failed");
            ApiError::from(e)
        })?;

    Ok(payload(json!({
        "workspace_id": ws.id,
        "name": ws.name,
        "root": ws.root.display().to_string(),
        "workspace_type": ws.workspace_type,
        "backends": ws.backends,
    })))
}

async fn workspace_load(invocation: Invocation) -> ApiResult<JsonMap> {
    let wid = require_workspace_id(&invocation)?;
    let ctx = invocation.runtime.activate_workspace(&wid).await?;
    let ws = invocation.runtime.get_workspace(&wid)?;
    Ok(payload(json!({
        "workspace_id": ws.id,
        "context_id": ctx.context_id,
        "workspace_type": ws.workspace_type,
        "project_root": ws.root.display().to_string(),
    })))
}

async fn workspace_unload(invocation: Invocation) -> ApiResult<JsonMap> {
    let wid = require_workspace_id(&invocation)?;
    invocation.runtime.deactivate_workspace(&wid).await?;
    Ok(payload(json!({ "workspace_id": wid })))
}

async fn workspace_delete(invocation: Invocation) -> ApiResult<JsonMap> {
    let wid = require_workspace_id(&invocation)?;
    let delete_from_disk = invocation.bool_param("delete_from_disk").unwrap_or(true);
    invocation
        .runtime
        .delete_workspace(&wid, delete_from_disk)
        .await?;
    Ok(payload(json!({ "workspace_id": wid })))
}

// ============================================================================
// DOCUMENTATION
// ============================================================================

/// One directory of the documentation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocsEntry {
    /// Path relative to the docs root, `.` for the root itself.
    pub path: String,
    pub dirs: Vec<String>,
    /// Markdown files only.
    pub files: Vec<String>,
}

/// Read-only view of a markdown documentation tree.
#[derive(Debug, Clone)]
pub struct DocsLibrary {
    root: PathBuf,
}

impl DocsLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the tree, parents before children, names sorted.
    /// A missing root yields an empty listing.
    pub fn list(&self) -> std::io::Result<Vec<DocsEntry>> {
        let mut entries = Vec::new();
        if self.root.is_dir() {
            self.walk(Path::new(""), &mut entries)?;
        }
        Ok(entries)
    }

    fn walk(&self, rel: &Path, out: &mut Vec<DocsEntry>) -> std::io::Result<()> {
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(self.root.join(rel))? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_dir() {
                dirs.push(name);
            } else if name.ends_with(".md") {
                files.push(name);
            }
        }
        dirs.sort();
        files.sort();

        let path = if rel.as_os_str().is_empty() {
            ".".to_string()
        } else {
            rel.display().to_string()
        };
        out.push(DocsEntry {
            path,
            dirs: dirs.clone(),
            files,
        });

        for dir in dirs {
            self.walk(&rel.join(dir), out)?;
        }
        Ok(())
    }

    /// Read one markdown document by its path relative to the root.
    pub fn read(&self, path: &str) -> ApiResult<String> {
        let rel = Path::new(path);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(ApiError::new(
                ErrorCode::PermissionDenied,
                format!("Document path outside docs root: {}", path),
            )
            .with_details(json!({ "path": path })));
        }
        if rel.extension().and_then(|e| e.to_str()) != Some("md") {
            return Err(ApiError::new(
                ErrorCode::InvalidParameters,
                format!("Only markdown documents can be read: {}", path),
            )
            .with_details(json!({ "path": path })));
        }

        let target = self.root.join(rel);
        if !target.is_file() {
            return Err(ApiError::generic(format!("Doc not found: {}", path)));
        }
        std::fs::read_to_string(&target).map_err(|e| {
            tracing::error!(path, error = %e, "docs.read failed");
            ApiError::generic("Unable to load document")
        })
    }
}

fn docs_list(docs: &DocsLibrary) -> ApiResult<JsonMap> {
    let tree = docs.list().map_err(|e| {
        tracing::error!(root = %docs.root().display(), error = %e, "docs.list failed");
        ApiError::from(e)
    })?;
    Ok(payload(json!({ "docs": tree })))
}

fn docs_read(docs: &DocsLibrary, invocation: &Invocation) -> ApiResult<JsonMap> {
    let path = invocation.str_param("path").ok_or_else(|| {
        ApiError::new(ErrorCode::InvalidParameters, "Missing document path")
            .with_details(json!({ "action": invocation.action }))
    })?;
    let content = docs.read(path)?;
    Ok(payload(json!({ "content": content })))
}

// ============================================================================
// REGISTRATION
// ============================================================================

/// Registry holding every built-in handler.
///
/// `system.catalog.describe` reports `api.capability.unavailable` when no
/// catalog is supplied.
pub fn builtin_registry(
    config: &DispatchConfig,
    catalog: Option<Arc<Catalog>>,
) -> Result<HandlerRegistry, RegistryError> {
    let mut registry = HandlerRegistry::new();
    register_builtin_handlers(&mut registry, config, catalog)?;
    Ok(registry)
}

pub fn register_builtin_handlers(
    registry: &mut HandlerRegistry,
    config: &DispatchConfig,
    catalog: Option<Arc<Catalog>>,
) -> Result<(), RegistryError> {
    registry.register("workspace.list", handler_fn(workspace_list))?;
    registry.register("workspace.create", handler_fn(workspace_create))?;
    registry.register("workspace.load", handler_fn(workspace_load))?;
    registry.register("workspace.unload", handler_fn(workspace_unload))?;
    registry.register("workspace.delete", handler_fn(workspace_delete))?;

    let docs = Arc::new(DocsLibrary::new(config.docs_root.clone()));
    let list_docs = Arc::clone(&docs);
    registry.register("docs.list", sync_handler(move |_| docs_list(&list_docs)))?;
    registry.register(
        "docs.read",
        sync_handler(move |invocation| docs_read(&docs, &invocation)),
    )?;

    // Streaming is intercepted by the dispatcher before lookup.
    registry.register(CHAT_STREAM_ACTION, sync_handler(|_| Ok(JsonMap::new())))?;

    registry.register(
        "system.catalog.describe",
        sync_handler(move |_| match &catalog {
            Some(catalog) => {
                let snapshot = CatalogSnapshot::from(catalog.as_ref());
                Ok(payload(serde_json::to_value(snapshot)?))
            }
            None => Err(ApiError::capability_unavailable("Catalog")),
        }),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn docs_fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.md"), "# Index").unwrap();
        fs::write(dir.path().join("notes.txt"), "skip").unwrap();
        fs::create_dir(dir.path().join("guide")).unwrap();
        fs::write(dir.path().join("guide").join("start.md"), "# Start").unwrap();
        dir
    }

    #[test]
    fn test_docs_list_tree() {
        let dir = docs_fixture();
        let docs = DocsLibrary::new(dir.path());
        let tree = docs.list().unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].path, ".");
        assert_eq!(tree[0].dirs, vec!["guide"]);
        assert_eq!(tree[0].files, vec!["index.md"]);
        assert_eq!(tree[1].path, "guide");
        assert_eq!(tree[1].files, vec!["start.md"]);
    }

    #[test]
    fn test_docs_list_missing_root() {
        let docs = DocsLibrary::new("/definitely/not/here");
        assert!(docs.list().unwrap().is_empty());
    }

    #[test]
    fn test_docs_read() {
        let dir = docs_fixture();
        let docs = DocsLibrary::new(dir.path());
        assert_eq!(docs.read("guide/start.md").unwrap(), "# Start");
        assert_eq!(docs.read("./index.md").unwrap(), "# Index");

        let err = docs.read("missing.md").unwrap_err();
        assert_eq!(err.message, "Doc not found: missing.md");
    }

    #[test]
    fn test_docs_read_rejects_escapes_and_non_markdown() {
        let dir = docs_fixture();
        let docs = DocsLibrary::new(dir.path());
        assert_eq!(
            docs.read("../secret.md").unwrap_err().code,
            ErrorCode::PermissionDenied
        );
        assert_eq!(
            docs.read("/etc/passwd.md").unwrap_err().code,
            ErrorCode::PermissionDenied
        );
        assert_eq!(
            docs.read("notes.txt").unwrap_err().code,
            ErrorCode::InvalidParameters
        );
    }

    #[test]
    fn test_builtin_registry_names() {
        let registry = builtin_registry(&DispatchConfig::default(), None).unwrap();
        assert_eq!(
            registry.names(),
            vec![
                "docs.list",
                "docs.read",
                "system.catalog.describe",
                "system.chat.stream",
                "workspace.create",
                "workspace.delete",
                "workspace.list",
                "workspace.load",
                "workspace.unload",
            ]
        );
    }

    #[test]
    fn test_builtins_cannot_be_registered_twice() {
        let mut registry = builtin_registry(&DispatchConfig::default(), None).unwrap();
        let err = register_builtin_handlers(&mut registry, &DispatchConfig::default(), None)
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("workspace.list".to_string()));
    }
}
