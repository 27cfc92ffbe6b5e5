//! Workspace runtime interface
//!
//! The dispatcher never owns workspaces. Hosts plug their session manager in
//! through `WorkspaceRuntime`; the chat sub-protocol reaches conversational
//! agents through the runtime's `ResponderProvider`.

use crate::context::SessionContext;
use crate::responder::ResponderProvider;
use async_trait::async_trait;
use ice_core::WorkspaceId;
use ice_ipc::{ApiError, WorkspaceFeatures, WorkspaceSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Fallback workspace type when the runtime reports none.
pub const DEFAULT_WORKSPACE_TYPE: &str = "generic";

// ============================================================================
// ERRORS
// ============================================================================

/// Errors reported by a workspace runtime.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(WorkspaceId),

    #[error("Workspace already exists: {0}")]
    WorkspaceExists(String),

    #[error("Workspace backend failure: {0}")]
    Backend(String),
}

impl From<RuntimeError> for ApiError {
    fn from(err: RuntimeError) -> Self {
        match &err {
            RuntimeError::WorkspaceNotFound(id) => ApiError::workspace_not_found(id, &err),
            _ => ApiError::generic(err.to_string()),
        }
    }
}

// ============================================================================
// WORKSPACE DESCRIPTIONS
// ============================================================================

/// Workspace as reported by the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub id: WorkspaceId,
    pub name: String,
    pub workspace_type: String,
    pub root: PathBuf,
    /// AI configuration; `kg.enabled` and `rag.enabled` drive feature flags.
    #[serde(default)]
    pub ai_config: Value,
    #[serde(default)]
    pub backends: Vec<String>,
}

impl WorkspaceInfo {
    pub fn new(id: impl Into<WorkspaceId>, name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            workspace_type: DEFAULT_WORKSPACE_TYPE.to_string(),
            root: root.into(),
            ai_config: Value::Null,
            backends: Vec::new(),
        }
    }

    pub fn with_type(mut self, workspace_type: impl Into<String>) -> Self {
        self.workspace_type = workspace_type.into();
        self
    }

    pub fn with_ai_config(mut self, ai_config: Value) -> Self {
        self.ai_config = ai_config;
        self
    }

    pub fn with_backends<I, S>(mut self, backends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backends = backends.into_iter().map(Into::into).collect();
        self
    }

    pub fn features(&self) -> WorkspaceFeatures {
        WorkspaceFeatures::from_ai_config(&self.ai_config)
    }

    /// Payload of a `workspace.loaded` event.
    ///
    /// Blank names fall back to the id and blank types to `generic`.
    pub fn snapshot(&self) -> WorkspaceSnapshot {
        let name = if self.name.trim().is_empty() {
            self.id.clone()
        } else {
            self.name.clone()
        };
        let workspace_type = if self.workspace_type.trim().is_empty() {
            DEFAULT_WORKSPACE_TYPE.to_string()
        } else {
            self.workspace_type.clone()
        };
        WorkspaceSnapshot {
            workspace_id: self.id.clone(),
            name,
            workspace_type,
            project_root: self.root.display().to_string(),
            features: self.features(),
        }
    }
}

/// Creation request handed to `WorkspaceRuntime::create_workspace`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWorkspace {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub workspace_type: String,
}

// ============================================================================
// RUNTIME TRAIT
// ============================================================================

/// Host-side workspace/session manager.
#[async_trait]
pub trait WorkspaceRuntime: Send + Sync {
    /// Workspace currently active in the host, if any.
    fn current_workspace_id(&self) -> Option<WorkspaceId>;

    /// Activate a workspace and return the session bound to it.
    async fn activate_workspace(&self, workspace_id: &str) -> Result<SessionContext, RuntimeError>;

    fn get_workspace(&self, workspace_id: &str) -> Result<WorkspaceInfo, RuntimeError>;

    fn list_workspaces(&self) -> Result<Vec<WorkspaceInfo>, RuntimeError>;

    async fn create_workspace(&self, request: NewWorkspace) -> Result<WorkspaceInfo, RuntimeError>;

    async fn deactivate_workspace(&self, workspace_id: &str) -> Result<(), RuntimeError>;

    async fn delete_workspace(&self, workspace_id: &str, delete_from_disk: bool) -> Result<(), RuntimeError>;

    /// Conversational capability provider. `None` when the host has no agents.
    fn responders(&self) -> Option<&dyn ResponderProvider> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ice_ipc::ErrorCode;
    use serde_json::json;

    #[test]
    fn test_snapshot_fallbacks() {
        let info = WorkspaceInfo::new("ws-1", "", "/tmp/ws-1").with_type("");
        let snapshot = info.snapshot();
        assert_eq!(snapshot.name, "ws-1");
        assert_eq!(snapshot.workspace_type, "generic");
        assert_eq!(snapshot.project_root, "/tmp/ws-1");
        assert!(!snapshot.features.kg_enabled);
    }

    #[test]
    fn test_snapshot_features() {
        let info = WorkspaceInfo::new("ws-1", "Alpha", "/w")
            .with_type("multi_agent")
            .with_ai_config(json!({"kg": {"enabled": true}, "rag": {"enabled": false}}));
        let snapshot = info.snapshot();
        assert_eq!(snapshot.name, "Alpha");
        assert!(snapshot.features.kg_enabled);
        assert!(!snapshot.features.rag_enabled);
    }

    #[test]
    fn test_runtime_error_conversion() {
        let err: ApiError = RuntimeError::WorkspaceNotFound("ws-9".into()).into();
        assert_eq!(err.code, ErrorCode::WorkspaceNotFound);
        assert_eq!(err.message, "Workspace not found: ws-9");

        let err: ApiError = RuntimeError::Backend("disk full".into()).into();
        assert_eq!(err.code, ErrorCode::Generic);
    }
}
