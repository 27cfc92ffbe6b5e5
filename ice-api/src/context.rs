//! Per-request session context
//!
//! The context is handed to the dispatcher with each request and handed back
//! with the outcome. Nothing is stored in ambient or global state.

use ice_core::{RequestId, WorkspaceId};
use serde::{Deserialize, Serialize};

/// Session bound to an activated workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Workspace this session is bound to.
    pub workspace_id: Option<WorkspaceId>,
    /// Runtime-issued identifier of the activated context.
    pub context_id: Option<String>,
    /// Last request id seen on this session.
    pub request_id: Option<RequestId>,
    /// UI panel hint supplied by the caller.
    pub panel_context: Option<String>,
}

impl SessionContext {
    pub fn new(workspace_id: impl Into<WorkspaceId>) -> Self {
        Self {
            workspace_id: Some(workspace_id.into()),
            ..Self::default()
        }
    }

    pub fn with_context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    /// Check whether the session is bound to `workspace_id`.
    pub fn is_bound_to(&self, workspace_id: &str) -> bool {
        self.workspace_id.as_deref() == Some(workspace_id)
    }

    pub fn set_panel_context(&mut self, panel: impl Into<String>) {
        self.panel_context = Some(panel.into());
    }

    pub fn set_request_id(&mut self, request_id: impl Into<RequestId>) {
        self.request_id = Some(request_id.into());
    }
}
