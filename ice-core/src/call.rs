//! Logical call model
//!
//! Transport-neutral description of a call and its outcome. These values
//! carry no IPC, network or runtime references.

use crate::enums::ResultStatus;
use crate::{ActionName, JsonMap, SessionId, UserId, WorkspaceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Logical scope in which an action executes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionContext {
    #[serde(default)]
    pub workspace_id: Option<WorkspaceId>,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Originating surface (cli, gui, ide, agent, system).
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub panel_context: Option<String>,
    #[serde(default)]
    pub metadata: JsonMap,
}

fn default_source() -> String {
    "unknown".to_string()
}

impl Default for ActionContext {
    fn default() -> Self {
        Self {
            workspace_id: None,
            session_id: None,
            user_id: None,
            source: default_source(),
            panel_context: None,
            metadata: JsonMap::new(),
        }
    }
}

/// A request to run one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCall {
    pub name: ActionName,
    #[serde(default)]
    pub params: JsonMap,
    #[serde(default)]
    pub context: ActionContext,
    #[serde(default)]
    pub request_id: Option<String>,
}

impl ActionCall {
    /// Create a call with empty params and a default context.
    pub fn new(name: impl Into<ActionName>) -> Self {
        Self {
            name: name.into(),
            params: JsonMap::new(),
            context: ActionContext::default(),
            request_id: None,
        }
    }

    pub fn with_params(mut self, params: JsonMap) -> Self {
        self.params = params;
        self
    }

    pub fn with_context(mut self, context: ActionContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Logical error attached to a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionError {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: JsonMap,
}

/// Outcome of an `ActionCall`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub name: ActionName,
    pub status: ResultStatus,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub errors: Vec<ActionError>,
    #[serde(default)]
    pub metrics: JsonMap,
    #[serde(default)]
    pub context: Option<ActionContext>,
}

impl ActionResult {
    /// Create a successful result carrying `data`.
    pub fn success(name: impl Into<ActionName>, data: Value) -> Self {
        Self::with_status(name, ResultStatus::Success, data)
    }

    /// Create a result with an explicit status.
    pub fn with_status(name: impl Into<ActionName>, status: ResultStatus, data: Value) -> Self {
        Self {
            name: name.into(),
            status,
            data,
            errors: Vec::new(),
            metrics: JsonMap::new(),
            context: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ResultStatus::Success
    }

    /// Record an error. A successful result becomes failed; partial and
    /// pending results keep their status.
    pub fn add_error(&mut self, code: impl Into<String>, message: impl Into<String>, details: JsonMap) {
        self.push_error(ActionError {
            code: code.into(),
            message: message.into(),
            details,
        });
    }

    /// Record an already built error, with the same status rule as `add_error`.
    pub fn push_error(&mut self, error: ActionError) {
        self.errors.push(error);
        if self.status == ResultStatus::Success {
            self.status = ResultStatus::Failed;
        }
    }

    pub fn with_context(mut self, context: ActionContext) -> Self {
        self.context = Some(context);
        self
    }
}
