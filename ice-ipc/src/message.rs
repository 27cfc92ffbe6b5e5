//! IPC envelopes
//!
//! Every message shares a header carrying the kind discriminator,
//! correlation identifiers, workspace/session/user scoping and a source tag.

use crate::error::ApiError;
use ice_core::{
    ActionCall, ActionContext, ActionError, ActionName, ActionResult, CorrelationId,
    IpcMessageKind, JsonMap, RequestId, ResultStatus, SessionId, UserId, WorkspaceId,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

fn unknown_source() -> String {
    "unknown".to_string()
}

fn system_source() -> String {
    "system".to_string()
}

fn event_kind() -> IpcMessageKind {
    IpcMessageKind::Event
}

// ============================================================================
// HEADER
// ============================================================================

/// Header common to requests, responses and error messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    pub kind: IpcMessageKind,
    #[serde(default)]
    pub request_id: Option<RequestId>,
    #[serde(default)]
    pub correlation_id: Option<CorrelationId>,
    #[serde(default)]
    pub workspace_id: Option<WorkspaceId>,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// cli | gui | ide | agent | system
    #[serde(default = "unknown_source")]
    pub source: String,
}

impl MessageHeader {
    /// Create a header of the given kind with no identifiers.
    pub fn new(kind: IpcMessageKind) -> Self {
        Self {
            kind,
            request_id: None,
            correlation_id: None,
            workspace_id: None,
            session_id: None,
            user_id: None,
            source: unknown_source(),
        }
    }

    /// Request header with a fresh request id.
    pub fn request() -> Self {
        Self::new(IpcMessageKind::Request).with_request_id(Uuid::now_v7().to_string())
    }

    pub fn with_request_id(mut self, request_id: impl Into<RequestId>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_workspace(mut self, workspace_id: impl Into<WorkspaceId>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Header answering this one.
    ///
    /// Scoping is copied; the correlation id is the caller's correlation id,
    /// or its request id when none was set.
    pub fn reply(&self, kind: IpcMessageKind) -> Self {
        Self {
            kind,
            request_id: self.request_id.clone(),
            correlation_id: self
                .correlation_id
                .clone()
                .or_else(|| self.request_id.clone()),
            workspace_id: self.workspace_id.clone(),
            session_id: self.session_id.clone(),
            user_id: self.user_id.clone(),
            source: system_source(),
        }
    }
}

// ============================================================================
// ACTION REQUEST / RESPONSE
// ============================================================================

/// Request to execute an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub header: MessageHeader,
    pub action: ActionName,
    #[serde(default)]
    pub params: JsonMap,
}

impl ActionRequest {
    /// Create a request with a fresh request header.
    pub fn new(action: impl Into<ActionName>, params: JsonMap) -> Self {
        Self {
            header: MessageHeader::request(),
            action: action.into(),
            params,
        }
    }

    /// Logical call carried by this request; the header supplies its context.
    pub fn to_call(&self) -> ActionCall {
        let context = ActionContext {
            workspace_id: self.header.workspace_id.clone(),
            session_id: self.header.session_id.clone(),
            user_id: self.header.user_id.clone(),
            source: self.header.source.clone(),
            ..ActionContext::default()
        };
        let call = ActionCall::new(self.action.clone())
            .with_params(self.params.clone())
            .with_context(context);
        match &self.header.request_id {
            Some(request_id) => call.with_request_id(request_id.clone()),
            None => call,
        }
    }
}

/// Response to an `ActionRequest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub header: MessageHeader,
    pub action: ActionName,
    pub status: ResultStatus,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub errors: Vec<ActionError>,
    #[serde(default)]
    pub metrics: JsonMap,
}

impl ActionResponse {
    /// Successful response answering `request`.
    pub fn success(request: &ActionRequest, data: Value) -> Self {
        Self {
            header: request.header.reply(IpcMessageKind::Response),
            action: request.action.clone(),
            status: ResultStatus::Success,
            data,
            errors: Vec::new(),
            metrics: JsonMap::new(),
        }
    }

    /// Failed response answering `request`, with the error attached.
    pub fn failure(request: &ActionRequest, error: &ApiError) -> Self {
        Self {
            header: request.header.reply(IpcMessageKind::Error),
            action: request.action.clone(),
            status: ResultStatus::Failed,
            data: Value::Null,
            errors: vec![error.to_action_error()],
            metrics: JsonMap::new(),
        }
    }

    /// Response carrying a logical result. Failed results answer with an
    /// `error` header, every other status with a `response` header.
    pub fn from_result(request: &ActionRequest, result: ActionResult) -> Self {
        let kind = match result.status {
            ResultStatus::Failed => IpcMessageKind::Error,
            _ => IpcMessageKind::Response,
        };
        Self {
            header: request.header.reply(kind),
            action: result.name,
            status: result.status,
            data: result.data,
            errors: result.errors,
            metrics: result.metrics,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ResultStatus::Success
    }
}

// ============================================================================
// EVENTS
// ============================================================================

/// Header of an asynchronous event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHeader {
    #[serde(default = "event_kind")]
    pub kind: IpcMessageKind,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub correlation_id: Option<CorrelationId>,
    #[serde(default)]
    pub workspace_id: Option<WorkspaceId>,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default = "system_source")]
    pub source: String,
}

impl Default for EventHeader {
    fn default() -> Self {
        Self {
            kind: event_kind(),
            event_id: None,
            correlation_id: None,
            workspace_id: None,
            session_id: None,
            user_id: None,
            source: system_source(),
        }
    }
}

/// Asynchronous event (log, state, progress, UI).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    pub header: EventHeader,
    pub event: String,
    #[serde(default)]
    pub payload: JsonMap,
}

impl EventMessage {
    /// Create an event with a fresh event id.
    pub fn new(event: impl Into<String>, payload: JsonMap) -> Self {
        Self {
            header: EventHeader {
                event_id: Some(Uuid::now_v7().to_string()),
                ..EventHeader::default()
            },
            event: event.into(),
            payload,
        }
    }

    pub fn with_correlation(mut self, correlation_id: impl Into<CorrelationId>) -> Self {
        self.header.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn with_workspace(mut self, workspace_id: impl Into<WorkspaceId>) -> Self {
        self.header.workspace_id = Some(workspace_id.into());
        self
    }
}
