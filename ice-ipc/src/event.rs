//! Outbound Event Types
//!
//! Events pushed to the caller's emitter while dispatching: streaming chat
//! chunks and workspace lifecycle notifications.

use crate::message::EventMessage;
use ice_core::{ConversationId, JsonMap, WorkspaceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire `type` of every chat stream event.
pub const CHAT_STREAM_EVENT_TYPE: &str = "system.chat.stream";

// ============================================================================
// CHAT STREAM EVENTS
// ============================================================================

/// Phase of a streamed reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ChatStreamPhase {
    /// One whitespace-delimited fragment of the reply.
    Chunk { delta: String },
    /// Terminal event carrying the complete reply.
    End { full: String },
}

/// Event of the streaming conversation sub-protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatStreamEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(flatten)]
    pub phase: ChatStreamPhase,
    pub conversation_id: ConversationId,
    /// Caller correlation id, used to demultiplex concurrent streams.
    pub message_id: Option<String>,
}

impl ChatStreamEvent {
    /// Create a chunk event.
    pub fn chunk(
        conversation_id: impl Into<ConversationId>,
        message_id: Option<String>,
        delta: impl Into<String>,
    ) -> Self {
        Self {
            event_type: CHAT_STREAM_EVENT_TYPE.to_string(),
            phase: ChatStreamPhase::Chunk {
                delta: delta.into(),
            },
            conversation_id: conversation_id.into(),
            message_id,
        }
    }

    /// Create a terminal end event.
    pub fn end(
        conversation_id: impl Into<ConversationId>,
        message_id: Option<String>,
        full: impl Into<String>,
    ) -> Self {
        Self {
            event_type: CHAT_STREAM_EVENT_TYPE.to_string(),
            phase: ChatStreamPhase::End { full: full.into() },
            conversation_id: conversation_id.into(),
            message_id,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self.phase, ChatStreamPhase::End { .. })
    }
}

// ============================================================================
// LIFECYCLE EVENTS
// ============================================================================

/// Feature flags derived from a workspace's AI configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceFeatures {
    pub kg_enabled: bool,
    pub rag_enabled: bool,
}

impl WorkspaceFeatures {
    /// Read `kg.enabled` and `rag.enabled` from an AI configuration object.
    /// Missing or non-boolean entries count as disabled.
    pub fn from_ai_config(ai_config: &Value) -> Self {
        let enabled = |section: &str| {
            ai_config
                .get(section)
                .and_then(|s| s.get("enabled"))
                .and_then(Value::as_bool)
                .unwrap_or(false)
        };
        Self {
            kg_enabled: enabled("kg"),
            rag_enabled: enabled("rag"),
        }
    }
}

/// Workspace description carried by `workspace.loaded`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    pub workspace_id: WorkspaceId,
    pub name: String,
    #[serde(rename = "type")]
    pub workspace_type: String,
    pub project_root: String,
    pub features: WorkspaceFeatures,
}

/// Standard post-action lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum LifecycleEvent {
    /// A workspace was created or loaded.
    #[serde(rename = "workspace.loaded")]
    WorkspaceLoaded { workspace: WorkspaceSnapshot },

    /// The set of workspaces changed.
    #[serde(rename = "workspace.list.updated")]
    WorkspaceListUpdated { workspace_id: Option<WorkspaceId> },
}

// ============================================================================
// OUTBOUND EVENT
// ============================================================================

/// Any event handed to an emitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutboundEvent {
    Chat(ChatStreamEvent),
    Lifecycle(LifecycleEvent),
}

impl OutboundEvent {
    /// Get the event type name for logging and envelope wrapping.
    pub fn event_type(&self) -> &'static str {
        match self {
            OutboundEvent::Chat(_) => CHAT_STREAM_EVENT_TYPE,
            OutboundEvent::Lifecycle(LifecycleEvent::WorkspaceLoaded { .. }) => "workspace.loaded",
            OutboundEvent::Lifecycle(LifecycleEvent::WorkspaceListUpdated { .. }) => {
                "workspace.list.updated"
            }
        }
    }

    /// Wrap the event in an `EventMessage` envelope.
    pub fn to_envelope(&self) -> Result<EventMessage, serde_json::Error> {
        let payload = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => JsonMap::new(),
        };
        let mut message = EventMessage::new(self.event_type(), payload);
        if let OutboundEvent::Chat(chat) = self {
            if let Some(id) = &chat.message_id {
                message = message.with_correlation(id.clone());
            }
        }
        if let OutboundEvent::Lifecycle(LifecycleEvent::WorkspaceLoaded { workspace }) = self {
            message = message.with_workspace(workspace.workspace_id.clone());
        }
        Ok(message)
    }
}

impl From<ChatStreamEvent> for OutboundEvent {
    fn from(event: ChatStreamEvent) -> Self {
        OutboundEvent::Chat(event)
    }
}

impl From<LifecycleEvent> for OutboundEvent {
    fn from(event: LifecycleEvent) -> Self {
        OutboundEvent::Lifecycle(event)
    }
}
