//! Conversational capability provider
//!
//! The chat sub-protocol needs a `ChatResponder` registered as the system
//! agent. Resolution follows a fixed order:
//!
//! 1. `ResponderProvider::agent("system-agent")`
//! 2. `ResponderProvider::system_service()` then `SystemService::system_agent()`
//! 3. the same service's `SystemService::agent("system-agent")`
//!
//! When nothing resolves the caller gets `api.capability.unavailable`.

use async_trait::async_trait;
use ice_ipc::ApiError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Agent name the chat sub-protocol talks to.
pub const SYSTEM_AGENT: &str = "system-agent";

/// Capability name reported when no responder resolves.
pub const SYSTEM_AGENT_CAPABILITY: &str = "SystemAgent";

// ============================================================================
// TRANSCRIPT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

// ============================================================================
// TRAITS
// ============================================================================

/// Errors raised by a conversational agent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResponderError {
    #[error("Responder unavailable: {0}")]
    Unavailable(String),

    #[error("Responder failed: {0}")]
    Failed(String),
}

/// Conversational agent.
#[async_trait]
pub trait ChatResponder: Send + Sync {
    /// Produce a reply. `transcript` already ends with the user message.
    async fn chat(&self, transcript: &[ChatMessage], user_message: &str) -> Result<String, ResponderError>;
}

/// Nested service exposing the system agent.
pub trait SystemService: Send + Sync {
    fn system_agent(&self) -> Option<Arc<dyn ChatResponder>> {
        None
    }

    fn agent(&self, _name: &str) -> Option<Arc<dyn ChatResponder>> {
        None
    }
}

/// Capability provider exposed by a workspace runtime.
pub trait ResponderProvider: Send + Sync {
    fn agent(&self, _name: &str) -> Option<Arc<dyn ChatResponder>> {
        None
    }

    fn system_service(&self) -> Option<Arc<dyn SystemService>> {
        None
    }
}

/// Resolve the system responder following the documented fallback order.
pub fn resolve_system_responder(
    provider: Option<&dyn ResponderProvider>,
) -> Result<Arc<dyn ChatResponder>, ApiError> {
    let provider = provider.ok_or_else(|| ApiError::capability_unavailable(SYSTEM_AGENT_CAPABILITY))?;

    if let Some(agent) = provider.agent(SYSTEM_AGENT) {
        return Ok(agent);
    }

    provider
        .system_service()
        .and_then(|service| service.system_agent().or_else(|| service.agent(SYSTEM_AGENT)))
        .ok_or_else(|| ApiError::capability_unavailable(SYSTEM_AGENT_CAPABILITY))
}
