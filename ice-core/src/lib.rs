//! ICE Core - Contract Model
//!
//! Pure data describing invocable actions and the agents that own them.
//! Every other ICE crate treats these types as read-only truth:
//! - `ActionSpec` / `ParameterSpec` / `ResultFieldSpec`: declarative action contracts
//! - `AgentSpec`: owner contracts, always derived from action ownership
//! - `PrimitiveType` / `ValueConstraint`: semantic value shapes and bounds
//! - `ActionContext` / `ActionCall` / `ActionResult`: logical call model
//!
//! This crate contains no I/O and no runtime behavior.

pub mod action;
pub mod agent;
pub mod call;
pub mod domain;
pub mod enums;
pub mod error;
pub mod primitives;

pub use action::{ActionSpec, ParameterSpec, ResultFieldSpec};
pub use agent::{AgentMetadata, AgentSpec};
pub use call::{ActionCall, ActionContext, ActionError, ActionResult};
pub use domain::{DomainInfo, UiHints};
pub use enums::{ActionDomain, ActionKind, IpcMessageKind, ResultStatus};
pub use error::{ContractError, ContractResult};
pub use primitives::{PrimitiveType, ValueConstraint};

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Stable dotted action identifier (e.g. `logs.scan`).
pub type ActionName = String;

/// Agent identifier (e.g. `log-agent`).
pub type AgentName = String;

/// Identifier of an externally managed workspace.
pub type WorkspaceId = String;

/// Identifier of a caller session.
pub type SessionId = String;

/// Identifier of the calling user.
pub type UserId = String;

/// Caller-supplied request identifier.
pub type RequestId = String;

/// Identifier used to correlate responses and events with a request.
pub type CorrelationId = String;

/// Identifier of a streaming conversation.
pub type ConversationId = String;

/// JSON object used for parameters, payloads and free-form metadata.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
