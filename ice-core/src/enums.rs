//! Enum types for ICE contracts and envelopes

use crate::error::ContractError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CONTRACT ENUMS
// ============================================================================

/// Closed category grouping actions by subject area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionDomain {
    Logs,
    Code,
    Knowledge,
    Workflow,
    System,
    Workspace,
    Ui,
    Llm,
    Other,
}

impl Default for ActionDomain {
    fn default() -> Self {
        ActionDomain::Other
    }
}

impl ActionDomain {
    /// Every domain, in declaration order.
    pub const ALL: [ActionDomain; 9] = [
        ActionDomain::Logs,
        ActionDomain::Code,
        ActionDomain::Knowledge,
        ActionDomain::Workflow,
        ActionDomain::System,
        ActionDomain::Workspace,
        ActionDomain::Ui,
        ActionDomain::Llm,
        ActionDomain::Other,
    ];

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionDomain::Logs => "logs",
            ActionDomain::Code => "code",
            ActionDomain::Knowledge => "knowledge",
            ActionDomain::Workflow => "workflow",
            ActionDomain::System => "system",
            ActionDomain::Workspace => "workspace",
            ActionDomain::Ui => "ui",
            ActionDomain::Llm => "llm",
            ActionDomain::Other => "other",
        }
    }
}

/// Effect class of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Read-only
    Query,
    /// Changes state
    Mutation,
    /// Analysis / insight
    Analysis,
    /// Planning
    Plan,
    /// Generative output
    Generation,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Query,
        ActionKind::Mutation,
        ActionKind::Analysis,
        ActionKind::Plan,
        ActionKind::Generation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Query => "query",
            ActionKind::Mutation => "mutation",
            ActionKind::Analysis => "analysis",
            ActionKind::Plan => "plan",
            ActionKind::Generation => "generation",
        }
    }
}

// ============================================================================
// ENVELOPE ENUMS
// ============================================================================

/// Outcome status of an action call or response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Failed,
    Partial,
    Pending,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Success => "success",
            ResultStatus::Failed => "failed",
            ResultStatus::Partial => "partial",
            ResultStatus::Pending => "pending",
        }
    }
}

/// Kind discriminator carried by every IPC message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpcMessageKind {
    Request,
    Response,
    Event,
    Error,
}

impl IpcMessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IpcMessageKind::Request => "request",
            IpcMessageKind::Response => "response",
            IpcMessageKind::Event => "event",
            IpcMessageKind::Error => "error",
        }
    }
}

// ============================================================================
// STRING CONVERSIONS
// ============================================================================

fn normalize_token(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl fmt::Display for ActionDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionDomain {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_token(s);
        ActionDomain::ALL
            .into_iter()
            .find(|d| d.as_str() == normalized)
            .ok_or_else(|| ContractError::InvalidDomain(s.to_string()))
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_token(s);
        ActionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| ContractError::InvalidKind(s.to_string()))
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for IpcMessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
