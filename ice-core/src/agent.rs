//! Agent contracts
//!
//! Agents are never authored directly. The catalog derives them from the
//! `owner_agent` field of the actions it holds.

use crate::enums::ActionDomain;
use crate::{ActionName, AgentName};
use serde::{Deserialize, Serialize};

/// Summary statistics recorded on a derived agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMetadata {
    pub agent: AgentName,
    pub action_count: usize,
    /// Distinct domains of the owned actions, sorted by wire name.
    pub domains: Vec<ActionDomain>,
    pub supports_mutation: bool,
    pub supports_analysis: bool,
}

/// Owner of a set of actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: AgentName,
    pub description: String,
    /// Owned action names, sorted.
    pub actions: Vec<ActionName>,
    /// Distinct `domain:kind` pairs, sorted.
    pub capabilities: Vec<String>,
    pub main_domain: ActionDomain,
    pub metadata: AgentMetadata,
}

impl AgentSpec {
    /// True if this agent owns the named action.
    pub fn owns_action(&self, action: &str) -> bool {
        self.actions.binary_search_by(|a| a.as_str().cmp(action)).is_ok()
    }

    /// True if this agent advertises the `domain:kind` capability.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities
            .binary_search_by(|c| c.as_str().cmp(capability))
            .is_ok()
    }
}
