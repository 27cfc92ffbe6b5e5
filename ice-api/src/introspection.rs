//! Catalog introspection
//!
//! Stable, serializable snapshots of the catalog. The full snapshot is the
//! payload every surface loads at startup: GUI panels and forms, CLI help,
//! IDE completions and LLM tool discovery.

use ice_catalog::Catalog;
use ice_core::{
    ActionSpec, AgentMetadata, AgentSpec, DomainInfo, JsonMap, ParameterSpec, ResultFieldSpec,
};
use ice_schema::{action_schema_bundle, SchemaBundle};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// ACTIONS
// ============================================================================

/// Constraint block; every bound is present, unset ones as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintDescription {
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub choices: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    pub required: bool,
    pub description: String,
    pub default: Value,
    pub constraints: Option<ConstraintDescription>,
}

impl From<&ParameterSpec> for ParameterDescription {
    fn from(param: &ParameterSpec) -> Self {
        Self {
            name: param.name.clone(),
            param_type: param.param_type.as_str().to_string(),
            required: param.required,
            description: param.description.clone(),
            default: param.default.clone().unwrap_or(Value::Null),
            constraints: param.constraint.as_ref().map(|c| ConstraintDescription {
                min_value: c.min_value,
                max_value: c.max_value,
                min_length: c.min_length,
                max_length: c.max_length,
                choices: c.choices.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionDescription {
    pub name: String,
    pub description: String,
    pub domain: String,
    pub kind: String,
    pub version: String,
    pub deprecated: bool,
    pub tags: Vec<String>,
    pub owner_agent: Option<String>,
    pub parameters: Vec<ParameterDescription>,
    pub result: Vec<ResultFieldSpec>,
    pub metadata: JsonMap,
}

/// Complete, stable description of one action.
pub fn describe_action(action: &ActionSpec) -> ActionDescription {
    ActionDescription {
        name: action.name.clone(),
        description: action.description.clone(),
        domain: action.domain.as_str().to_string(),
        kind: action.kind.to_string(),
        version: action.version.clone(),
        deprecated: action.deprecated,
        tags: action.tags.clone(),
        owner_agent: action.owner_agent.clone(),
        parameters: action.params.iter().map(ParameterDescription::from).collect(),
        result: action.result_fields.clone(),
        metadata: action.metadata.clone(),
    }
}

// ============================================================================
// AGENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentDescription {
    pub name: String,
    pub description: String,
    pub main_domain: String,
    pub actions: Vec<String>,
    pub capabilities: Vec<String>,
    pub metadata: AgentMetadata,
}

pub fn describe_agent(agent: &AgentSpec) -> AgentDescription {
    AgentDescription {
        name: agent.name.clone(),
        description: agent.description.clone(),
        main_domain: agent.main_domain.as_str().to_string(),
        actions: agent.actions.clone(),
        capabilities: agent.capabilities.clone(),
        metadata: agent.metadata.clone(),
    }
}

// ============================================================================
// CATALOG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSummary {
    pub total_actions: usize,
    pub total_agents: usize,
    /// Domains with at least one action, sorted.
    pub domains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogIndex {
    pub by_domain: BTreeMap<String, Vec<String>>,
    pub by_agent: BTreeMap<String, Vec<String>>,
}

/// Full catalog snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSnapshot {
    pub summary: CatalogSummary,
    pub index: CatalogIndex,
    pub actions: BTreeMap<String, ActionDescription>,
    pub agents: BTreeMap<String, AgentDescription>,
    pub schemas: BTreeMap<String, SchemaBundle>,
    pub domains: BTreeMap<String, DomainInfo>,
}

pub fn describe_catalog(actions: &[ActionSpec], agents: &[AgentSpec]) -> CatalogSnapshot {
    let mut by_domain: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut domains = BTreeMap::new();
    for action in actions {
        let key = action.domain.as_str().to_string();
        domains
            .entry(key.clone())
            .or_insert_with(|| action.domain.info());
        by_domain.entry(key).or_default().push(action.name.clone());
    }
    for names in by_domain.values_mut() {
        names.sort();
    }

    let by_agent = agents
        .iter()
        .map(|agent| {
            let mut owned = agent.actions.clone();
            owned.sort();
            (agent.name.clone(), owned)
        })
        .collect();

    CatalogSnapshot {
        summary: CatalogSummary {
            total_actions: actions.len(),
            total_agents: agents.len(),
            domains: by_domain.keys().cloned().collect(),
        },
        index: CatalogIndex { by_domain, by_agent },
        actions: actions
            .iter()
            .map(|a| (a.name.clone(), describe_action(a)))
            .collect(),
        agents: agents
            .iter()
            .map(|a| (a.name.clone(), describe_agent(a)))
            .collect(),
        schemas: actions
            .iter()
            .map(|a| (a.name.clone(), action_schema_bundle(a)))
            .collect(),
        domains,
    }
}

impl From<&Catalog> for CatalogSnapshot {
    fn from(catalog: &Catalog) -> Self {
        describe_catalog(catalog.actions(), catalog.agents())
    }
}
