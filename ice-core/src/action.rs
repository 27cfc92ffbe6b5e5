//! Action contracts: parameters, result fields and the action itself

use crate::enums::{ActionDomain, ActionKind};
use crate::error::{ContractError, ContractResult};
use crate::primitives::{PrimitiveType, ValueConstraint};
use crate::{ActionName, AgentName, JsonMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Version tag given to actions that do not declare one.
pub const DEFAULT_ACTION_VERSION: &str = "v1";

// ============================================================================
// PARAMETERS
// ============================================================================

/// Declared input parameter of an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: PrimitiveType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<ValueConstraint>,
}

impl ParameterSpec {
    /// Create an optional parameter with no default and no constraint.
    pub fn new(name: impl Into<String>, param_type: PrimitiveType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: false,
            description: String::new(),
            default: None,
            constraint: None,
        }
    }

    /// Mark the parameter as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_constraint(mut self, constraint: ValueConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    /// A JSON `null` default counts as no default.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref().filter(|v| !v.is_null())
    }

    pub fn has_default(&self) -> bool {
        self.default_value().is_some()
    }
}

// ============================================================================
// RESULT FIELDS
// ============================================================================

/// Documented output field. Never validated against real results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultFieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub required: bool,
}

fn default_true() -> bool {
    true
}

impl ResultFieldSpec {
    /// Create a required result field.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            description: String::new(),
            required: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

// ============================================================================
// ACTIONS
// ============================================================================

/// Declarative contract of an invocable action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub name: ActionName,
    #[serde(default)]
    pub description: String,
    pub domain: ActionDomain,
    pub kind: ActionKind,
    #[serde(default)]
    pub params: Vec<ParameterSpec>,
    #[serde(default)]
    pub result_fields: Vec<ResultFieldSpec>,
    #[serde(default)]
    pub owner_agent: Option<AgentName>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub metadata: JsonMap,
}

fn default_version() -> String {
    DEFAULT_ACTION_VERSION.to_string()
}

impl ActionSpec {
    /// Create an action with no parameters, result fields or owner.
    pub fn new(name: impl Into<ActionName>, domain: ActionDomain, kind: ActionKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            domain,
            kind,
            params: Vec::new(),
            result_fields: Vec::new(),
            owner_agent: None,
            tags: Vec::new(),
            deprecated: false,
            version: default_version(),
            metadata: JsonMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_param(mut self, param: ParameterSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_result_field(mut self, field: ResultFieldSpec) -> Self {
        self.result_fields.push(field);
        self
    }

    pub fn with_owner(mut self, agent: impl Into<AgentName>) -> Self {
        self.owner_agent = Some(agent.into());
        self
    }

    /// Add tags, skipping ones already present.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Look up a declared parameter by name.
    pub fn get_param(&self, name: &str) -> Option<&ParameterSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Declared parameter names, in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    /// `domain:kind` capability label of this action.
    pub fn capability(&self) -> String {
        format!("{}:{}", self.domain, self.kind)
    }

    /// Check the structural invariants of a single action.
    ///
    /// The name must be dotted (`domain.verb`) with non-empty segments of
    /// ASCII alphanumerics, `_` or `-`, and parameter names must be unique.
    pub fn validate(&self) -> ContractResult<()> {
        validate_action_name(&self.name)?;

        let mut seen = HashSet::new();
        for param in &self.params {
            if !seen.insert(param.name.as_str()) {
                return Err(ContractError::DuplicateParameter {
                    action: self.name.clone(),
                    param: param.name.clone(),
                });
            }
        }
        Ok(())
    }
}

fn validate_action_name(name: &str) -> ContractResult<()> {
    let invalid = |reason: &str| ContractError::InvalidActionName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if !name.contains('.') {
        return Err(invalid("expected a dotted identifier"));
    }
    for segment in name.split('.') {
        if segment.is_empty() {
            return Err(invalid("empty segment"));
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(invalid("unsupported character"));
        }
    }
    Ok(())
}
