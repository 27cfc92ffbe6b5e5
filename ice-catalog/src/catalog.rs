//! Validated catalog of actions and their derived agents

use crate::agents::build_agents_from_actions;
use crate::defaults::build_default_actions;
use crate::error::{CatalogError, CatalogResult};
use ice_core::{ActionDomain, ActionName, ActionSpec, AgentSpec};
use ice_ipc::{ApiError, ApiResult};
use std::collections::{BTreeMap, HashMap};

/// Immutable set of action contracts plus the agents derived from them.
#[derive(Debug, Clone)]
pub struct Catalog {
    actions: Vec<ActionSpec>,
    agents: Vec<AgentSpec>,
    action_index: HashMap<ActionName, usize>,
}

impl Catalog {
    /// Assemble a catalog.
    ///
    /// Every action must pass `ActionSpec::validate` and action names must
    /// be unique. Agents are derived after validation.
    pub fn new(actions: Vec<ActionSpec>) -> CatalogResult<Self> {
        let mut action_index = HashMap::with_capacity(actions.len());
        for (i, action) in actions.iter().enumerate() {
            action.validate()?;
            if action_index.insert(action.name.clone(), i).is_some() {
                return Err(CatalogError::DuplicateAction(action.name.clone()));
            }
        }

        let agents = build_agents_from_actions(&actions);
        tracing::debug!(
            actions = actions.len(),
            agents = agents.len(),
            "Catalog assembled"
        );

        Ok(Self {
            actions,
            agents,
            action_index,
        })
    }

    /// Catalog of the built-in actions.
    pub fn with_defaults() -> CatalogResult<Self> {
        Self::new(build_default_actions())
    }

    /// Actions in insertion order.
    pub fn actions(&self) -> &[ActionSpec] {
        &self.actions
    }

    /// Agents sorted by name.
    pub fn agents(&self) -> &[AgentSpec] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn get_action(&self, name: &str) -> Option<&ActionSpec> {
        self.action_index.get(name).map(|&i| &self.actions[i])
    }

    pub fn get_agent(&self, name: &str) -> Option<&AgentSpec> {
        self.agents
            .binary_search_by(|a| a.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.agents[i])
    }

    /// Look up an action, failing with `api.action.not_found`.
    pub fn require_action(&self, name: &str) -> ApiResult<&ActionSpec> {
        self.get_action(name)
            .ok_or_else(|| ApiError::action_not_found(name))
    }

    /// Look up an agent, failing with `api.agent.not_found`.
    pub fn require_agent(&self, name: &str) -> ApiResult<&AgentSpec> {
        self.get_agent(name).ok_or_else(|| ApiError::agent_not_found(name))
    }

    /// Agent owning an action.
    ///
    /// Unknown actions fail with `api.action.not_found`; known actions with
    /// no owner fail with `api.orchestrator.routing`.
    pub fn owner_of(&self, action: &str) -> ApiResult<&AgentSpec> {
        let spec = self.require_action(action)?;
        spec.owner_agent
            .as_deref()
            .and_then(|owner| self.get_agent(owner))
            .ok_or_else(|| ApiError::routing(action))
    }

    /// Sorted action names.
    pub fn action_names(&self) -> Vec<ActionName> {
        crate::defaults::action_names(&self.actions)
    }

    /// Action names grouped by domain; each list sorted.
    pub fn actions_by_domain(&self) -> BTreeMap<ActionDomain, Vec<ActionName>> {
        let mut by_domain: BTreeMap<ActionDomain, Vec<ActionName>> = BTreeMap::new();
        for action in &self.actions {
            by_domain
                .entry(action.domain)
                .or_default()
                .push(action.name.clone());
        }
        for names in by_domain.values_mut() {
            names.sort();
        }
        by_domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ice_core::{ActionKind, ContractError, ParameterSpec, PrimitiveType};
    use ice_ipc::ErrorCode;

    #[test]
    fn test_default_catalog_agents() {
        let catalog = Catalog::with_defaults().unwrap();
        assert_eq!(catalog.len(), 6);
        let agent_names: Vec<_> = catalog.agents().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            agent_names,
            vec!["code-agent", "log-agent", "planner-agent", "system-agent"]
        );
    }

    #[test]
    fn test_duplicate_action_rejected() {
        let actions = vec![
            ActionSpec::new("logs.scan", ActionDomain::Logs, ActionKind::Query),
            ActionSpec::new("logs.scan", ActionDomain::Logs, ActionKind::Analysis),
        ];
        assert_eq!(
            Catalog::new(actions).unwrap_err(),
            CatalogError::DuplicateAction("logs.scan".to_string())
        );
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let actions = vec![ActionSpec::new("logs.scan", ActionDomain::Logs, ActionKind::Query)
            .with_param(ParameterSpec::new("path", PrimitiveType::String))
            .with_param(ParameterSpec::new("path", PrimitiveType::String))];
        assert!(matches!(
            Catalog::new(actions),
            Err(CatalogError::InvalidAction(ContractError::DuplicateParameter { .. }))
        ));
    }

    #[test]
    fn test_lookups() {
        let catalog = Catalog::with_defaults().unwrap();
        assert!(catalog.get_action("logs.tail").is_some());
        assert_eq!(
            catalog.require_action("logs.nope").unwrap_err().code,
            ErrorCode::ActionNotFound
        );
        assert_eq!(
            catalog.require_agent("ghost").unwrap_err().code,
            ErrorCode::AgentNotFound
        );
        assert_eq!(catalog.owner_of("workflow.plan").unwrap().name, "planner-agent");
    }

    #[test]
    fn test_owner_of_unowned_action_is_routing_error() {
        let catalog =
            Catalog::new(vec![ActionSpec::new("ui.ping", ActionDomain::Ui, ActionKind::Query)]).unwrap();
        assert_eq!(catalog.owner_of("ui.ping").unwrap_err().code, ErrorCode::RoutingFailed);
        assert_eq!(catalog.owner_of("ui.pong").unwrap_err().code, ErrorCode::ActionNotFound);
    }

    #[test]
    fn test_actions_by_domain_sorted() {
        let catalog = Catalog::with_defaults().unwrap();
        let by_domain = catalog.actions_by_domain();
        assert_eq!(by_domain[&ActionDomain::Logs], vec!["logs.scan", "logs.tail"]);
        assert_eq!(by_domain[&ActionDomain::Code], vec!["code.explain", "code.read_file"]);
        assert!(!by_domain.contains_key(&ActionDomain::Ui));
    }
}
