//! Agent derivation
//!
//! Agents are computed from `ActionSpec::owner_agent`, never authored. The
//! full agent set is rebuilt from scratch on every assembly.

use ice_core::{ActionDomain, ActionKind, ActionSpec, AgentMetadata, AgentName, AgentSpec};
use std::collections::BTreeMap;

/// Most frequent domain. Ties go to the domain seen first.
fn infer_main_domain(specs: &[&ActionSpec]) -> ActionDomain {
    let mut counts: Vec<(ActionDomain, usize)> = Vec::new();
    for spec in specs {
        match counts.iter_mut().find(|(d, _)| *d == spec.domain) {
            Some((_, n)) => *n += 1,
            None => counts.push((spec.domain, 1)),
        }
    }

    let mut best: Option<(ActionDomain, usize)> = None;
    for (domain, count) in counts {
        if best.map_or(true, |(_, n)| count > n) {
            best = Some((domain, count));
        }
    }
    best.map(|(d, _)| d).unwrap_or_default()
}

/// Sorted, deduplicated `domain:kind` pairs.
fn infer_capabilities(specs: &[&ActionSpec]) -> Vec<String> {
    let mut caps: Vec<String> = specs.iter().map(|s| s.capability()).collect();
    caps.sort();
    caps.dedup();
    caps
}

fn infer_metadata(agent: &str, specs: &[&ActionSpec]) -> AgentMetadata {
    let mut domains: Vec<ActionDomain> = specs.iter().map(|s| s.domain).collect();
    domains.sort_by_key(|d| d.as_str());
    domains.dedup();

    AgentMetadata {
        agent: agent.to_string(),
        action_count: specs.len(),
        domains,
        supports_mutation: specs.iter().any(|s| s.kind == ActionKind::Mutation),
        supports_analysis: specs.iter().any(|s| s.kind == ActionKind::Analysis),
    }
}

/// Fallback description of a derived agent.
pub fn default_agent_description(agent: &str) -> String {
    format!("Agent responsible for '{}' actions", agent)
}

/// Derive one `AgentSpec` per distinct owner, sorted by agent name.
///
/// Actions without an owner contribute to no agent.
pub fn build_agents_from_actions<'a, I>(actions: I) -> Vec<AgentSpec>
where
    I: IntoIterator<Item = &'a ActionSpec>,
{
    let mut by_agent: BTreeMap<&'a str, Vec<&'a ActionSpec>> = BTreeMap::new();
    for action in actions {
        if let Some(owner) = action.owner_agent.as_deref().filter(|o| !o.is_empty()) {
            by_agent.entry(owner).or_default().push(action);
        }
    }

    by_agent
        .into_iter()
        .map(|(name, specs)| {
            let mut owned: Vec<String> = specs.iter().map(|s| s.name.clone()).collect();
            owned.sort();
            AgentSpec {
                name: AgentName::from(name),
                description: default_agent_description(name),
                actions: owned,
                capabilities: infer_capabilities(&specs),
                main_domain: infer_main_domain(&specs),
                metadata: infer_metadata(name, &specs),
            }
        })
        .collect()
}
