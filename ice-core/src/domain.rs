//! Domain descriptors
//!
//! Static presentation data for each `ActionDomain`: label, summary,
//! capability keywords and UI hints consumed by GUI surfaces.

use crate::enums::ActionDomain;
use serde::Serialize;

/// UI rendering hints for a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UiHints {
    pub icon: &'static str,
    pub color: &'static str,
    pub panel: &'static str,
}

/// Descriptor of an action domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DomainInfo {
    pub name: ActionDomain,
    pub label: &'static str,
    pub description: &'static str,
    pub capabilities: &'static [&'static str],
    pub ui_hints: UiHints,
}

fn describe(
    name: ActionDomain,
    label: &'static str,
    description: &'static str,
    capabilities: &'static [&'static str],
    ui_hints: UiHints,
) -> DomainInfo {
    DomainInfo {
        name,
        label,
        description,
        capabilities,
        ui_hints,
    }
}

const fn hints(icon: &'static str, color: &'static str) -> UiHints {
    UiHints {
        icon,
        color,
        panel: icon,
    }
}

impl ActionDomain {
    /// Static descriptor for this domain.
    pub fn info(&self) -> DomainInfo {
        match self {
            ActionDomain::Logs => describe(
                *self,
                "Logs",
                "Log management and analysis: file scanning, parsing, normalization, search and indexing.",
                &["scan", "read", "tail", "parse", "normalize", "filter", "search", "index"],
                hints("logs", "orange"),
            ),
            ActionDomain::Code => describe(
                *self,
                "Code",
                "Source code analysis and manipulation: file reading, AST, symbols, refactoring and code intelligence.",
                &["read", "analyze", "search", "rewrite", "refactor", "generate"],
                hints("code", "blue"),
            ),
            ActionDomain::Knowledge => describe(
                *self,
                "Knowledge",
                "Knowledge base and RAG: ingestion, indexing, semantic queries and maintenance.",
                &["ingest", "index", "query", "search", "delete", "sync"],
                hints("knowledge", "teal"),
            ),
            ActionDomain::Workflow => describe(
                *self,
                "Workflow",
                "Planning and execution of multi-step workflows, including orchestration and progress evaluation.",
                &["plan", "execute", "skip", "rollback", "evaluate"],
                hints("workflow", "purple"),
            ),
            ActionDomain::System => describe(
                *self,
                "System",
                "System operations: workspaces, filesystem, runtime status and base integrations.",
                &["workspace", "filesystem", "status"],
                hints("system", "gray"),
            ),
            ActionDomain::Workspace => describe(
                *self,
                "Workspace",
                "Workspace inspection and management: configuration, backends, statistics and global context.",
                &["inspect", "switch", "stats"],
                hints("workspace", "green"),
            ),
            ActionDomain::Ui => describe(
                *self,
                "UI",
                "User interface support actions: panel tracking, previews and UI stubs.",
                &["panel", "preview", "tracking"],
                hints("ui", "pink"),
            ),
            ActionDomain::Llm => describe(
                *self,
                "LLM",
                "Conversational and generative model access.",
                &["chat", "complete"],
                hints("llm", "indigo"),
            ),
            ActionDomain::Other => describe(
                *self,
                "Other",
                "Actions outside any named domain.",
                &[],
                hints("other", "gray"),
            ),
        }
    }
}
