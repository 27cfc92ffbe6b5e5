//! Default action set
//!
//! The built-in contracts shared by the orchestrator, CLI, GUI/IDE and LLM
//! tool surfaces. Grouped per domain.

use ice_core::{
    ActionDomain, ActionKind, ActionName, ActionSpec, ParameterSpec, PrimitiveType,
    ResultFieldSpec, ValueConstraint,
};

// ============================================================================
// ACTION GROUPS
// ============================================================================

pub fn build_logs_actions() -> Vec<ActionSpec> {
    vec![
        ActionSpec::new("logs.scan", ActionDomain::Logs, ActionKind::Analysis)
            .with_description("Scan a directory and locate log sources.")
            .with_param(
                ParameterSpec::new("path", PrimitiveType::Directory)
                    .required()
                    .with_description("Directory containing the log files"),
            )
            .with_param(
                ParameterSpec::new("recursive", PrimitiveType::Boolean)
                    .with_default(true)
                    .with_description("Scan subdirectories recursively"),
            )
            .with_param(
                ParameterSpec::new("pattern", PrimitiveType::String)
                    .with_description("Optional pattern used to filter files"),
            )
            .with_result_field(
                ResultFieldSpec::new("sources", "list").with_description("Discovered log sources"),
            )
            .with_owner("log-agent")
            .with_tags(["logs", "scan"]),
        ActionSpec::new("logs.tail", ActionDomain::Logs, ActionKind::Query)
            .with_description("Read the last N lines of a log file.")
            .with_param(
                ParameterSpec::new("file", PrimitiveType::File)
                    .required()
                    .with_description("Log file to read"),
            )
            .with_param(
                ParameterSpec::new("lines", PrimitiveType::Integer)
                    .with_default(100)
                    .with_constraint(ValueConstraint::new().with_min_value(1.0))
                    .with_description("Number of lines to read"),
            )
            .with_param(
                ParameterSpec::new("follow", PrimitiveType::Boolean)
                    .with_default(false)
                    .with_description("Keep following the file (tail -f)"),
            )
            .with_result_field(ResultFieldSpec::new("lines", "list"))
            .with_owner("log-agent")
            .with_tags(["logs", "tail"]),
    ]
}

pub fn build_code_actions() -> Vec<ActionSpec> {
    vec![
        ActionSpec::new("code.read_file", ActionDomain::Code, ActionKind::Query)
            .with_description("Read the contents of a source file.")
            .with_param(
                ParameterSpec::new("path", PrimitiveType::File)
                    .required()
                    .with_description("Path of the source file"),
            )
            .with_param(
                ParameterSpec::new("encoding", PrimitiveType::String)
                    .with_default("utf-8")
                    .with_description("File encoding"),
            )
            .with_result_field(ResultFieldSpec::new("content", "str"))
            .with_owner("code-agent")
            .with_tags(["code", "read"]),
        ActionSpec::new("code.explain", ActionDomain::Code, ActionKind::Analysis)
            .with_description("Explain a code fragment.")
            .with_param(
                ParameterSpec::new("code", PrimitiveType::String)
                    .required()
                    .with_description("Code to explain"),
            )
            .with_param(
                ParameterSpec::new("language", PrimitiveType::String)
                    .with_description("Programming language"),
            )
            .with_result_field(ResultFieldSpec::new("explanation", "str"))
            .with_owner("code-agent")
            .with_tags(["code", "explain"]),
    ]
}

pub fn build_workflow_actions() -> Vec<ActionSpec> {
    vec![
        ActionSpec::new("workflow.plan", ActionDomain::Workflow, ActionKind::Plan)
            .with_description("Produce a workflow plan from a goal.")
            .with_param(
                ParameterSpec::new("goal", PrimitiveType::String)
                    .required()
                    .with_description("Goal to plan for"),
            )
            .with_result_field(
                ResultFieldSpec::new("steps", "list").with_description("Ordered plan steps"),
            )
            .with_owner("planner-agent")
            .with_tags(["workflow", "plan"]),
    ]
}

pub fn build_system_actions() -> Vec<ActionSpec> {
    vec![
        ActionSpec::new("system.workspace.list", ActionDomain::System, ActionKind::Query)
            .with_description("List the available workspaces.")
            .with_result_field(ResultFieldSpec::new("workspaces", "list"))
            .with_owner("system-agent")
            .with_tags(["system", "workspace"]),
    ]
}

// ============================================================================
// DEFAULT CATALOG
// ============================================================================

/// Every built-in action, grouped logs, code, workflow, system.
pub fn build_default_actions() -> Vec<ActionSpec> {
    let mut actions = Vec::new();
    actions.extend(build_logs_actions());
    actions.extend(build_code_actions());
    actions.extend(build_workflow_actions());
    actions.extend(build_system_actions());
    actions
}

/// Sorted action names.
pub fn action_names<'a, I>(actions: I) -> Vec<ActionName>
where
    I: IntoIterator<Item = &'a ActionSpec>,
{
    let mut names: Vec<ActionName> = actions.into_iter().map(|a| a.name.clone()).collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_action_names() {
        assert_eq!(
            action_names(&build_default_actions()),
            vec![
                "code.explain",
                "code.read_file",
                "logs.scan",
                "logs.tail",
                "system.workspace.list",
                "workflow.plan",
            ]
        );
    }

    #[test]
    fn test_default_actions_are_well_formed() {
        for action in build_default_actions() {
            assert!(action.validate().is_ok(), "{} is malformed", action.name);
            assert!(action.owner_agent.is_some());
            assert_eq!(action.version, "v1");
        }
    }

    #[test]
    fn test_logs_tail_contract() {
        let actions = build_logs_actions();
        let tail = actions.iter().find(|a| a.name == "logs.tail").unwrap();
        let lines = tail.get_param("lines").unwrap();
        assert_eq!(lines.default, Some(json!(100)));
        assert_eq!(lines.constraint.as_ref().and_then(|c| c.min_value), Some(1.0));
        assert!(tail.get_param("file").unwrap().required);
    }

    #[test]
    fn test_system_workspace_list_has_no_params() {
        let system = build_system_actions();
        assert!(system[0].params.is_empty());
        assert_eq!(system[0].owner_agent.as_deref(), Some("system-agent"));
    }
}
