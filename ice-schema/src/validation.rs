//! Parameter validation engine
//!
//! Checks a runtime parameter payload against an action's declared
//! parameters. Validation never fails by itself: it returns a
//! `ValidationResult` value, and only `ensure_valid` escalates it into a
//! coded `api.params.invalid` error.

use crate::compiler::number_value;
use ice_core::{ActionSpec, JsonMap, ParameterSpec, PrimitiveType, ValueConstraint};
use ice_ipc::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// VALIDATION STRUCTURES
// ============================================================================

/// Category of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Required parameter absent with no default
    Missing,
    /// Value has the wrong shape for the declared type
    InvalidType,
    /// Value violates a declared bound or choice set
    Constraint,
    /// Payload key not declared by the action
    Unrecognized,
}

/// One problem found in a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub param: String,
    pub kind: IssueKind,
    pub message: String,
}

impl ValidationIssue {
    /// Create a new issue.
    pub fn new(param: impl Into<String>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of validating one payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True iff `issues` is empty
    pub ok: bool,
    /// Issues in discovery order
    pub issues: Vec<ValidationIssue>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::valid()
    }
}

impl ValidationResult {
    /// Create a valid result with no issues.
    pub fn valid() -> Self {
        Self {
            ok: true,
            issues: Vec::new(),
        }
    }

    /// Add an issue; the result becomes invalid.
    pub fn add_issue(&mut self, issue: ValidationIssue) {
        self.ok = false;
        self.issues.push(issue);
    }

    /// Issues recorded against one parameter.
    pub fn issues_for<'a>(&'a self, param: &'a str) -> impl Iterator<Item = &'a ValidationIssue> {
        self.issues.iter().filter(move |i| i.param == param)
    }

    /// Parameter -> message map. The last message recorded for a parameter wins.
    pub fn error_map(&self) -> BTreeMap<String, String> {
        self.issues
            .iter()
            .map(|i| (i.param.clone(), i.message.clone()))
            .collect()
    }

    /// Escalate a non-ok result into an `api.params.invalid` error.
    pub fn ensure_valid(&self, action_name: &str) -> ApiResult<()> {
        if self.ok {
            return Ok(());
        }
        tracing::debug!(
            action = %action_name,
            issues = self.issues.len(),
            "Parameter validation failed"
        );
        Err(ApiError::invalid_parameters(action_name, &self.error_map()))
    }
}

// ============================================================================
// SINGLE PARAMETER
// ============================================================================

/// Structural, non-coercive type check.
pub fn type_matches(value: &Value, primitive: PrimitiveType) -> bool {
    match primitive {
        PrimitiveType::String
        | PrimitiveType::Path
        | PrimitiveType::File
        | PrimitiveType::Directory => value.is_string(),
        PrimitiveType::Integer => value.is_i64() || value.is_u64(),
        PrimitiveType::Float => value.is_number(),
        PrimitiveType::Boolean => value.is_boolean(),
        PrimitiveType::Json => value.is_object() || value.is_array(),
        PrimitiveType::Choice | PrimitiveType::Any => true,
    }
}

fn fmt_bound(n: f64) -> String {
    number_value(n).to_string()
}

/// Equality with numbers compared by value (`1` equals `1.0`).
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Every violated bound, in check order. Nothing short-circuits.
pub fn constraint_violations(value: &Value, constraint: &ValueConstraint) -> Vec<String> {
    let mut violations = Vec::new();

    if let Some(n) = value.as_f64() {
        if let Some(min) = constraint.min_value.filter(|min| n < *min) {
            violations.push(format!("value < min_value ({})", fmt_bound(min)));
        }
        if let Some(max) = constraint.max_value.filter(|max| n > *max) {
            violations.push(format!("value > max_value ({})", fmt_bound(max)));
        }
    }

    if let Some(s) = value.as_str() {
        let len = s.chars().count();
        if let Some(min) = constraint.min_length.filter(|min| len < *min) {
            violations.push(format!("length < min_length ({})", min));
        }
        if let Some(max) = constraint.max_length.filter(|max| len > *max) {
            violations.push(format!("length > max_length ({})", max));
        }
    }

    if let Some(choices) = &constraint.choices {
        if !choices.iter().any(|c| json_eq(c, value)) {
            violations.push(format!(
                "value not allowed, allowed: {}",
                Value::Array(choices.clone())
            ));
        }
    }

    violations
}

/// Validate one declared parameter against its effective value.
///
/// A provided `null` counts as absent and falls back to the default.
pub fn validate_param(param: &ParameterSpec, provided: Option<&Value>) -> Vec<ValidationIssue> {
    let effective = provided
        .filter(|v| !v.is_null())
        .or_else(|| param.default_value());

    let Some(value) = effective else {
        if param.required && !param.has_default() {
            return vec![ValidationIssue::new(
                &param.name,
                IssueKind::Missing,
                "Required parameter not provided",
            )];
        }
        return Vec::new();
    };

    if !type_matches(value, param.param_type) {
        return vec![ValidationIssue::new(
            &param.name,
            IssueKind::InvalidType,
            format!("Invalid type (expected {})", param.param_type),
        )];
    }

    param
        .constraint
        .as_ref()
        .map(|c| constraint_violations(value, c))
        .unwrap_or_default()
        .into_iter()
        .map(|msg| ValidationIssue::new(&param.name, IssueKind::Constraint, msg))
        .collect()
}

// ============================================================================
// ACTION
// ============================================================================

/// Validate a runtime payload against an action contract.
///
/// Declared parameters are checked in declaration order. When the action
/// declares at least one parameter, undeclared payload keys are reported as
/// unrecognized; argument-less actions accept any payload.
pub fn validate_params(action: &ActionSpec, params: &JsonMap) -> ValidationResult {
    let mut result = ValidationResult::valid();

    for param in &action.params {
        for issue in validate_param(param, params.get(&param.name)) {
            result.add_issue(issue);
        }
    }

    if !action.params.is_empty() {
        for key in params.keys() {
            if action.get_param(key).is_none() {
                result.add_issue(ValidationIssue::new(
                    key,
                    IssueKind::Unrecognized,
                    "Parameter not recognized by action",
                ));
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use ice_core::{ActionDomain, ActionKind};
    use ice_ipc::ErrorCode;
    use serde_json::json;

    fn params(value: Value) -> JsonMap {
        match value {
            Value::Object(map) => map,
            _ => JsonMap::new(),
        }
    }

    fn tail_action() -> ActionSpec {
        ActionSpec::new("logs.tail", ActionDomain::Logs, ActionKind::Query)
            .with_param(ParameterSpec::new("file", PrimitiveType::File).required())
            .with_param(
                ParameterSpec::new("lines", PrimitiveType::Integer)
                    .with_default(100)
                    .with_constraint(ValueConstraint::new().with_min_value(1.0)),
            )
            .with_param(ParameterSpec::new("follow", PrimitiveType::Boolean).with_default(false))
    }

    #[test]
    fn test_valid_payload() {
        let result = validate_params(&tail_action(), &params(json!({"file": "app.log", "lines": 5})));
        assert!(result.ok);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_missing_required() {
        let result = validate_params(&tail_action(), &JsonMap::new());
        assert!(!result.ok);
        assert_eq!(
            result.issues,
            vec![ValidationIssue::new("file", IssueKind::Missing, "Required parameter not provided")]
        );
    }

    #[test]
    fn test_required_with_default_is_satisfied() {
        let action = ActionSpec::new("a.b", ActionDomain::Other, ActionKind::Query).with_param(
            ParameterSpec::new("mode", PrimitiveType::String)
                .required()
                .with_default("fast"),
        );
        assert!(validate_params(&action, &JsonMap::new()).ok);
    }

    #[test]
    fn test_null_counts_as_absent() {
        let result = validate_params(&tail_action(), &params(json!({"file": null})));
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind, IssueKind::Missing);
    }

    #[test]
    fn test_type_failure_skips_constraints() {
        let result = validate_params(&tail_action(), &params(json!({"file": "a", "lines": "0"})));
        assert_eq!(
            result.issues,
            vec![ValidationIssue::new(
                "lines",
                IssueKind::InvalidType,
                "Invalid type (expected integer)"
            )]
        );
    }

    #[test]
    fn test_float_rejected_for_integer_but_accepted_for_float() {
        assert!(!type_matches(&json!(1.5), PrimitiveType::Integer));
        assert!(type_matches(&json!(1), PrimitiveType::Float));
        assert!(type_matches(&json!(1.5), PrimitiveType::Float));
        assert!(!type_matches(&json!(true), PrimitiveType::Integer));
        assert!(!type_matches(&json!(1), PrimitiveType::Boolean));
        assert!(type_matches(&json!([1]), PrimitiveType::Json));
        assert!(!type_matches(&json!("x"), PrimitiveType::Json));
        assert!(type_matches(&json!(null), PrimitiveType::Any));
    }

    #[test]
    fn test_min_value_violation() {
        let result = validate_params(&tail_action(), &params(json!({"file": "a", "lines": 0})));
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].message, "value < min_value (1)");
        assert_eq!(result.issues[0].kind, IssueKind::Constraint);
    }

    #[test]
    fn test_max_length_violation() {
        let action = ActionSpec::new("a.b", ActionDomain::Other, ActionKind::Query).with_param(
            ParameterSpec::new("name", PrimitiveType::String)
                .with_constraint(ValueConstraint::new().with_max_length(3)),
        );
        let result = validate_params(&action, &params(json!({"name": "abcd"})));
        assert_eq!(result.issues[0].message, "length > max_length (3)");

        // length counts characters, not bytes
        assert!(validate_params(&action, &params(json!({"name": "äöü"}))).ok);
    }

    #[test]
    fn test_min_and_choice_accumulate() {
        let action = ActionSpec::new("a.b", ActionDomain::Other, ActionKind::Query).with_param(
            ParameterSpec::new("level", PrimitiveType::Integer).with_constraint(
                ValueConstraint::new().with_min_value(2.0).with_choices([2, 3]),
            ),
        );
        let result = validate_params(&action, &params(json!({"level": 1})));
        let messages: Vec<_> = result.issues.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(messages, vec!["value < min_value (2)", "value not allowed, allowed: [2,3]"]);
    }

    #[test]
    fn test_choice_membership_is_numeric_aware() {
        let action = ActionSpec::new("a.b", ActionDomain::Other, ActionKind::Query).with_param(
            ParameterSpec::new("ratio", PrimitiveType::Float)
                .with_constraint(ValueConstraint::new().with_choices([1.0, 2.0])),
        );
        assert!(validate_params(&action, &params(json!({"ratio": 1}))).ok);
    }

    #[test]
    fn test_empty_choices_reject_everything() {
        let action = ActionSpec::new("a.b", ActionDomain::Other, ActionKind::Query).with_param(
            ParameterSpec::new("mode", PrimitiveType::Choice)
                .with_constraint(ValueConstraint::new().with_choices(Vec::<Value>::new())),
        );
        let result = validate_params(&action, &params(json!({"mode": "a"})));
        assert_eq!(result.issues[0].message, "value not allowed, allowed: []");
    }

    #[test]
    fn test_length_bounds_ignored_for_numbers() {
        let action = ActionSpec::new("a.b", ActionDomain::Other, ActionKind::Query).with_param(
            ParameterSpec::new("x", PrimitiveType::Any)
                .with_constraint(ValueConstraint::new().with_max_length(1).with_min_value(0.0)),
        );
        assert!(validate_params(&action, &params(json!({"x": 12345}))).ok);
        assert!(validate_params(&action, &params(json!({"x": "y"}))).ok);
    }

    #[test]
    fn test_unrecognized_keys() {
        let result = validate_params(&tail_action(), &params(json!({"file": "a", "bogus": 1})));
        assert_eq!(
            result.issues,
            vec![ValidationIssue::new(
                "bogus",
                IssueKind::Unrecognized,
                "Parameter not recognized by action"
            )]
        );
    }

    #[test]
    fn test_argument_less_action_accepts_anything() {
        let action = ActionSpec::new("system.workspace.list", ActionDomain::System, ActionKind::Query);
        assert!(validate_params(&action, &params(json!({"anything": [1, 2]}))).ok);
    }

    #[test]
    fn test_ensure_valid_last_message_wins() {
        let mut result = ValidationResult::valid();
        result.add_issue(ValidationIssue::new("x", IssueKind::Constraint, "first"));
        result.add_issue(ValidationIssue::new("x", IssueKind::Constraint, "second"));
        assert_eq!(result.issues_for("x").count(), 2);

        let err = result.ensure_valid("a.b").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParameters);
        let details = err.details.unwrap();
        assert_eq!(details["action"], json!("a.b"));
        assert_eq!(details["errors"], json!({"x": "second"}));
    }

    #[test]
    fn test_ensure_valid_passes_ok_result() {
        assert!(ValidationResult::default().ensure_valid("a.b").is_ok());
    }
}
