//! Schema compiler
//!
//! Maps contract primitives to draft-07 JSON Schema documents for docs,
//! GUI forms and LLM tool descriptions.

use ice_core::{ActionDomain, ActionKind, ActionSpec, JsonMap, ParameterSpec, PrimitiveType, ResultFieldSpec};
use serde::Serialize;
use serde_json::{json, Value};

/// Dialect tag written into every action schema.
pub const JSON_SCHEMA_DRAFT: &str = "http://json-schema.org/draft-07/schema#";

// ============================================================================
// PRIMITIVES
// ============================================================================

/// Base schema fragment of a primitive type.
///
/// `choice` and `any` are unconstrained; choice membership is added from the
/// parameter constraint.
pub fn primitive_schema(primitive: PrimitiveType) -> JsonMap {
    let mut schema = JsonMap::new();
    let type_value = match primitive {
        PrimitiveType::String
        | PrimitiveType::Path
        | PrimitiveType::File
        | PrimitiveType::Directory => json!("string"),
        PrimitiveType::Integer => json!("integer"),
        PrimitiveType::Float => json!("number"),
        PrimitiveType::Boolean => json!("boolean"),
        PrimitiveType::Json => json!(["object", "array"]),
        PrimitiveType::Choice | PrimitiveType::Any => return schema,
    };
    schema.insert("type".to_string(), type_value);
    schema
}

/// Integral bounds are written as JSON integers.
pub(crate) fn number_value(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        json!(n as i64)
    } else {
        json!(n)
    }
}

// ============================================================================
// PARAMETERS AND RESULT FIELDS
// ============================================================================

/// Schema of one parameter.
///
/// Merge order: base type, description, default (when non-null), enum (only
/// for `choice` with declared choices), numeric bounds, length bounds.
pub fn parameter_schema(param: &ParameterSpec) -> Value {
    let mut schema = primitive_schema(param.param_type);

    if !param.description.is_empty() {
        schema.insert("description".to_string(), json!(param.description));
    }

    if let Some(default) = param.default_value() {
        schema.insert("default".to_string(), default.clone());
    }

    if let Some(constraint) = &param.constraint {
        if param.param_type == PrimitiveType::Choice {
            if let Some(choices) = constraint.choices.as_ref().filter(|c| !c.is_empty()) {
                schema.insert("enum".to_string(), Value::Array(choices.clone()));
            }
        }
        if let Some(min) = constraint.min_value {
            schema.insert("minimum".to_string(), number_value(min));
        }
        if let Some(max) = constraint.max_value {
            schema.insert("maximum".to_string(), number_value(max));
        }
        if let Some(min) = constraint.min_length {
            schema.insert("minLength".to_string(), json!(min));
        }
        if let Some(max) = constraint.max_length {
            schema.insert("maxLength".to_string(), json!(max));
        }
    }

    Value::Object(schema)
}

/// Soft schema of a result field. Documentation only.
pub fn result_field_schema(field: &ResultFieldSpec) -> Value {
    let description = if field.description.is_empty() {
        &field.field_type
    } else {
        &field.description
    };
    json!({
        "type": "object",
        "description": description,
    })
}

// ============================================================================
// ACTIONS
// ============================================================================

/// Full input schema of an action.
///
/// `additionalProperties` is `false` as soon as the action declares a
/// parameter, matching the unrecognized-key rule of the validator.
/// Argument-less actions stay open.
pub fn action_schema(action: &ActionSpec) -> Value {
    let mut properties = JsonMap::new();
    let mut required = Vec::new();

    for param in &action.params {
        properties.insert(param.name.clone(), parameter_schema(param));
        if param.required {
            required.push(param.name.clone());
        }
    }

    let mut schema = JsonMap::new();
    schema.insert("$schema".to_string(), json!(JSON_SCHEMA_DRAFT));
    schema.insert("title".to_string(), json!(action.name));
    schema.insert("description".to_string(), json!(action.description));
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    schema.insert(
        "additionalProperties".to_string(),
        json!(action.params.is_empty()),
    );
    if !required.is_empty() {
        schema.insert("required".to_string(), json!(required));
    }

    Value::Object(schema)
}

/// Input schema plus semantic metadata, for GUI / IDE / LLM consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaBundle {
    pub name: String,
    pub domain: ActionDomain,
    pub kind: ActionKind,
    pub version: String,
    pub deprecated: bool,
    pub tags: Vec<String>,
    pub owner_agent: Option<String>,
    pub input_schema: Value,
    pub result_fields: Vec<ResultFieldSpec>,
    pub metadata: JsonMap,
}

/// Build the schema bundle of an action.
pub fn action_schema_bundle(action: &ActionSpec) -> SchemaBundle {
    SchemaBundle {
        name: action.name.clone(),
        domain: action.domain,
        kind: action.kind,
        version: action.version.clone(),
        deprecated: action.deprecated,
        tags: action.tags.clone(),
        owner_agent: action.owner_agent.clone(),
        input_schema: action_schema(action),
        result_fields: action.result_fields.clone(),
        metadata: action.metadata.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ice_core::ValueConstraint;

    #[test]
    fn test_primitive_fragments() {
        assert_eq!(Value::Object(primitive_schema(PrimitiveType::Float)), json!({"type": "number"}));
        assert_eq!(Value::Object(primitive_schema(PrimitiveType::File)), json!({"type": "string"}));
        assert_eq!(
            Value::Object(primitive_schema(PrimitiveType::Json)),
            json!({"type": ["object", "array"]})
        );
        assert!(primitive_schema(PrimitiveType::Any).is_empty());
        assert!(primitive_schema(PrimitiveType::Choice).is_empty());
    }

    #[test]
    fn test_choice_param_emits_enum() {
        let param = ParameterSpec::new("mode", PrimitiveType::Choice)
            .with_constraint(ValueConstraint::new().with_choices(["a", "b"]));
        assert_eq!(parameter_schema(&param), json!({"enum": ["a", "b"]}));
    }

    #[test]
    fn test_empty_choices_emit_no_enum() {
        let param = ParameterSpec::new("mode", PrimitiveType::Choice)
            .with_constraint(ValueConstraint::new().with_choices(Vec::<Value>::new()));
        assert_eq!(parameter_schema(&param), json!({}));
    }

    #[test]
    fn test_choices_on_non_choice_type_emit_no_enum() {
        let param = ParameterSpec::new("mode", PrimitiveType::String)
            .with_constraint(ValueConstraint::new().with_choices(["a"]));
        assert_eq!(parameter_schema(&param), json!({"type": "string"}));
    }

    #[test]
    fn test_string_length_bounds() {
        let param = ParameterSpec::new("name", PrimitiveType::String)
            .with_constraint(ValueConstraint::new().with_min_length(2).with_max_length(5));
        assert_eq!(
            parameter_schema(&param),
            json!({"type": "string", "minLength": 2, "maxLength": 5})
        );
    }

    #[test]
    fn test_description_default_and_numeric_bounds() {
        let param = ParameterSpec::new("lines", PrimitiveType::Integer)
            .with_description("Number of lines")
            .with_default(100)
            .with_constraint(ValueConstraint::new().with_min_value(1.0).with_max_value(2.5));
        assert_eq!(
            parameter_schema(&param),
            json!({
                "type": "integer",
                "description": "Number of lines",
                "default": 100,
                "minimum": 1,
                "maximum": 2.5,
            })
        );
    }

    #[test]
    fn test_null_default_is_omitted() {
        let param = ParameterSpec::new("x", PrimitiveType::Any).with_default(Value::Null);
        assert_eq!(parameter_schema(&param), json!({}));
    }

    #[test]
    fn test_action_schema_shape() {
        let action = ActionSpec::new("logs.tail", ActionDomain::Logs, ActionKind::Query)
            .with_description("Tail a log file")
            .with_param(ParameterSpec::new("file", PrimitiveType::File).required())
            .with_param(ParameterSpec::new("follow", PrimitiveType::Boolean).with_default(false));
        assert_eq!(
            action_schema(&action),
            json!({
                "$schema": JSON_SCHEMA_DRAFT,
                "title": "logs.tail",
                "description": "Tail a log file",
                "type": "object",
                "properties": {
                    "file": {"type": "string"},
                    "follow": {"type": "boolean", "default": false},
                },
                "required": ["file"],
                "additionalProperties": false,
            })
        );
    }

    #[test]
    fn test_argument_less_action_schema_is_open_and_has_no_required() {
        let action = ActionSpec::new("system.workspace.list", ActionDomain::System, ActionKind::Query);
        let schema = action_schema(&action);
        assert_eq!(schema["additionalProperties"], json!(true));
        assert!(schema.get("required").is_none());
        assert_eq!(schema["properties"], json!({}));
    }

    #[test]
    fn test_result_field_schema_falls_back_to_type() {
        let field = ResultFieldSpec::new("files", "list[str]");
        assert_eq!(
            result_field_schema(&field),
            json!({"type": "object", "description": "list[str]"})
        );
        let field = field.with_description("Matched files");
        assert_eq!(result_field_schema(&field)["description"], json!("Matched files"));
    }

    #[test]
    fn test_bundle_fields() {
        let action = ActionSpec::new("code.explain", ActionDomain::Code, ActionKind::Analysis)
            .with_owner("code-agent")
            .with_tags(["code"])
            .with_result_field(ResultFieldSpec::new("explanation", "str"));
        let bundle = serde_json::to_value(action_schema_bundle(&action)).unwrap();
        assert_eq!(bundle["name"], json!("code.explain"));
        assert_eq!(bundle["domain"], json!("code"));
        assert_eq!(bundle["kind"], json!("analysis"));
        assert_eq!(bundle["version"], json!("v1"));
        assert_eq!(bundle["deprecated"], json!(false));
        assert_eq!(bundle["owner_agent"], json!("code-agent"));
        assert_eq!(bundle["input_schema"]["title"], json!("code.explain"));
        assert_eq!(
            bundle["result_fields"],
            json!([{"name": "explanation", "type": "str", "description": "", "required": true}])
        );
        assert_eq!(bundle["metadata"], json!({}));
    }

    #[test]
    fn test_number_value() {
        assert_eq!(number_value(3.0), json!(3));
        assert_eq!(number_value(-0.5), json!(-0.5));
    }
}
