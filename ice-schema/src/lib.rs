//! ICE Schema - Schema Compiler and Validation Engine
//!
//! Derives machine-checkable artifacts from action contracts:
//! - `compiler`: draft-07 JSON Schema documents and schema bundles
//! - `validation`: soft, non-coercive runtime parameter validation

pub mod compiler;
pub mod validation;

pub use compiler::{
    action_schema, action_schema_bundle, parameter_schema, primitive_schema, result_field_schema,
    SchemaBundle, JSON_SCHEMA_DRAFT,
};
pub use validation::{
    constraint_violations, type_matches, validate_param, validate_params, IssueKind,
    ValidationIssue, ValidationResult,
};
