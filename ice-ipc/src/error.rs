//! Error Types for ICE surfaces
//!
//! This module defines the coded error vocabulary shared by every consumer:
//! - ApiError struct for structured error payloads
//! - ErrorCode enum serialized as stable dotted codes
//!
//! Errors cross component boundaries only as these values, never as raw
//! host-language failures.

use ice_core::ActionError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for action and dispatch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Unclassified failure
    #[serde(rename = "api.error")]
    Generic,

    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// No action or handler with this name
    #[serde(rename = "api.action.not_found")]
    ActionNotFound,

    /// No agent with this name
    #[serde(rename = "api.agent.not_found")]
    AgentNotFound,

    /// Workspace could not be activated
    #[serde(rename = "api.workspace.not_found")]
    WorkspaceNotFound,

    // ========================================================================
    // Request Errors
    // ========================================================================
    /// Parameters failed contract validation
    #[serde(rename = "api.params.invalid")]
    InvalidParameters,

    /// No workspace id could be resolved for a scoped action
    #[serde(rename = "api.workspace.missing")]
    MissingWorkspace,

    /// Access denied
    #[serde(rename = "api.permission.denied")]
    PermissionDenied,

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// Handler failed while running
    #[serde(rename = "api.action.execution")]
    ExecutionFailed,

    /// Owning agent could not be determined
    #[serde(rename = "api.orchestrator.routing")]
    RoutingFailed,

    /// A required runtime capability is not available
    #[serde(rename = "api.capability.unavailable")]
    CapabilityUnavailable,

    /// Two handlers registered under one name
    #[serde(rename = "api.registry.duplicate")]
    DuplicateRegistration,

    /// Internal failure (panics, serialization)
    #[serde(rename = "api.internal")]
    Internal,
}

impl ErrorCode {
    /// Stable dotted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Generic => "api.error",
            ErrorCode::ActionNotFound => "api.action.not_found",
            ErrorCode::AgentNotFound => "api.agent.not_found",
            ErrorCode::WorkspaceNotFound => "api.workspace.not_found",
            ErrorCode::InvalidParameters => "api.params.invalid",
            ErrorCode::MissingWorkspace => "api.workspace.missing",
            ErrorCode::PermissionDenied => "api.permission.denied",
            ErrorCode::ExecutionFailed => "api.action.execution",
            ErrorCode::RoutingFailed => "api.orchestrator.routing",
            ErrorCode::CapabilityUnavailable => "api.capability.unavailable",
            ErrorCode::DuplicateRegistration => "api.registry.duplicate",
            ErrorCode::Internal => "api.internal",
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Generic => "Request failed",
            ErrorCode::ActionNotFound => "Action not found",
            ErrorCode::AgentNotFound => "Agent not found",
            ErrorCode::WorkspaceNotFound => "Workspace not found",
            ErrorCode::InvalidParameters => "Invalid parameters",
            ErrorCode::MissingWorkspace => "Missing workspace_id",
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::ExecutionFailed => "Action execution failed",
            ErrorCode::RoutingFailed => "Unable to route action",
            ErrorCode::CapabilityUnavailable => "Capability unavailable",
            ErrorCode::DuplicateRegistration => "Duplicate registration",
            ErrorCode::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error payload `{code, message, details}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional structured details (offending action, parameter map, cause)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    // ========================================================================
    // Convenience constructors for the taxonomy
    // ========================================================================

    /// Create a generic error.
    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Generic, message)
    }

    /// Create an ActionNotFound error.
    pub fn action_not_found(action: &str) -> Self {
        Self::new(ErrorCode::ActionNotFound, format!("Unknown action: {}", action))
            .with_details(json!({ "action": action }))
    }

    /// Create an AgentNotFound error.
    pub fn agent_not_found(agent: &str) -> Self {
        Self::new(ErrorCode::AgentNotFound, format!("Unknown agent: {}", agent))
            .with_details(json!({ "agent": agent }))
    }

    /// Create an InvalidParameters error carrying the parameter -> message map.
    pub fn invalid_parameters(action: &str, errors: &BTreeMap<String, String>) -> Self {
        Self::new(
            ErrorCode::InvalidParameters,
            format!("Invalid parameters for '{}'", action),
        )
        .with_details(json!({ "action": action, "errors": errors }))
    }

    /// Create an ExecutionFailed error from any failing cause.
    ///
    /// The cause is recorded by its short type name and display string.
    /// `partial_result` is kept verbatim.
    pub fn execution<E>(action: &str, agent: &str, cause: &E, partial_result: Option<Value>) -> Self
    where
        E: std::error::Error,
    {
        Self::execution_with(
            action,
            agent,
            short_type_name::<E>(),
            &cause.to_string(),
            partial_result,
        )
    }

    /// Create an ExecutionFailed error from an already classified cause.
    pub fn execution_with(
        action: &str,
        agent: &str,
        exception_type: &str,
        exception_message: &str,
        partial_result: Option<Value>,
    ) -> Self {
        Self::new(
            ErrorCode::ExecutionFailed,
            format!("Error while executing '{}' by '{}'", action, agent),
        )
        .with_details(json!({
            "action": action,
            "agent": agent,
            "exception_type": exception_type,
            "exception_message": exception_message,
            "partial_result": partial_result,
        }))
    }

    /// Create a RoutingFailed error.
    pub fn routing(action: &str) -> Self {
        Self::new(
            ErrorCode::RoutingFailed,
            format!("Unable to determine the agent for '{}'", action),
        )
        .with_details(json!({ "action": action }))
    }

    /// Create a PermissionDenied error.
    pub fn permission_denied(action: &str) -> Self {
        Self::new(
            ErrorCode::PermissionDenied,
            format!("Permission denied for '{}'", action),
        )
        .with_details(json!({ "action": action }))
    }

    /// Create a WorkspaceNotFound error.
    pub fn workspace_not_found(workspace_id: &str, reason: impl fmt::Display) -> Self {
        Self::new(ErrorCode::WorkspaceNotFound, reason.to_string())
            .with_details(json!({ "workspace_id": workspace_id }))
    }

    /// Create a MissingWorkspace error.
    pub fn missing_workspace(action: &str) -> Self {
        Self::from_code(ErrorCode::MissingWorkspace).with_details(json!({ "action": action }))
    }

    /// Create a CapabilityUnavailable error.
    pub fn capability_unavailable(capability: &str) -> Self {
        Self::new(
            ErrorCode::CapabilityUnavailable,
            format!("{} not available", capability),
        )
        .with_details(json!({ "capability": capability }))
    }

    /// Create a DuplicateRegistration error.
    pub fn duplicate_registration(action: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateRegistration,
            format!("Handler for '{}' is already registered", action),
        )
        .with_details(json!({ "action": action }))
    }

    /// Create an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    /// Convert into the logical error attached to an `ActionResult`.
    pub fn to_action_error(&self) -> ActionError {
        let details = match &self.details {
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                let mut map = serde_json::Map::new();
                map.insert("value".to_string(), other.clone());
                map
            }
            None => serde_json::Map::new(),
        };
        ActionError {
            code: self.code.as_str().to_string(),
            message: self.message.clone(),
            details,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// CONVERSIONS FROM STANDARD ERRORS
// ============================================================================

/// Convert from serde_json::Error to ApiError.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON serialization error: {:?}", err);
        ApiError::internal(format!("Invalid JSON: {}", err))
    }
}

/// Convert from std::io::Error to ApiError.
impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::generic(err.to_string())
    }
}

/// Last path segment of a type name, generics stripped.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for handler and dispatch operations.
pub type ApiResult<T> = Result<T, ApiError>;


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_error_code() -> impl Strategy<Value = ErrorCode> {
        prop_oneof![
            Just(ErrorCode::Generic),
            Just(ErrorCode::ActionNotFound),
            Just(ErrorCode::AgentNotFound),
            Just(ErrorCode::WorkspaceNotFound),
            Just(ErrorCode::InvalidParameters),
            Just(ErrorCode::MissingWorkspace),
            Just(ErrorCode::PermissionDenied),
            Just(ErrorCode::ExecutionFailed),
            Just(ErrorCode::RoutingFailed),
            Just(ErrorCode::CapabilityUnavailable),
            Just(ErrorCode::DuplicateRegistration),
            Just(ErrorCode::Internal),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The serde name and `as_str` agree for every code.
        #[test]
        fn prop_code_wire_name_matches_as_str(code in arb_error_code()) {
            let wire = serde_json::to_value(code).unwrap();
            prop_assert_eq!(wire, json!(code.as_str()));
            prop_assert!(code.as_str().starts_with("api."));
        }

        /// Display always leads with the code.
        #[test]
        fn prop_display_leads_with_code(code in arb_error_code(), message in ".{0,40}") {
            let err = ApiError::new(code, message.clone());
            prop_assert_eq!(err.to_string(), format!("{}: {}", code.as_str(), message));
        }
    }
}
