//! Error types for contract construction

use thiserror::Error;

/// Errors raised while building or parsing contract data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContractError {
    #[error("Invalid action name '{name}': {reason}")]
    InvalidActionName { name: String, reason: String },

    #[error("Duplicate parameter '{param}' in action '{action}'")]
    DuplicateParameter { action: String, param: String },

    #[error("Unknown action domain: {0}")]
    InvalidDomain(String),

    #[error("Unknown action kind: {0}")]
    InvalidKind(String),

    #[error("Unknown primitive type: {0}")]
    InvalidPrimitive(String),
}

/// Result type for contract operations.
pub type ContractResult<T> = Result<T, ContractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_the_offender() {
        let err = ContractError::DuplicateParameter {
            action: "logs.scan".to_string(),
            param: "path".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate parameter 'path' in action 'logs.scan'");

        let err = ContractError::InvalidDomain("cv".to_string());
        assert!(err.to_string().contains("cv"));
    }
}
