//! Catalog assembly errors

use ice_core::ContractError;
use ice_ipc::{ApiError, ErrorCode};
use thiserror::Error;

/// Errors raised while assembling a catalog.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Duplicate action name: {0}")]
    DuplicateAction(String),

    #[error(transparent)]
    InvalidAction(#[from] ContractError),
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::new(ErrorCode::Internal, err.to_string())
    }
}
