//! Primitive value shapes and optional bounds

use crate::error::ContractError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Semantic value shape of a parameter, independent of any host type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Integer,
    Float,
    Boolean,
    Path,
    File,
    Directory,
    Json,
    Choice,
    Any,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 10] = [
        PrimitiveType::String,
        PrimitiveType::Integer,
        PrimitiveType::Float,
        PrimitiveType::Boolean,
        PrimitiveType::Path,
        PrimitiveType::File,
        PrimitiveType::Directory,
        PrimitiveType::Json,
        PrimitiveType::Choice,
        PrimitiveType::Any,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Float => "float",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Path => "path",
            PrimitiveType::File => "file",
            PrimitiveType::Directory => "directory",
            PrimitiveType::Json => "json",
            PrimitiveType::Choice => "choice",
            PrimitiveType::Any => "any",
        }
    }

    /// Numeric shapes accept integer or floating JSON numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, PrimitiveType::Integer | PrimitiveType::Float)
    }

    /// Filesystem shapes are strings on the wire.
    pub fn is_path_like(&self) -> bool {
        matches!(
            self,
            PrimitiveType::Path | PrimitiveType::File | PrimitiveType::Directory
        )
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrimitiveType {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        PrimitiveType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ContractError::InvalidPrimitive(s.to_string()))
    }
}

/// Optional bounds attached to a parameter.
///
/// Every field is independent. Enforcement is type-directed: numeric bounds
/// only apply to numbers, length bounds only to strings and choice
/// membership only when `choices` is declared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueConstraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl ValueConstraint {
    /// Create an empty constraint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict values to a closed set.
    pub fn with_choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_min_value(mut self, min: f64) -> Self {
        self.min_value = Some(min);
        self
    }

    pub fn with_max_value(mut self, max: f64) -> Self {
        self.max_value = Some(max);
        self
    }

    pub fn with_min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// True if no bound is declared.
    pub fn is_empty(&self) -> bool {
        self.choices.is_none()
            && self.min_value.is_none()
            && self.max_value.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
    }
}
