//! Error types for path parsing and evaluation.

use crate::document::node::DocumentFormat;
use serde::Serialize;

/// Errors that can occur while validating, parsing or evaluating a path.
///
/// An empty result is not an error: zero matches is a successful query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryError {
    /// Malformed expression.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },
    /// Pre-flight syntax check failed before parsing began.
    #[error("Invalid path at position {position}: {message}")]
    Validation { position: usize, message: String },
    /// A step asks for a capability the document format does not have.
    #[error("{step} is not supported for {format} documents")]
    Unsupported {
        step: &'static str,
        format: DocumentFormat,
    },
    /// Recursive descent visited more nodes than the caller allowed.
    #[error("Query aborted after visiting {budget} nodes")]
    BudgetExceeded { budget: usize },
}

impl QueryError {
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        QueryError::Parse {
            position,
            message: message.into(),
        }
    }

    pub fn validation(position: usize, message: impl Into<String>) -> Self {
        QueryError::Validation {
            position,
            message: message.into(),
        }
    }

    /// Character offset into the expression, for syntax errors.
    pub fn position(&self) -> Option<usize> {
        match self {
            QueryError::Parse { position, .. } | QueryError::Validation { position, .. } => {
                Some(*position)
            }
            _ => None,
        }
    }
}
