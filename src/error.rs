//! Error types for the oracle.
//!
//! - Input errors: the object table cannot support the requested computation.
//! - State errors: a caller-built state does not fit the index.
//! - Resource errors: a configured cap on states or time was hit.
//! - Invariant errors: a read of the policy table found something the
//!   solver should have recorded.

use thiserror::Error;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("object table is empty")]
    EmptyUniverse,

    #[error("object `{object}` has no value for attribute `{attribute}`")]
    MalformedInput { object: String, attribute: String },

    #[error("state does not fit the index: {0}")]
    InvalidState(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OracleError {
    /// Creates an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns whether the error is caused by a configured limit rather than by the input.
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, Self::ResourceExhausted(_))
    }
}

/// Result type alias for the oracle.
pub type Result<T> = std::result::Result<T, OracleError>;
