//! Error taxonomy for the Galena toolkit.
//!
//! All fallible operations in the core crate return [`GalenaResult`].
//! Query-parameter problems are reported before any traversal starts;
//! an empty relation is never an error, only an empty result.

use thiserror::Error;

use crate::id::ObjectId;

/// Errors that can occur in toolkit operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GalenaError {
    /// A construction-time parameter is out of its valid range.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Two vectors of differing dimensionality were compared.
    #[error("dimension mismatch: expected {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The operation is not supported by this component.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// A query parameter is invalid (e.g. k = 0, negative radius).
    #[error("invalid query parameter: {0}")]
    InvalidQuery(String),

    /// The object id is not present in the relation.
    #[error("object {0} not found in relation")]
    NotFound(ObjectId),

    /// A bulk query was cancelled cooperatively; no partial results.
    #[error("operation cancelled")]
    Cancelled,
}

/// Result type for toolkit operations.
pub type GalenaResult<T> = Result<T, GalenaError>;
