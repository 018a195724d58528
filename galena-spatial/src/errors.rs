//! Error types for spatial indexing operations.

use galena::errors::GalenaError;
use thiserror::Error;

/// Errors that can occur in spatial indexing operations.
///
/// Invariant violations inside the tree (a directory entry without a
/// bounding box, a dangling node id) are defects and surface as
/// `InvalidState`; everything the caller can provoke arrives as a
/// wrapped core error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpatialError {
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Core(#[from] GalenaError),
}

/// Result type for spatial operations.
pub type SpatialResult<T> = Result<T, SpatialError>;
