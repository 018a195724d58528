//! # Galena Core - Data Model for the Galena Data-Mining Toolkit
//!
//! This crate provides the shared data model consumed by the Galena
//! index and query layers:
//!
//! - **Object identity**: stable, ordered, hashable [`ObjectId`]s
//! - **Relations**: id-addressable vector stores ([`Relation`],
//!   [`VectorRelation`])
//! - **Distances**: comparable [`DistanceValue`]s with sentinels,
//!   pluggable [`DistanceFunction`]s, and relation-bound
//!   [`DistanceQuery`]s
//! - **Errors**: the toolkit-wide taxonomy ([`GalenaError`])
//! - **Cancellation**: cooperative [`CancellationToken`] for bulk
//!   queries
//!
//! ## Quick Start
//!
//! ```rust
//! use galena::{DistanceQuery, EuclideanDistance, ObjectId, VectorRelation};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let relation = VectorRelation::from_pairs(vec![
//!     (ObjectId::from(1), vec![0.0, 0.0]),
//!     (ObjectId::from(2), vec![3.0, 4.0]),
//! ])?;
//!
//! let dq = DistanceQuery::new(Arc::new(relation), Arc::new(EuclideanDistance));
//! let d = dq.distance_between(ObjectId::from(1), ObjectId::from(2))?;
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod distance;
pub mod errors;
pub mod id;
pub mod relation;

pub use cancel::CancellationToken;
pub use distance::{
    DistanceFunction, DistanceQuery, DistanceResultPair, DistanceValue, EuclideanDistance,
    ManhattanDistance, SquaredEuclideanDistance,
};
pub use errors::{GalenaError, GalenaResult};
pub use id::ObjectId;
pub use relation::{Relation, VectorRelation};
