//! # Galena Spatial - R*-Tree Indexing and Distance Queries
//!
//! This crate provides the spatial index engine of the Galena
//! data-mining toolkit: an R*-tree with pluggable overflow
//! (forced-reinsertion) and bulk-load strategies, and the distance
//! query layer (range, k-nearest-neighbor, reverse-k-nearest-
//! neighbor) in both linear-scan and branch-and-bound tree-search
//! form.
//!
//! ## Features
//!
//! - **Sum-type data model**: leaf and directory entries as one enum,
//!   matched exhaustively
//! - **Pluggable strategies**: overflow treatment, reinsertion
//!   candidate selection, and bulk-load partitioning are traits
//!   chosen at construction
//! - **Deterministic queries**: results ordered by `(distance, id)`;
//!   linear and index-accelerated engines agree exactly
//! - **Append-only**: insertion and bulk building only; deletion is
//!   out of scope and fails loudly
//!
//! ## Quick Start
//!
//! ```rust
//! use galena::{ObjectId, Relation, VectorRelation};
//! use galena_spatial::{Insertable, KnnCapable, RStarTree, RStarTreeConfig};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let relation = Arc::new(VectorRelation::from_pairs(vec![
//!     (ObjectId::from(1), vec![0.0, 0.0]),
//!     (ObjectId::from(2), vec![1.0, 0.0]),
//!     (ObjectId::from(3), vec![0.0, 1.0]),
//! ])?);
//!
//! let tree = RStarTree::new(relation.clone(), RStarTreeConfig::default())?;
//! for id in relation.ids() {
//!     tree.insert(id)?;
//! }
//!
//! let nearest = tree.knn_query(&[0.0, 0.0], 2)?;
//! assert_eq!(nearest[0].id, ObjectId::from(1));
//! # Ok(())
//! # }
//! ```

// Geometric data model
pub mod bounding_box;
pub mod entry;
pub mod node;

// Tree and strategies
pub mod config;
pub mod rstar;

// Query engines
pub mod query;

pub mod errors;

// Re-export the data model
pub use bounding_box::BoundingBox;
pub use entry::SpatialEntry;
pub use errors::{SpatialError, SpatialResult};
pub use node::{MemoryNodeStore, Node, NodeId, NodeStore, TreePath};

// Re-export tree types
pub use config::RStarTreeConfig;
pub use rstar::{
    BulkLoadStrategy, CloseReinsert, LimitedReinsertOverflow, OverflowTreatment, RStarTree,
    ReinsertLevels, ReinsertStrategy, SortTileRecursive, SplitOverflow, TreeStats,
};

// Re-export the query layer
pub use query::linear::LinearScan;
pub use query::priority::{KnnCollector, SearchCandidate};
pub use query::{Insertable, KnnCapable, RangeCapable, RknnCapable, SpatialDistance};
