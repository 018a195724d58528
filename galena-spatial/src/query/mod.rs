//! Distance queries: range, k-nearest-neighbor, and reverse
//! k-nearest-neighbor, by linear scan or by tree search.
//!
//! Engines expose small capability traits composed per index type
//! instead of an interface hierarchy. All engines produce
//! [`DistanceResultPair`]s in ascending `(distance, id)` order, so
//! the linear and index-accelerated variants agree exactly, ties
//! included.

pub mod linear;
pub mod priority;
pub mod rknn;

use galena::cancel::CancellationToken;
use galena::distance::{
    DistanceFunction, DistanceResultPair, EuclideanDistance, ManhattanDistance,
    SquaredEuclideanDistance,
};
use galena::errors::{GalenaError, GalenaResult};
use galena::id::ObjectId;
use galena::relation::Relation;

use crate::bounding_box::BoundingBox;
use crate::errors::SpatialResult;

/// Mutation capability of an index.
pub trait Insertable {
    /// Inserts one relation member into the index.
    fn insert(&self, id: ObjectId) -> SpatialResult<()>;

    /// Builds the index from a batch of relation members. The
    /// resulting index is static.
    fn bulk_load(&self, ids: &[ObjectId]) -> SpatialResult<()>;

    /// Deletion is not supported; always fails loudly.
    fn delete(&self, id: ObjectId) -> SpatialResult<()>;
}

/// Range query capability.
pub trait RangeCapable {
    /// All ids with `distance(query, id) <= radius`, sorted ascending
    /// by `(distance, id)` — no false positives or negatives.
    fn range_query(&self, query: &[f64], radius: f64) -> SpatialResult<Vec<DistanceResultPair>>;
}

/// K-nearest-neighbor capability.
pub trait KnnCapable {
    /// The k nearest pairs in `(distance, id)` order; fewer when the
    /// relation holds fewer than k members. Boundary ties resolve by
    /// id.
    fn knn_query(&self, query: &[f64], k: usize) -> SpatialResult<Vec<DistanceResultPair>>;

    /// Answers a batch of member queries. Cancellation is checked
    /// between queries; a cancelled run yields no partial results.
    fn bulk_knn_query(
        &self,
        queries: &[ObjectId],
        k: usize,
        cancel: Option<&CancellationToken>,
    ) -> SpatialResult<Vec<Vec<DistanceResultPair>>>;
}

/// Reverse k-nearest-neighbor capability: "who has the query among
/// their k nearest?"
pub trait RknnCapable {
    /// All ids whose k-th-neighbor distance is at least their
    /// distance to the query, sorted by `(distance, id)`. Members
    /// with fewer than k neighbors always qualify.
    fn rknn_query(&self, query: &[f64], k: usize) -> SpatialResult<Vec<DistanceResultPair>>;

    /// Answers a batch of member queries with a single
    /// k-th-distance table build. Cancellation is checked between
    /// iterations; all-or-nothing.
    fn bulk_rknn_query(
        &self,
        queries: &[ObjectId],
        k: usize,
        cancel: Option<&CancellationToken>,
    ) -> SpatialResult<Vec<Vec<DistanceResultPair>>>;
}

/// A distance that can also lower-bound itself against a bounding
/// box.
///
/// `min_dist` must never exceed the true minimum distance from the
/// point to anything inside the box — the admissibility requirement
/// of branch-and-bound search.
pub trait SpatialDistance: DistanceFunction {
    fn min_dist(&self, mbr: &BoundingBox, point: &[f64]) -> f64;
}

impl SpatialDistance for EuclideanDistance {
    fn min_dist(&self, mbr: &BoundingBox, point: &[f64]) -> f64 {
        mbr.min_dist_sq(point).sqrt()
    }
}

impl SpatialDistance for SquaredEuclideanDistance {
    fn min_dist(&self, mbr: &BoundingBox, point: &[f64]) -> f64 {
        mbr.min_dist_sq(point)
    }
}

impl SpatialDistance for ManhattanDistance {
    fn min_dist(&self, mbr: &BoundingBox, point: &[f64]) -> f64 {
        let mut sum = 0.0;
        for d in 0..point.len() {
            let clamped = point[d].clamp(mbr.min()[d], mbr.max()[d]);
            sum += (point[d] - clamped).abs();
        }
        sum
    }
}

pub(crate) fn validate_k(k: usize) -> GalenaResult<()> {
    if k == 0 {
        return Err(GalenaError::InvalidQuery("k must be at least 1".into()));
    }
    Ok(())
}

pub(crate) fn validate_radius(radius: f64) -> GalenaResult<()> {
    if radius.is_nan() || radius < 0.0 {
        return Err(GalenaError::InvalidQuery(format!(
            "radius must be non-negative, got {}",
            radius
        )));
    }
    Ok(())
}

pub(crate) fn validate_query_dims(relation: &dyn Relation, query: &[f64]) -> GalenaResult<()> {
    if let Some(expected) = relation.dimensionality() {
        if expected != query.len() {
            return Err(GalenaError::DimensionMismatch {
                expected,
                actual: query.len(),
            });
        }
    }
    Ok(())
}
