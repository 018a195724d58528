//! Shared machinery for reverse-k-nearest-neighbor queries.
//!
//! An id is a reverse neighbor of a query iff the query lies within
//! the id's own k-nearest neighborhood, i.e. `distance(query, id) <=
//! kth_dist(id)`. Both the linear and the index-accelerated engines
//! reduce to the same two steps: build the k-th-distance table over
//! the relation (once per batch), then classify candidates against
//! it.

use galena::cancel::CancellationToken;
use galena::distance::DistanceResultPair;
use galena::errors::{GalenaError, GalenaResult};
use galena::id::ObjectId;
use galena::relation::Relation;

use crate::errors::SpatialResult;

pub(crate) fn check_cancel(cancel: Option<&CancellationToken>) -> GalenaResult<()> {
    if let Some(token) = cancel {
        if token.is_cancelled() {
            return Err(GalenaError::Cancelled);
        }
    }
    Ok(())
}

/// The k-th-neighbor distance of every relation member, in relation
/// id order. Members with fewer than k neighbors get +∞, so they
/// qualify for every query.
///
/// Self-distance participates like any other candidate: each member's
/// own zero distance is part of its neighborhood.
pub(crate) fn kth_distance_table<F>(
    relation: &dyn Relation,
    k: usize,
    cancel: Option<&CancellationToken>,
    mut knn: F,
) -> SpatialResult<Vec<(ObjectId, f64)>>
where
    F: FnMut(&[f64]) -> SpatialResult<Vec<DistanceResultPair>>,
{
    let ids = relation.ids();
    let mut table = Vec::with_capacity(ids.len());
    for id in ids {
        check_cancel(cancel)?;
        let coords = relation.get(id).ok_or(GalenaError::NotFound(id))?;
        let neighbors = knn(coords)?;
        let kth = if neighbors.len() < k {
            f64::INFINITY
        } else {
            neighbors[neighbors.len() - 1].distance
        };
        table.push((id, kth));
    }
    Ok(table)
}

/// Classifies every relation member against one query, returning the
/// qualifying pairs in `(distance, id)` order.
pub(crate) fn classify_reverse_neighbors<F>(
    table: &[(ObjectId, f64)],
    relation: &dyn Relation,
    query: &[f64],
    mut distance: F,
) -> SpatialResult<Vec<DistanceResultPair>>
where
    F: FnMut(&[f64], &[f64]) -> SpatialResult<f64>,
{
    let mut result = Vec::new();
    for &(id, kth) in table {
        let coords = relation.get(id).ok_or(GalenaError::NotFound(id))?;
        let d = distance(query, coords)?;
        if d <= kth {
            result.push(DistanceResultPair::new(d, id));
        }
    }
    result.sort_unstable();
    Ok(result)
}
