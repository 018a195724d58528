//! Distance values, distance functions, and distance queries.
//!
//! Distances are comparable values with explicit sentinels for the
//! infinite, null, and undefined cases. Concrete metrics only ever
//! produce finite values; the sentinels exist so that collaborators
//! can represent "no distance yet" and "unreachable" uniformly.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::errors::{GalenaError, GalenaResult};
use crate::id::ObjectId;
use crate::relation::Relation;

/// A comparable distance value.
///
/// Total order: `Null < Finite(x) < Infinite < Undefined`, with
/// finite values ordered by magnitude. `Null` is the zero element,
/// `Undefined` sorts after everything (an undefined distance is
/// treated as unreachable by the query layer).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum DistanceValue {
    Finite(f64),
    Infinite,
    Null,
    Undefined,
}

impl DistanceValue {
    fn rank(&self) -> u8 {
        match self {
            DistanceValue::Null => 0,
            DistanceValue::Finite(_) => 1,
            DistanceValue::Infinite => 2,
            DistanceValue::Undefined => 3,
        }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, DistanceValue::Finite(_))
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, DistanceValue::Infinite)
    }

    /// Collapses this value to an `f64` for the query engines:
    /// `Null` maps to 0.0, `Infinite` and `Undefined` map to +∞.
    pub fn to_f64(&self) -> f64 {
        match self {
            DistanceValue::Finite(value) => *value,
            DistanceValue::Null => 0.0,
            DistanceValue::Infinite | DistanceValue::Undefined => f64::INFINITY,
        }
    }
}

impl PartialEq for DistanceValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DistanceValue {}

impl PartialOrd for DistanceValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistanceValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (DistanceValue::Finite(a), DistanceValue::Finite(b)) => a.total_cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Display for DistanceValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceValue::Finite(value) => write!(f, "{}", value),
            DistanceValue::Infinite => write!(f, "inf"),
            DistanceValue::Null => write!(f, "null"),
            DistanceValue::Undefined => write!(f, "undefined"),
        }
    }
}

/// A distance between two vectors.
///
/// Implementations must fail fast with
/// [`GalenaError::DimensionMismatch`] on vectors of differing
/// dimensionality — never truncate silently.
pub trait DistanceFunction: Send + Sync {
    fn distance(&self, a: &[f64], b: &[f64]) -> GalenaResult<DistanceValue>;
}

fn check_dimensions(a: &[f64], b: &[f64]) -> GalenaResult<()> {
    if a.len() != b.len() {
        return Err(GalenaError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

/// Euclidean (L2) distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanDistance;

impl DistanceFunction for EuclideanDistance {
    fn distance(&self, a: &[f64], b: &[f64]) -> GalenaResult<DistanceValue> {
        check_dimensions(a, b)?;
        let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
        Ok(DistanceValue::Finite(sum.sqrt()))
    }
}

/// Squared Euclidean distance. Order-equivalent to Euclidean and
/// cheaper; the default metric for reinsertion candidate selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredEuclideanDistance;

impl DistanceFunction for SquaredEuclideanDistance {
    fn distance(&self, a: &[f64], b: &[f64]) -> GalenaResult<DistanceValue> {
        check_dimensions(a, b)?;
        let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
        Ok(DistanceValue::Finite(sum))
    }
}

/// Manhattan (L1) distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManhattanDistance;

impl DistanceFunction for ManhattanDistance {
    fn distance(&self, a: &[f64], b: &[f64]) -> GalenaResult<DistanceValue> {
        check_dimensions(a, b)?;
        let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum();
        Ok(DistanceValue::Finite(sum))
    }
}

/// A distance function bound to a relation, addressable by id.
#[derive(Clone)]
pub struct DistanceQuery {
    relation: Arc<dyn Relation>,
    function: Arc<dyn DistanceFunction>,
}

impl DistanceQuery {
    pub fn new(relation: Arc<dyn Relation>, function: Arc<dyn DistanceFunction>) -> Self {
        Self { relation, function }
    }

    pub fn relation(&self) -> &Arc<dyn Relation> {
        &self.relation
    }

    pub fn function(&self) -> &Arc<dyn DistanceFunction> {
        &self.function
    }

    /// Distance between two relation members.
    pub fn distance_between(&self, a: ObjectId, b: ObjectId) -> GalenaResult<DistanceValue> {
        let va = self.relation.get(a).ok_or(GalenaError::NotFound(a))?;
        let vb = self.relation.get(b).ok_or(GalenaError::NotFound(b))?;
        self.function.distance(va, vb)
    }

    /// Distance from an arbitrary query vector to a relation member.
    pub fn distance_to(&self, query: &[f64], id: ObjectId) -> GalenaResult<DistanceValue> {
        let v = self.relation.get(id).ok_or(GalenaError::NotFound(id))?;
        self.function.distance(query, v)
    }
}

/// A `(distance, id)` result pair.
///
/// Ordered by `(distance, id)` so that equal distances resolve
/// deterministically by id. All query engines produce their results
/// in this order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DistanceResultPair {
    pub distance: f64,
    pub id: ObjectId,
}

impl DistanceResultPair {
    pub fn new(distance: f64, id: ObjectId) -> Self {
        Self { distance, id }
    }
}

impl PartialEq for DistanceResultPair {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DistanceResultPair {}

impl PartialOrd for DistanceResultPair {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistanceResultPair {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl Display for DistanceResultPair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.distance, self.id)
    }
}
