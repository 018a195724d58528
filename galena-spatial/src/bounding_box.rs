//! N-dimensional axis-aligned bounding boxes.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::hash::Hash;

use crate::errors::{SpatialError, SpatialResult};

/// An axis-aligned bounding box with per-dimension `[min, max]`
/// coordinates.
///
/// The dimensionality is fixed at construction; all boxes sharing a
/// tree must agree on it. Invariant: `min[d] <= max[d]` for every
/// dimension d.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl Eq for BoundingBox {}

impl Hash for BoundingBox {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for v in &self.min {
            v.to_bits().hash(state);
        }
        for v in &self.max {
            v.to_bits().hash(state);
        }
    }
}

impl Display for BoundingBox {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "BoundingBox({:?}, {:?})", self.min, self.max)
    }
}

impl BoundingBox {
    /// Creates a bounding box from per-dimension minima and maxima.
    pub fn new(min: Vec<f64>, max: Vec<f64>) -> SpatialResult<Self> {
        if min.is_empty() || min.len() != max.len() {
            return Err(SpatialError::InvalidState(format!(
                "malformed bounding box: {} minima, {} maxima",
                min.len(),
                max.len()
            )));
        }
        for d in 0..min.len() {
            if min[d] > max[d] {
                return Err(SpatialError::InvalidState(format!(
                    "malformed bounding box: min {} > max {} in dimension {}",
                    min[d], max[d], d
                )));
            }
        }
        Ok(BoundingBox { min, max })
    }

    /// Creates a degenerate (zero-extent) box around a point.
    pub fn from_point(coords: &[f64]) -> Self {
        BoundingBox {
            min: coords.to_vec(),
            max: coords.to_vec(),
        }
    }

    pub fn dimensionality(&self) -> usize {
        self.min.len()
    }

    pub fn min(&self) -> &[f64] {
        &self.min
    }

    pub fn max(&self) -> &[f64] {
        &self.max
    }

    /// Unions `other` into this box in place. Returns whether the box
    /// grew, which lets ancestor propagation stop early.
    pub fn extend(&mut self, other: &BoundingBox) -> bool {
        debug_assert_eq!(self.dimensionality(), other.dimensionality());
        let mut changed = false;
        for d in 0..self.min.len() {
            if other.min[d] < self.min[d] {
                self.min[d] = other.min[d];
                changed = true;
            }
            if other.max[d] > self.max[d] {
                self.max[d] = other.max[d];
                changed = true;
            }
        }
        changed
    }

    /// Returns the union of this box with another.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let mut result = self.clone();
        result.extend(other);
        result
    }

    /// Checks whether this box fully contains another.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        debug_assert_eq!(self.dimensionality(), other.dimensionality());
        (0..self.min.len()).all(|d| self.min[d] <= other.min[d] && self.max[d] >= other.max[d])
    }

    /// Checks whether this box contains a point.
    pub fn contains_point(&self, coords: &[f64]) -> bool {
        debug_assert_eq!(self.dimensionality(), coords.len());
        (0..self.min.len()).all(|d| self.min[d] <= coords[d] && coords[d] <= self.max[d])
    }

    /// Checks whether this box intersects another. Touching counts.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        debug_assert_eq!(self.dimensionality(), other.dimensionality());
        (0..self.min.len()).all(|d| self.min[d] <= other.max[d] && self.max[d] >= other.min[d])
    }

    /// Volume of the box (product of extents).
    pub fn area(&self) -> f64 {
        (0..self.min.len()).map(|d| self.max[d] - self.min[d]).product()
    }

    /// Sum of extents over all dimensions.
    pub fn margin(&self) -> f64 {
        (0..self.min.len()).map(|d| self.max[d] - self.min[d]).sum()
    }

    /// How much the volume would grow if `other` were unioned in.
    pub fn enlargement(&self, other: &BoundingBox) -> f64 {
        self.union(other).area() - self.area()
    }

    /// Center point of the box.
    pub fn center(&self) -> Vec<f64> {
        (0..self.min.len())
            .map(|d| (self.min[d] + self.max[d]) / 2.0)
            .collect()
    }

    /// Squared Euclidean distance from a point to the nearest point of
    /// this box; 0 when the point lies inside. Admissible lower bound
    /// for any point contained in the box.
    pub fn min_dist_sq(&self, point: &[f64]) -> f64 {
        debug_assert_eq!(self.dimensionality(), point.len());
        let mut sum = 0.0;
        for d in 0..self.min.len() {
            let clamped = point[d].clamp(self.min[d], self.max[d]);
            let delta = point[d] - clamped;
            sum += delta * delta;
        }
        sum
    }

    pub fn is_valid(&self) -> bool {
        !self.min.is_empty() && (0..self.min.len()).all(|d| self.min[d] <= self.max[d])
    }
}
