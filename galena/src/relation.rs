//! Relations: id-addressable object stores.
//!
//! A relation is the collaborator the query and index layers read
//! vectors from. The contract is deliberately narrow: lookup by id,
//! deterministic id enumeration, and a fixed dimensionality.

use indexmap::IndexMap;

use crate::errors::{GalenaError, GalenaResult};
use crate::id::ObjectId;

/// An id-addressable store of vectors.
///
/// Implementations must enumerate ids in a deterministic order so
/// that scans over the same relation are reproducible.
pub trait Relation: Send + Sync {
    /// Returns the vector stored under `id`, if present.
    fn get(&self, id: ObjectId) -> Option<&[f64]>;

    /// All ids in this relation, in deterministic order.
    fn ids(&self) -> Vec<ObjectId>;

    /// Number of objects in this relation.
    fn count(&self) -> usize;

    /// Dimensionality shared by all vectors; `None` while empty.
    fn dimensionality(&self) -> Option<usize>;
}

/// An insertion-ordered, in-memory relation.
///
/// The first inserted vector fixes the dimensionality; all later
/// vectors must match it.
#[derive(Debug, Clone, Default)]
pub struct VectorRelation {
    vectors: IndexMap<ObjectId, Vec<f64>>,
    dimensionality: Option<usize>,
}

impl VectorRelation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a vector under `id`. Re-inserting an existing id
    /// replaces the previous vector.
    pub fn insert(&mut self, id: ObjectId, coords: Vec<f64>) -> GalenaResult<()> {
        if coords.is_empty() {
            return Err(GalenaError::Configuration(
                "cannot insert a zero-dimensional vector".into(),
            ));
        }
        match self.dimensionality {
            None => self.dimensionality = Some(coords.len()),
            Some(expected) if expected != coords.len() => {
                return Err(GalenaError::DimensionMismatch {
                    expected,
                    actual: coords.len(),
                });
            }
            Some(_) => {}
        }
        if self.vectors.insert(id, coords).is_some() {
            log::debug!("replaced vector for object {}", id);
        }
        Ok(())
    }

    /// Builds a relation from `(id, vector)` pairs.
    pub fn from_pairs<I>(pairs: I) -> GalenaResult<Self>
    where
        I: IntoIterator<Item = (ObjectId, Vec<f64>)>,
    {
        let mut relation = Self::new();
        for (id, coords) in pairs {
            relation.insert(id, coords)?;
        }
        Ok(relation)
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl Relation for VectorRelation {
    fn get(&self, id: ObjectId) -> Option<&[f64]> {
        self.vectors.get(&id).map(|v| v.as_slice())
    }

    fn ids(&self) -> Vec<ObjectId> {
        self.vectors.keys().copied().collect()
    }

    fn count(&self) -> usize {
        self.vectors.len()
    }

    fn dimensionality(&self) -> Option<usize> {
        self.dimensionality
    }
}
