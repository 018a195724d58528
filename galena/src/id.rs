//! Stable object identity.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// An opaque, stable identity for an object in a relation.
///
/// `ObjectId` is totally ordered and hashable; equality is always by
/// value. The query and index layers never interpret the inner value,
/// they only compare and hash it. Ties between equal distances are
/// broken by id order, which is what makes query results
/// deterministic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Creates an id from a raw value.
    pub fn new(value: u64) -> Self {
        ObjectId(value)
    }

    /// Returns the raw value of this id.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ObjectId {
    fn from(value: u64) -> Self {
        ObjectId(value)
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
