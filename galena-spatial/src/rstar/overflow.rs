//! Overflow treatment: reinsert or split.

use smallvec::SmallVec;
use std::sync::Arc;

use crate::bounding_box::BoundingBox;
use crate::errors::SpatialResult;
use crate::node::Node;
use crate::rstar::reinsert::{CloseReinsert, ReinsertStrategy};

/// Per-insert record of which tree levels have already been treated
/// by forced reinsertion.
///
/// One instance is created at the start of each external insert and
/// threaded through the recursive overflow handling; it is never
/// shared between inserts.
#[derive(Debug, Default)]
pub struct ReinsertLevels {
    flags: SmallVec<[bool; 8]>,
}

impl ReinsertLevels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `level` as treated. Returns true if the level had not
    /// been treated before within this insert.
    pub fn mark(&mut self, level: usize) -> bool {
        if self.flags.len() <= level {
            self.flags.resize(level + 1, false);
        }
        if self.flags[level] {
            false
        } else {
            self.flags[level] = true;
            true
        }
    }

    pub fn is_marked(&self, level: usize) -> bool {
        self.flags.get(level).copied().unwrap_or(false)
    }
}

/// Decides how an over-capacity node is brought back under capacity.
///
/// An empty candidate set means split; the tree enforces that a node
/// never stays over capacity.
pub trait OverflowTreatment: Send + Sync {
    /// Entry indices to evict for reinsertion, or empty to split.
    fn reinsert_candidates(
        &self,
        node: &Node,
        node_mbr: &BoundingBox,
        is_root: bool,
        levels: &mut ReinsertLevels,
    ) -> SpatialResult<Vec<usize>>;
}

/// Forced reinsertion, at most once per tree level per insert.
///
/// The root always splits directly; there is no level above it to
/// reinsert into.
pub struct LimitedReinsertOverflow {
    strategy: Arc<dyn ReinsertStrategy>,
}

impl LimitedReinsertOverflow {
    pub fn new(strategy: Arc<dyn ReinsertStrategy>) -> Self {
        LimitedReinsertOverflow { strategy }
    }
}

impl Default for LimitedReinsertOverflow {
    fn default() -> Self {
        LimitedReinsertOverflow {
            strategy: Arc::new(CloseReinsert::default()),
        }
    }
}

impl OverflowTreatment for LimitedReinsertOverflow {
    fn reinsert_candidates(
        &self,
        node: &Node,
        node_mbr: &BoundingBox,
        is_root: bool,
        levels: &mut ReinsertLevels,
    ) -> SpatialResult<Vec<usize>> {
        if is_root {
            return Ok(Vec::new());
        }
        if !levels.mark(node.level as usize) {
            return Ok(Vec::new());
        }
        self.strategy.compute_reinserts(&node.entries, node_mbr)
    }
}

/// Classic R-tree behavior: always split, never reinsert.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitOverflow;

impl OverflowTreatment for SplitOverflow {
    fn reinsert_candidates(
        &self,
        _node: &Node,
        _node_mbr: &BoundingBox,
        _is_root: bool,
        _levels: &mut ReinsertLevels,
    ) -> SpatialResult<Vec<usize>> {
        Ok(Vec::new())
    }
}
