//! The R*-tree.
//!
//! Insertion descends by least enlargement, adjusts ancestor boxes on
//! the way back, and resolves overflows through the configured
//! treatment: forced reinsertion (at most once per level per insert)
//! or a split that may cascade to the root and grow the tree by one
//! level. Queries run branch-and-bound over the same structure.

use parking_lot::RwLock;
use std::collections::{BinaryHeap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use galena::cancel::CancellationToken;
use galena::distance::{DistanceResultPair, EuclideanDistance};
use galena::errors::{GalenaError, GalenaResult};
use galena::id::ObjectId;
use galena::relation::Relation;

use crate::bounding_box::BoundingBox;
use crate::config::RStarTreeConfig;
use crate::entry::SpatialEntry;
use crate::errors::{SpatialError, SpatialResult};
use crate::node::{MemoryNodeStore, Node, NodeId, NodeStore, TreePath};
use crate::query::priority::{KnnCollector, SearchCandidate};
use crate::query::rknn::{check_cancel, classify_reverse_neighbors, kth_distance_table};
use crate::query::{
    validate_k, validate_query_dims, validate_radius, Insertable, KnnCapable, RangeCapable,
    RknnCapable, SpatialDistance,
};
use crate::rstar::bulk::{BulkLoadStrategy, SortTileRecursive};
use crate::rstar::overflow::{LimitedReinsertOverflow, OverflowTreatment, ReinsertLevels};
use crate::rstar::split::split_entries;

/// Mutable tree metadata, the in-memory counterpart of a file header.
#[derive(Debug, Clone, Default)]
struct TreeMeta {
    root: Option<NodeId>,
    height: u32,
    entry_count: u64,
    dimensionality: Option<usize>,
    bulk_built: bool,
}

/// Operation counters.
#[derive(Debug, Default)]
struct TreeCounters {
    splits: AtomicU64,
    reinsertions: AtomicU64,
    reinserted_entries: AtomicU64,
}

/// A snapshot of tree statistics.
#[derive(Debug, Clone, Default)]
pub struct TreeStats {
    pub total_entries: u64,
    pub tree_height: u32,
    pub node_count: usize,
    /// Number of node splits performed.
    pub splits: u64,
    /// Number of forced-reinsertion events.
    pub reinsertions: u64,
    /// Number of entries evicted and reinserted across all events.
    pub reinserted_entries: u64,
}

/// An R*-tree over a relation.
///
/// The tree owns its nodes through a [`NodeStore`] and references
/// objects by id; coordinates are copied from the relation at insert
/// time. Mutation is single-threaded and non-reentrant: one external
/// `insert` runs to completion before the next.
pub struct RStarTree {
    relation: Arc<dyn Relation>,
    config: RStarTreeConfig,
    distance: Arc<dyn SpatialDistance>,
    overflow: Arc<dyn OverflowTreatment>,
    bulk_strategy: Arc<dyn BulkLoadStrategy>,
    store: Arc<dyn NodeStore>,
    meta: RwLock<TreeMeta>,
    counters: TreeCounters,
}

impl RStarTree {
    /// Creates an empty tree with default strategies: Euclidean
    /// distance, limited forced reinsertion, sort-tile-recursive bulk
    /// loading, in-memory node storage.
    pub fn new(relation: Arc<dyn Relation>, config: RStarTreeConfig) -> GalenaResult<Self> {
        config.validate()?;
        Ok(RStarTree {
            relation,
            config,
            distance: Arc::new(EuclideanDistance),
            overflow: Arc::new(LimitedReinsertOverflow::default()),
            bulk_strategy: Arc::new(SortTileRecursive),
            store: Arc::new(MemoryNodeStore::new()),
            meta: RwLock::new(TreeMeta::default()),
            counters: TreeCounters::default(),
        })
    }

    pub fn with_distance(mut self, distance: Arc<dyn SpatialDistance>) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_overflow_treatment(mut self, overflow: Arc<dyn OverflowTreatment>) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn with_bulk_strategy(mut self, strategy: Arc<dyn BulkLoadStrategy>) -> Self {
        self.bulk_strategy = strategy;
        self
    }

    pub fn with_node_store(mut self, store: Arc<dyn NodeStore>) -> Self {
        self.store = store;
        self
    }

    pub fn relation(&self) -> &Arc<dyn Relation> {
        &self.relation
    }

    pub fn config(&self) -> &RStarTreeConfig {
        &self.config
    }

    pub fn is_empty(&self) -> bool {
        self.meta.read().entry_count == 0
    }

    pub fn len(&self) -> u64 {
        self.meta.read().entry_count
    }

    pub fn height(&self) -> u32 {
        self.meta.read().height
    }

    /// Statistics snapshot.
    pub fn stats(&self) -> TreeStats {
        let meta = self.meta.read();
        TreeStats {
            total_entries: meta.entry_count,
            tree_height: meta.height,
            node_count: self.store.len(),
            splits: self.counters.splits.load(Ordering::Relaxed),
            reinsertions: self.counters.reinsertions.load(Ordering::Relaxed),
            reinserted_entries: self.counters.reinserted_entries.load(Ordering::Relaxed),
        }
    }

    fn record_dimensionality(&self, dims: usize) -> GalenaResult<()> {
        let mut meta = self.meta.write();
        match meta.dimensionality {
            None => {
                meta.dimensionality = Some(dims);
                Ok(())
            }
            Some(expected) if expected != dims => Err(GalenaError::DimensionMismatch {
                expected,
                actual: dims,
            }),
            Some(_) => Ok(()),
        }
    }

    /// Inserts `entry` into the subtree-choice node at `target_level`
    /// and resolves any overflow. Reinsertions re-enter here with the
    /// level flags of the ongoing external insert.
    fn insert_entry(
        &self,
        entry: SpatialEntry,
        target_level: u32,
        levels: &mut ReinsertLevels,
    ) -> SpatialResult<()> {
        let entry_mbr = entry.mbr()?;

        let root_id = {
            let meta = self.meta.read();
            meta.root
        };
        let Some(root_id) = root_id else {
            if target_level != 0 {
                return Err(SpatialError::InvalidState(
                    "directory entry inserted into an empty tree".into(),
                ));
            }
            let node_id = self.store.allocate();
            let mut node = Node::new(0);
            node.entries.push(entry);
            self.store.write(node_id, node)?;

            let mut meta = self.meta.write();
            meta.root = Some(node_id);
            meta.height = 1;
            return Ok(());
        };

        let mut path: TreePath = Vec::new();
        let node_id = self.choose_insertion_node(root_id, &entry_mbr, target_level, &mut path)?;

        let mut node = self.store.read(node_id)?;
        node.entries.push(entry);
        let overflowing = node.len() > self.config.max_entries;
        self.store.write(node_id, node)?;
        self.extend_ancestors(&path, &entry_mbr)?;

        if overflowing {
            self.handle_overflow(node_id, path, levels)?;
        }
        Ok(())
    }

    /// Descends from the root to the node at `target_level` that
    /// requires the least enlargement to cover `mbr`, recording the
    /// path taken.
    fn choose_insertion_node(
        &self,
        root_id: NodeId,
        mbr: &BoundingBox,
        target_level: u32,
        path: &mut TreePath,
    ) -> SpatialResult<NodeId> {
        let mut current = root_id;
        loop {
            let node = self.store.read(current)?;
            if node.level == target_level {
                return Ok(current);
            }
            if node.level < target_level || node.is_leaf() {
                return Err(SpatialError::InvalidState(format!(
                    "no node at level {} below node {}",
                    target_level, current
                )));
            }
            let index = self.choose_subtree(&node, mbr)?;
            let child = node.entries[index].child_id().ok_or_else(|| {
                SpatialError::InvalidState(format!(
                    "leaf entry in directory node {}",
                    current
                ))
            })?;
            path.push((current, index));
            current = child;
        }
    }

    /// Picks the child needing the least enlargement to cover `mbr`;
    /// ties go to the smaller resulting box, then to the child with
    /// fewer entries.
    fn choose_subtree(&self, node: &Node, mbr: &BoundingBox) -> SpatialResult<usize> {
        let mut best_index = 0;
        let mut best_enlargement = f64::INFINITY;
        let mut best_area = f64::INFINITY;
        let mut best_len: Option<usize> = None;

        for (index, entry) in node.entries.iter().enumerate() {
            let child_mbr = entry.mbr()?;
            let union_area = child_mbr.union(mbr).area();
            let enlargement = union_area - child_mbr.area();

            let ordering = enlargement
                .total_cmp(&best_enlargement)
                .then_with(|| union_area.total_cmp(&best_area));
            match ordering {
                std::cmp::Ordering::Less => {
                    best_index = index;
                    best_enlargement = enlargement;
                    best_area = union_area;
                    best_len = None;
                }
                std::cmp::Ordering::Equal => {
                    // resolve the full tie by child entry count
                    let current_len = self.child_len(&node.entries[index])?;
                    let incumbent_len = match best_len {
                        Some(len) => len,
                        None => {
                            let len = self.child_len(&node.entries[best_index])?;
                            best_len = Some(len);
                            len
                        }
                    };
                    if current_len < incumbent_len {
                        best_index = index;
                        best_len = Some(current_len);
                    }
                }
                std::cmp::Ordering::Greater => {}
            }
        }
        Ok(best_index)
    }

    fn child_len(&self, entry: &SpatialEntry) -> SpatialResult<usize> {
        let child = entry.child_id().ok_or_else(|| {
            SpatialError::InvalidState("leaf entry has no child node".into())
        })?;
        Ok(self.store.read(child)?.len())
    }

    /// Walks the path towards the root, unioning `mbr` into each
    /// parent entry; stops as soon as a box did not grow.
    fn extend_ancestors(&self, path: &TreePath, mbr: &BoundingBox) -> SpatialResult<()> {
        for &(parent_id, child_index) in path.iter().rev() {
            let mut parent = self.store.read(parent_id)?;
            let changed = parent.entries[child_index].extend_mbr(mbr)?;
            if !changed {
                break;
            }
            self.store.write(parent_id, parent)?;
        }
        Ok(())
    }

    /// Recomputes every parent box on the path from its child node.
    /// Needed after evictions and splits, when boxes may shrink.
    fn recompute_ancestors(&self, path: &TreePath) -> SpatialResult<()> {
        for &(parent_id, child_index) in path.iter().rev() {
            let mut parent = self.store.read(parent_id)?;
            let child = parent.entries[child_index].child_id().ok_or_else(|| {
                SpatialError::InvalidState("leaf entry on an ancestor path".into())
            })?;
            let child_mbr = self.store.read(child)?.mbr()?;
            parent.entries[child_index].set_mbr(child_mbr)?;
            self.store.write(parent_id, parent)?;
        }
        Ok(())
    }

    /// Overflow dispatch: reinsert when the treatment yields
    /// candidates, split otherwise. A node never stays over capacity.
    fn handle_overflow(
        &self,
        node_id: NodeId,
        path: TreePath,
        levels: &mut ReinsertLevels,
    ) -> SpatialResult<()> {
        let node = self.store.read(node_id)?;
        if node.len() <= self.config.max_entries {
            return Ok(());
        }

        let is_root = path.is_empty();
        let node_mbr = node.mbr()?;
        let candidates = self
            .overflow
            .reinsert_candidates(&node, &node_mbr, is_root, levels)?;

        if candidates.is_empty() {
            self.split_node(node_id, node, path, levels)
        } else {
            self.reinsert_entries(node_id, node, path, candidates, levels)
        }
    }

    /// Evicts the chosen entries and reinserts each from the root at
    /// the level it came from.
    fn reinsert_entries(
        &self,
        node_id: NodeId,
        mut node: Node,
        path: TreePath,
        indices: Vec<usize>,
        levels: &mut ReinsertLevels,
    ) -> SpatialResult<()> {
        log::debug!(
            "forced reinsertion of {} entries from node {} at level {}",
            indices.len(),
            node_id,
            node.level
        );
        self.counters.reinsertions.fetch_add(1, Ordering::Relaxed);
        self.counters
            .reinserted_entries
            .fetch_add(indices.len() as u64, Ordering::Relaxed);

        let target_level = node.level;
        let evicted: Vec<SpatialEntry> = indices
            .iter()
            .map(|&i| node.entries[i].clone())
            .collect();

        let chosen: HashSet<usize> = indices.into_iter().collect();
        let mut position = 0;
        node.entries.retain(|_| {
            let keep = !chosen.contains(&position);
            position += 1;
            keep
        });
        self.store.write(node_id, node)?;
        self.recompute_ancestors(&path)?;

        for entry in evicted {
            self.insert_entry(entry, target_level, levels)?;
        }
        Ok(())
    }

    /// Splits the node in two, inserts the new directory entry into
    /// the parent, and re-checks overflow one level up. A root split
    /// grows the tree by one level.
    fn split_node(
        &self,
        node_id: NodeId,
        node: Node,
        mut path: TreePath,
        levels: &mut ReinsertLevels,
    ) -> SpatialResult<()> {
        log::debug!(
            "splitting node {} at level {} with {} entries",
            node_id,
            node.level,
            node.len()
        );
        self.counters.splits.fetch_add(1, Ordering::Relaxed);

        let level = node.level;
        let (left_entries, right_entries) = split_entries(node.entries, self.config.min_entries)?;

        let left = Node {
            level,
            entries: left_entries,
        };
        let right = Node {
            level,
            entries: right_entries,
        };
        let left_mbr = left.mbr()?;
        let right_mbr = right.mbr()?;

        let new_id = self.store.allocate();
        self.store.write(node_id, left)?;
        self.store.write(new_id, right)?;

        if let Some((parent_id, child_index)) = path.pop() {
            let mut parent = self.store.read(parent_id)?;
            parent.entries[child_index].set_mbr(left_mbr)?;
            parent
                .entries
                .push(SpatialEntry::directory(new_id, right_mbr));
            let overflowing = parent.len() > self.config.max_entries;
            self.store.write(parent_id, parent)?;
            self.recompute_ancestors(&path)?;

            if overflowing {
                self.handle_overflow(parent_id, path, levels)?;
            }
            Ok(())
        } else {
            // the split node was the root: grow by one level
            let new_root_id = self.store.allocate();
            let new_root = Node {
                level: level + 1,
                entries: vec![
                    SpatialEntry::directory(node_id, left_mbr),
                    SpatialEntry::directory(new_id, right_mbr),
                ],
            };
            self.store.write(new_root_id, new_root)?;

            let mut meta = self.meta.write();
            meta.root = Some(new_root_id);
            meta.height += 1;
            Ok(())
        }
    }

    /// Audits the whole tree: capacity bounds, MBR containment, level
    /// consistency, entry dimensionality, entry count.
    pub fn check_invariants(&self) -> SpatialResult<()> {
        let meta = self.meta.read().clone();
        let Some(root_id) = meta.root else {
            if meta.entry_count != 0 {
                return Err(SpatialError::InvalidState(format!(
                    "tree reports {} entries but has no root",
                    meta.entry_count
                )));
            }
            return Ok(());
        };

        let root = self.store.read(root_id)?;
        if root.level + 1 != meta.height {
            return Err(SpatialError::InvalidState(format!(
                "root level {} does not match height {}",
                root.level, meta.height
            )));
        }

        let mut leaf_entries = 0u64;
        self.check_node(root_id, true, meta.dimensionality, &mut leaf_entries)?;
        if leaf_entries != meta.entry_count {
            return Err(SpatialError::InvalidState(format!(
                "tree reports {} entries but holds {}",
                meta.entry_count, leaf_entries
            )));
        }
        Ok(())
    }

    fn check_node(
        &self,
        node_id: NodeId,
        is_root: bool,
        dimensionality: Option<usize>,
        leaf_entries: &mut u64,
    ) -> SpatialResult<BoundingBox> {
        let node = self.store.read(node_id)?;
        let len = node.len();

        if len == 0 || len > self.config.max_entries {
            return Err(SpatialError::InvalidState(format!(
                "node {} holds {} entries, capacity is {}",
                node_id, len, self.config.max_entries
            )));
        }
        if !is_root && len < self.config.min_entries {
            return Err(SpatialError::InvalidState(format!(
                "node {} holds {} entries, minimum is {}",
                node_id, len, self.config.min_entries
            )));
        }

        if node.is_leaf() {
            for entry in &node.entries {
                let SpatialEntry::Leaf { coords, .. } = entry else {
                    return Err(SpatialError::InvalidState(format!(
                        "directory entry in leaf node {}",
                        node_id
                    )));
                };
                if let Some(dims) = dimensionality {
                    if coords.len() != dims {
                        return Err(SpatialError::InvalidState(format!(
                            "entry of dimensionality {} in a {}-dimensional tree",
                            coords.len(),
                            dims
                        )));
                    }
                }
                *leaf_entries += 1;
            }
            node.mbr()
        } else {
            for entry in &node.entries {
                let Some(child) = entry.child_id() else {
                    return Err(SpatialError::InvalidState(format!(
                        "leaf entry in directory node {}",
                        node_id
                    )));
                };
                let child_node = self.store.read(child)?;
                if child_node.level + 1 != node.level {
                    return Err(SpatialError::InvalidState(format!(
                        "node {} at level {} references child {} at level {}",
                        node_id, node.level, child, child_node.level
                    )));
                }
                let subtree_mbr =
                    self.check_node(child, false, dimensionality, leaf_entries)?;
                let declared = entry.mbr()?;
                if !declared.contains(&subtree_mbr) {
                    return Err(SpatialError::InvalidState(format!(
                        "entry box of node {} does not contain its subtree",
                        child
                    )));
                }
            }
            node.mbr()
        }
    }
}

impl Insertable for RStarTree {
    fn insert(&self, id: ObjectId) -> SpatialResult<()> {
        {
            let meta = self.meta.read();
            if meta.bulk_built {
                return Err(GalenaError::Unsupported(
                    "cannot insert into a bulk-built static index".into(),
                )
                .into());
            }
        }
        let coords = self
            .relation
            .get(id)
            .ok_or(GalenaError::NotFound(id))?
            .to_vec();
        self.record_dimensionality(coords.len())?;

        // the per-level reinsertion record is scoped to this call
        let mut levels = ReinsertLevels::new();
        self.insert_entry(SpatialEntry::leaf(id, coords), 0, &mut levels)?;
        self.meta.write().entry_count += 1;
        Ok(())
    }

    fn bulk_load(&self, ids: &[ObjectId]) -> SpatialResult<()> {
        {
            let meta = self.meta.read();
            if meta.root.is_some() || meta.bulk_built {
                return Err(
                    GalenaError::Unsupported("bulk load requires an empty index".into()).into(),
                );
            }
        }
        if ids.is_empty() {
            self.meta.write().bulk_built = true;
            return Ok(());
        }

        let mut entries = Vec::with_capacity(ids.len());
        for &id in ids {
            let coords = self
                .relation
                .get(id)
                .ok_or(GalenaError::NotFound(id))?
                .to_vec();
            self.record_dimensionality(coords.len())?;
            entries.push(SpatialEntry::leaf(id, coords));
        }
        log::info!("bulk loading {} entries", entries.len());

        let mut level = 0u32;
        let mut pending = entries;
        let root_id = loop {
            if pending.len() <= self.config.max_entries {
                let node_id = self.store.allocate();
                self.store.write(
                    node_id,
                    Node {
                        level,
                        entries: pending,
                    },
                )?;
                break node_id;
            }

            let partitions = self.bulk_strategy.partition(
                pending,
                self.config.min_entries,
                self.config.max_entries,
            )?;
            let mut parents = Vec::with_capacity(partitions.len());
            for partition in partitions {
                let node_id = self.store.allocate();
                let node = Node {
                    level,
                    entries: partition,
                };
                let mbr = node.mbr()?;
                self.store.write(node_id, node)?;
                parents.push(SpatialEntry::directory(node_id, mbr));
            }
            level += 1;
            pending = parents;
        };

        let mut meta = self.meta.write();
        meta.root = Some(root_id);
        meta.height = level + 1;
        meta.entry_count = ids.len() as u64;
        meta.bulk_built = true;
        Ok(())
    }

    fn delete(&self, id: ObjectId) -> SpatialResult<()> {
        Err(GalenaError::Unsupported(format!(
            "delete of {} not supported: the index is append-only, rebuild it instead",
            id
        ))
        .into())
    }
}

impl RangeCapable for RStarTree {
    fn range_query(&self, query: &[f64], radius: f64) -> SpatialResult<Vec<DistanceResultPair>> {
        validate_radius(radius)?;
        validate_query_dims(self.relation.as_ref(), query)?;

        let Some(root_id) = self.meta.read().root else {
            return Ok(Vec::new());
        };

        let mut queue = BinaryHeap::new();
        queue.push(SearchCandidate {
            bound: 0.0,
            node: root_id,
        });
        let mut result = Vec::new();

        while let Some(candidate) = queue.pop() {
            if candidate.bound > radius {
                break;
            }
            let node = self.store.read(candidate.node)?;
            for entry in &node.entries {
                match entry {
                    SpatialEntry::Leaf { id, coords } => {
                        let d = self.distance.distance(query, coords)?.to_f64();
                        if d <= radius {
                            result.push(DistanceResultPair::new(d, *id));
                        }
                    }
                    SpatialEntry::Directory { child, .. } => {
                        let bound = self.distance.min_dist(&entry.mbr()?, query);
                        if bound <= radius {
                            queue.push(SearchCandidate {
                                bound,
                                node: *child,
                            });
                        }
                    }
                }
            }
        }

        result.sort_unstable();
        Ok(result)
    }
}

impl KnnCapable for RStarTree {
    fn knn_query(&self, query: &[f64], k: usize) -> SpatialResult<Vec<DistanceResultPair>> {
        validate_k(k)?;
        validate_query_dims(self.relation.as_ref(), query)?;

        let Some(root_id) = self.meta.read().root else {
            return Ok(Vec::new());
        };

        let mut queue = BinaryHeap::new();
        queue.push(SearchCandidate {
            bound: 0.0,
            node: root_id,
        });
        let mut collector = KnnCollector::new(k);

        while let Some(candidate) = queue.pop() {
            // equal bounds are still explored so that boundary ties
            // resolve by id, exactly as in a linear scan
            if candidate.bound > collector.threshold() {
                break;
            }
            let node = self.store.read(candidate.node)?;
            for entry in &node.entries {
                match entry {
                    SpatialEntry::Leaf { id, coords } => {
                        let d = self.distance.distance(query, coords)?.to_f64();
                        collector.offer(DistanceResultPair::new(d, *id));
                    }
                    SpatialEntry::Directory { child, .. } => {
                        let bound = self.distance.min_dist(&entry.mbr()?, query);
                        if bound <= collector.threshold() {
                            queue.push(SearchCandidate {
                                bound,
                                node: *child,
                            });
                        }
                    }
                }
            }
        }

        Ok(collector.into_sorted_vec())
    }

    fn bulk_knn_query(
        &self,
        queries: &[ObjectId],
        k: usize,
        cancel: Option<&CancellationToken>,
    ) -> SpatialResult<Vec<Vec<DistanceResultPair>>> {
        validate_k(k)?;
        let mut result = Vec::with_capacity(queries.len());
        for &qid in queries {
            check_cancel(cancel)?;
            let coords = self
                .relation
                .get(qid)
                .ok_or(GalenaError::NotFound(qid))?
                .to_vec();
            result.push(self.knn_query(&coords, k)?);
        }
        Ok(result)
    }
}

impl RknnCapable for RStarTree {
    fn rknn_query(&self, query: &[f64], k: usize) -> SpatialResult<Vec<DistanceResultPair>> {
        validate_k(k)?;
        validate_query_dims(self.relation.as_ref(), query)?;

        let table = kth_distance_table(self.relation.as_ref(), k, None, |coords| {
            self.knn_query(coords, k)
        })?;
        classify_reverse_neighbors(&table, self.relation.as_ref(), query, |a, b| {
            Ok(self.distance.distance(a, b)?.to_f64())
        })
    }

    fn bulk_rknn_query(
        &self,
        queries: &[ObjectId],
        k: usize,
        cancel: Option<&CancellationToken>,
    ) -> SpatialResult<Vec<Vec<DistanceResultPair>>> {
        validate_k(k)?;

        let table = kth_distance_table(self.relation.as_ref(), k, cancel, |coords| {
            self.knn_query(coords, k)
        })?;

        let mut result = Vec::with_capacity(queries.len());
        for &qid in queries {
            check_cancel(cancel)?;
            let coords = self
                .relation
                .get(qid)
                .ok_or(GalenaError::NotFound(qid))?
                .to_vec();
            result.push(classify_reverse_neighbors(
                &table,
                self.relation.as_ref(),
                &coords,
                |a, b| Ok(self.distance.distance(a, b)?.to_f64()),
            )?);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galena::relation::VectorRelation;

    use crate::query::linear::LinearScan;

    fn relation_of(points: Vec<(u64, Vec<f64>)>) -> Arc<VectorRelation> {
        let pairs = points
            .into_iter()
            .map(|(id, coords)| (ObjectId::from(id), coords));
        Arc::new(VectorRelation::from_pairs(pairs).unwrap())
    }

    fn small_tree(relation: Arc<VectorRelation>) -> RStarTree {
        let _ = env_logger::builder().is_test(true).try_init();
        RStarTree::new(relation, RStarTreeConfig::new(4, 2, 0.3).unwrap()).unwrap()
    }

    /// The four-point example: A(0,0), B(1,0), C(0,1), D(5,5).
    fn sample_relation() -> Arc<VectorRelation> {
        relation_of(vec![
            (1, vec![0.0, 0.0]),
            (2, vec![1.0, 0.0]),
            (3, vec![0.0, 1.0]),
            (4, vec![5.0, 5.0]),
        ])
    }

    #[test]
    fn test_empty_tree_queries_are_empty() {
        let tree = small_tree(Arc::new(VectorRelation::new()));
        assert!(tree.knn_query(&[0.0, 0.0], 2).unwrap().is_empty());
        assert!(tree.range_query(&[0.0, 0.0], 1.0).unwrap().is_empty());
        assert!(tree.rknn_query(&[0.0, 0.0], 2).unwrap().is_empty());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_knn_example_tie_breaks_by_id() {
        let relation = sample_relation();
        let tree = small_tree(relation.clone());
        for id in relation.ids() {
            tree.insert(id).unwrap();
        }

        let result = tree.knn_query(&[0.0, 0.0], 2).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0], DistanceResultPair::new(0.0, ObjectId::from(1)));
        // B(1,0) and C(0,1) tie at distance 1.0; B wins by id
        assert_eq!(result[1], DistanceResultPair::new(1.0, ObjectId::from(2)));
    }

    #[test]
    fn test_range_example_is_exact() {
        let relation = sample_relation();
        let tree = small_tree(relation.clone());
        for id in relation.ids() {
            tree.insert(id).unwrap();
        }

        let result = tree.range_query(&[0.0, 0.0], 1.0).unwrap();
        assert_eq!(
            result,
            vec![
                DistanceResultPair::new(0.0, ObjectId::from(1)),
                DistanceResultPair::new(1.0, ObjectId::from(2)),
                DistanceResultPair::new(1.0, ObjectId::from(3)),
            ]
        );
    }

    #[test]
    fn test_invariants_hold_after_every_insert() {
        let points: Vec<(u64, Vec<f64>)> = (0..40)
            .map(|i| (i, vec![(i % 8) as f64, (i / 8) as f64]))
            .collect();
        let relation = relation_of(points);
        let tree = small_tree(relation.clone());

        for id in relation.ids() {
            tree.insert(id).unwrap();
            tree.check_invariants().unwrap();
        }
        assert_eq!(tree.len(), 40);
        assert!(tree.height() >= 3);
    }

    #[test]
    fn test_root_overflow_splits_directly() {
        let points: Vec<(u64, Vec<f64>)> =
            (0..5).map(|i| (i + 1, vec![i as f64, i as f64])).collect();
        let relation = relation_of(points);
        let tree = small_tree(relation.clone());

        for id in relation.ids() {
            tree.insert(id).unwrap();
        }
        let stats = tree.stats();
        // the 5th insert overflowed the root leaf: split, never reinsert
        assert_eq!(stats.splits, 1);
        assert_eq!(stats.reinsertions, 0);
        assert_eq!(tree.height(), 2);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_forced_reinsert_runs_before_split() {
        // diagonal points: the 7th insert overflows a full non-root
        // leaf and must evict round(0.3 * 5) = 2 entries instead of
        // splitting
        let points: Vec<(u64, Vec<f64>)> =
            (0..7).map(|i| (i + 1, vec![i as f64, i as f64])).collect();
        let relation = relation_of(points);
        let tree = small_tree(relation.clone());

        for id in relation.ids() {
            tree.insert(id).unwrap();
            tree.check_invariants().unwrap();
        }
        let stats = tree.stats();
        assert_eq!(stats.splits, 1, "only the root overflow may split");
        assert_eq!(stats.reinsertions, 1);
        assert_eq!(stats.reinserted_entries, 2);
        assert_eq!(tree.len(), 7);
    }

    #[test]
    fn test_level_reinserted_at_most_once_per_insert() {
        // identical points force the reinserted entries straight back
        // into the same leaf; the second overflow within the same
        // insert must split, not reinsert again
        let points: Vec<(u64, Vec<f64>)> =
            (0..9).map(|i| (i + 1, vec![1.0, 1.0])).collect();
        let relation = relation_of(points);
        let tree = small_tree(relation.clone());

        for id in relation.ids() {
            tree.insert(id).unwrap();
            tree.check_invariants().unwrap();
        }
        let stats = tree.stats();
        assert_eq!(stats.reinsertions, 1);
        assert_eq!(stats.reinserted_entries, 2);
        assert_eq!(stats.splits, 2);
    }

    #[test]
    fn test_tree_knn_matches_linear_scan() {
        let points: Vec<(u64, Vec<f64>)> = (0..50)
            .map(|i| {
                let x = ((i * 37) % 100) as f64 / 3.0;
                let y = ((i * 53) % 100) as f64 / 7.0;
                (i, vec![x, y])
            })
            .collect();
        let relation = relation_of(points);
        let tree = small_tree(relation.clone());
        for id in relation.ids() {
            tree.insert(id).unwrap();
        }
        let scan = LinearScan::new(relation.clone(), Arc::new(EuclideanDistance));

        for k in [1, 3, 10, 50] {
            for query in [[0.0, 0.0], [15.0, 7.0], [33.0, 14.0]] {
                let from_tree = tree.knn_query(&query, k).unwrap();
                let from_scan = scan.knn_query(&query, k).unwrap();
                assert_eq!(from_tree, from_scan, "k = {}, query = {:?}", k, query);
            }
        }

        for radius in [0.0, 1.5, 10.0, 100.0] {
            let from_tree = tree.range_query(&[10.0, 5.0], radius).unwrap();
            let from_scan = scan.range_query(&[10.0, 5.0], radius).unwrap();
            assert_eq!(from_tree, from_scan, "radius = {}", radius);
        }
    }

    #[test]
    fn test_knn_matches_linear_scan_on_seeded_random_points() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(4711);
        let points: Vec<(u64, Vec<f64>)> = (0..120)
            .map(|i| {
                (
                    i,
                    vec![rng.gen_range(0.0..50.0), rng.gen_range(0.0..50.0)],
                )
            })
            .collect();
        let relation = relation_of(points);
        let tree = small_tree(relation.clone());
        for id in relation.ids() {
            tree.insert(id).unwrap();
        }
        tree.check_invariants().unwrap();

        let scan = LinearScan::new(relation.clone(), Arc::new(EuclideanDistance));
        for _ in 0..10 {
            let query = [rng.gen_range(0.0..50.0), rng.gen_range(0.0..50.0)];
            let k = rng.gen_range(1..=20);
            assert_eq!(
                tree.knn_query(&query, k).unwrap(),
                scan.knn_query(&query, k).unwrap()
            );
        }
    }

    #[test]
    fn test_rknn_self_membership_pinned() {
        let relation = sample_relation();
        let tree = small_tree(relation.clone());
        for id in relation.ids() {
            tree.insert(id).unwrap();
        }

        // a member queried with its own coordinates is one of its own
        // reverse neighbors: self-distance competes like any other
        let result = tree.rknn_query(&[0.0, 0.0], 2).unwrap();
        assert!(result
            .iter()
            .any(|p| p.id == ObjectId::from(1) && p.distance == 0.0));
    }

    #[test]
    fn test_tree_rknn_matches_linear_scan() {
        let points: Vec<(u64, Vec<f64>)> = (0..30)
            .map(|i| (i, vec![((i * 29) % 60) as f64, ((i * 13) % 60) as f64]))
            .collect();
        let relation = relation_of(points);
        let tree = small_tree(relation.clone());
        for id in relation.ids() {
            tree.insert(id).unwrap();
        }
        let scan = LinearScan::new(relation.clone(), Arc::new(EuclideanDistance));

        for k in [1, 2, 5] {
            for qid in [0u64, 7, 29] {
                let coords = relation.get(ObjectId::from(qid)).unwrap().to_vec();
                let from_tree = tree.rknn_query(&coords, k).unwrap();
                let from_scan = scan.rknn_query(&coords, k).unwrap();
                assert_eq!(from_tree, from_scan, "k = {}, query id = {}", k, qid);
            }
        }
    }

    #[test]
    fn test_bulk_load_builds_a_static_index() {
        let points: Vec<(u64, Vec<f64>)> = (0..60)
            .map(|i| (i, vec![(i % 10) as f64, (i / 10) as f64]))
            .collect();
        let relation = relation_of(points);
        let tree = small_tree(relation.clone());
        let ids = relation.ids();

        tree.bulk_load(&ids).unwrap();
        tree.check_invariants().unwrap();
        assert_eq!(tree.len(), 60);

        // the bulk-built index is static
        let err = tree.insert(ObjectId::from(0)).unwrap_err();
        assert!(matches!(
            err,
            SpatialError::Core(GalenaError::Unsupported(_))
        ));

        // queries agree with the scan baseline
        let scan = LinearScan::new(relation.clone(), Arc::new(EuclideanDistance));
        let from_tree = tree.knn_query(&[4.5, 3.0], 7).unwrap();
        let from_scan = scan.knn_query(&[4.5, 3.0], 7).unwrap();
        assert_eq!(from_tree, from_scan);
    }

    #[test]
    fn test_bulk_load_requires_empty_tree() {
        let relation = sample_relation();
        let tree = small_tree(relation.clone());
        tree.insert(ObjectId::from(1)).unwrap();

        let err = tree.bulk_load(&relation.ids()).unwrap_err();
        assert!(matches!(
            err,
            SpatialError::Core(GalenaError::Unsupported(_))
        ));
    }

    #[test]
    fn test_delete_fails_loudly() {
        let relation = sample_relation();
        let tree = small_tree(relation);
        let err = tree.delete(ObjectId::from(1)).unwrap_err();
        assert!(matches!(
            err,
            SpatialError::Core(GalenaError::Unsupported(_))
        ));
    }

    #[test]
    fn test_insert_unknown_id_is_not_found() {
        let relation = sample_relation();
        let tree = small_tree(relation);
        let err = tree.insert(ObjectId::from(99)).unwrap_err();
        assert!(matches!(
            err,
            SpatialError::Core(GalenaError::NotFound(_))
        ));
    }

    #[test]
    fn test_query_dimension_mismatch_fails_fast() {
        let relation = sample_relation();
        let tree = small_tree(relation.clone());
        for id in relation.ids() {
            tree.insert(id).unwrap();
        }
        assert!(matches!(
            tree.knn_query(&[0.0], 1).unwrap_err(),
            SpatialError::Core(GalenaError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            tree.range_query(&[0.0, 0.0, 0.0], 1.0).unwrap_err(),
            SpatialError::Core(GalenaError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_bulk_cancellation_is_all_or_nothing() {
        let relation = sample_relation();
        let tree = small_tree(relation.clone());
        for id in relation.ids() {
            tree.insert(id).unwrap();
        }
        let token = CancellationToken::new();
        token.cancel();
        let queries = relation.ids();
        assert!(matches!(
            tree.bulk_rknn_query(&queries, 2, Some(&token)).unwrap_err(),
            SpatialError::Core(GalenaError::Cancelled)
        ));
    }
}
