//! Tree nodes and the node storage contract.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::bounding_box::BoundingBox;
use crate::entry::SpatialEntry;
use crate::errors::{SpatialError, SpatialResult};

/// Identifier of a node within a store. Entries reference children by
/// id, never by direct ownership, so node storage stays a swappable
/// collaborator.
pub type NodeId = u64;

/// Root-to-node path as `(node id, entry index)` pairs; its length is
/// the depth of the node below the root.
pub type TreePath = Vec<(NodeId, usize)>;

/// A fixed-capacity tree node.
///
/// `level` counts from the leaves: leaf nodes are level 0, their
/// parents level 1, and so on. Capacity bounds (`min_entries <= len
/// <= max_entries` for non-root nodes) are enforced by the tree, not
/// by the node itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub level: u32,
    pub entries: Vec<SpatialEntry>,
}

impl Node {
    pub fn new(level: u32) -> Self {
        Node {
            level,
            entries: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.level == 0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bounding box enclosing all entries of this node.
    pub fn mbr(&self) -> SpatialResult<BoundingBox> {
        let mut iter = self.entries.iter();
        let first = iter
            .next()
            .ok_or_else(|| SpatialError::InvalidState("empty node has no bounding box".into()))?;
        let mut mbr = first.mbr()?;
        for entry in iter {
            mbr.extend(&entry.mbr()?);
        }
        Ok(mbr)
    }
}

/// Narrow id-to-node lookup contract behind the tree.
///
/// The tree never assumes anything about where nodes live; a store
/// could page to disk, cache, or share nodes. The in-memory store
/// below is the only implementation shipped here.
pub trait NodeStore: Send + Sync {
    /// Reads the node stored under `id`.
    fn read(&self, id: NodeId) -> SpatialResult<Node>;

    /// Writes (or replaces) the node stored under `id`.
    fn write(&self, id: NodeId, node: Node) -> SpatialResult<()>;

    /// Allocates a fresh node id.
    fn allocate(&self) -> NodeId;

    /// Number of stored nodes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory node store.
#[derive(Debug, Default)]
pub struct MemoryNodeStore {
    nodes: RwLock<HashMap<NodeId, Node>>,
    next_id: AtomicU64,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        MemoryNodeStore {
            nodes: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl NodeStore for MemoryNodeStore {
    fn read(&self, id: NodeId) -> SpatialResult<Node> {
        self.nodes
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| SpatialError::InvalidState(format!("node {} does not exist", id)))
    }

    fn write(&self, id: NodeId, node: Node) -> SpatialResult<()> {
        self.nodes.write().insert(id, node);
        Ok(())
    }

    fn allocate(&self) -> NodeId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn len(&self) -> usize {
        self.nodes.read().len()
    }
}
