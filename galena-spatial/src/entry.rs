//! Spatial entries: the contents of tree nodes.

use galena::id::ObjectId;
use serde::{Deserialize, Serialize};

use crate::bounding_box::BoundingBox;
use crate::errors::{SpatialError, SpatialResult};
use crate::node::NodeId;

/// An entry in a tree node.
///
/// Leaf entries carry an object and its coordinates; directory
/// entries reference a child node by id together with the minimum
/// bounding box of everything reachable through it. A freshly created
/// directory entry has no box until it is first extended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpatialEntry {
    Leaf {
        id: ObjectId,
        coords: Vec<f64>,
    },
    Directory {
        child: NodeId,
        mbr: Option<BoundingBox>,
    },
}

impl SpatialEntry {
    pub fn leaf(id: ObjectId, coords: Vec<f64>) -> Self {
        SpatialEntry::Leaf { id, coords }
    }

    pub fn directory(child: NodeId, mbr: BoundingBox) -> Self {
        SpatialEntry::Directory {
            child,
            mbr: Some(mbr),
        }
    }

    /// A directory entry that has not been extended yet.
    pub fn empty_directory(child: NodeId) -> Self {
        SpatialEntry::Directory { child, mbr: None }
    }

    pub fn is_leaf_entry(&self) -> bool {
        matches!(self, SpatialEntry::Leaf { .. })
    }

    /// The referenced child node, for directory entries.
    pub fn child_id(&self) -> Option<NodeId> {
        match self {
            SpatialEntry::Directory { child, .. } => Some(*child),
            SpatialEntry::Leaf { .. } => None,
        }
    }

    /// The bounding box of this entry. A leaf entry's box is the
    /// degenerate box around its point; a directory entry that was
    /// never extended has no box.
    pub fn mbr(&self) -> SpatialResult<BoundingBox> {
        match self {
            SpatialEntry::Leaf { coords, .. } => Ok(BoundingBox::from_point(coords)),
            SpatialEntry::Directory { mbr: Some(b), .. } => Ok(b.clone()),
            SpatialEntry::Directory { child, mbr: None } => Err(SpatialError::InvalidState(
                format!("directory entry for node {} has no bounding box yet", child),
            )),
        }
    }

    /// Unions `candidate` into this directory entry's box. Returns
    /// whether the box grew, so ancestor propagation can stop early.
    pub fn extend_mbr(&mut self, candidate: &BoundingBox) -> SpatialResult<bool> {
        match self {
            SpatialEntry::Leaf { id, .. } => Err(SpatialError::InvalidState(format!(
                "cannot extend the box of leaf entry {}",
                id
            ))),
            SpatialEntry::Directory { mbr: Some(b), .. } => Ok(b.extend(candidate)),
            SpatialEntry::Directory { mbr, .. } => {
                *mbr = Some(candidate.clone());
                Ok(true)
            }
        }
    }

    /// Replaces this directory entry's box outright. Used after
    /// evictions and splits, when the box may have shrunk.
    pub fn set_mbr(&mut self, new_mbr: BoundingBox) -> SpatialResult<()> {
        match self {
            SpatialEntry::Leaf { id, .. } => Err(SpatialError::InvalidState(format!(
                "cannot replace the box of leaf entry {}",
                id
            ))),
            SpatialEntry::Directory { mbr, .. } => {
                *mbr = Some(new_mbr);
                Ok(())
            }
        }
    }

    /// Centroid of this entry.
    pub fn center(&self) -> SpatialResult<Vec<f64>> {
        match self {
            SpatialEntry::Leaf { coords, .. } => Ok(coords.clone()),
            SpatialEntry::Directory { .. } => Ok(self.mbr()?.center()),
        }
    }

    pub fn dimensionality(&self) -> SpatialResult<usize> {
        match self {
            SpatialEntry::Leaf { coords, .. } => Ok(coords.len()),
            SpatialEntry::Directory { .. } => Ok(self.mbr()?.dimensionality()),
        }
    }

    /// Deterministic tie-break key for sorts: the object id for leaf
    /// entries, the child node id for directory entries.
    pub fn sort_key(&self) -> u64 {
        match self {
            SpatialEntry::Leaf { id, .. } => id.value(),
            SpatialEntry::Directory { child, .. } => *child,
        }
    }
}
