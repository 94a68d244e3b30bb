//! Merge tree node records.
//!
//! A node is either a leaf carrying a [`FactorIndex`] or an internal node
//! with exactly two children. [`NodeKind`] makes any other shape
//! unrepresentable: there is no one-child node and no internal node with a
//! factor index.

use std::fmt;

use serde::{Deserialize, Serialize};

use mst_types::FactorIndex;

/// Stable handle of a node inside a [`NodeArena`](crate::arena::NodeArena).
///
/// Handles are never reused: once a node is freed its handle stays invalid
/// for the lifetime of the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Slot position in the arena.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Shape of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// A live factor that has not been merged away yet.
    Leaf { factor: FactorIndex },
    /// A planned merge of two subtrees.
    Internal { left: NodeId, right: NodeId },
}

/// A node stored in the arena.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeTreeNode {
    /// Back-link for upward navigation. `None` for the root.
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
}

impl MergeTreeNode {
    pub(crate) fn leaf(factor: FactorIndex) -> Self {
        Self {
            parent: None,
            kind: NodeKind::Leaf { factor },
        }
    }

    pub(crate) fn internal(left: NodeId, right: NodeId) -> Self {
        Self {
            parent: None,
            kind: NodeKind::Internal { left, right },
        }
    }

    /// Returns `true` if this node carries a factor index.
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// The factor index, for leaves.
    pub fn factor(&self) -> Option<FactorIndex> {
        match self.kind {
            NodeKind::Leaf { factor } => Some(factor),
            NodeKind::Internal { .. } => None,
        }
    }

    /// Left and right child, for internal nodes.
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        match self.kind {
            NodeKind::Leaf { .. } => None,
            NodeKind::Internal { left, right } => Some((left, right)),
        }
    }

    /// The parent back-link.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The node shape.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }
}
