//! Arena storage for merge tree nodes, plus the structural queries and the
//! direct-merge mutation that operate on it.
//!
//! [`NodeArena`] keeps nodes in a flat slot vector addressed by [`NodeId`].
//! Freeing a node empties its slot; slots are never reused, so a stale
//! handle can only ever fail to resolve, never alias a newer node.
//!
//! # Traversal order
//!
//! All traversals are pre-order and visit the left child before the right
//! one. The parent lookup used by reconciliation depends on this order for
//! its tie-breaking, so it must not change.

use std::fmt;

use serde::{Deserialize, Serialize};

use mst_types::{FactorIndex, MergePair};

use crate::error::{TreeError, TreeResult};
use crate::node::{MergeTreeNode, NodeId, NodeKind};

/// Result of collapsing a node whose two children are leaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Collapse {
    /// Factor indices of the former children, left then right.
    pub pair: MergePair,
    /// Handles of the two freed children.
    pub freed: [NodeId; 2],
}

/// Flat storage for merge tree nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeArena {
    slots: Vec<Option<MergeTreeNode>>,
    /// Number of occupied slots.
    live: usize,
}

impl NodeArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty arena with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            live: 0,
        }
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no node is live.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Returns `true` if `id` resolves to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.index()), Some(Some(_)))
    }

    /// Resolve a handle.
    pub fn get(&self, id: NodeId) -> TreeResult<&MergeTreeNode> {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(TreeError::StaleHandle(id))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> TreeResult<&mut MergeTreeNode> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(TreeError::StaleHandle(id))
    }

    // ---------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------

    fn allocate(&mut self, node: MergeTreeNode) -> TreeResult<NodeId> {
        let id = slot_handle(self.slots.len())?;
        self.slots.push(Some(node));
        self.live += 1;
        Ok(id)
    }

    /// Allocate a detached leaf for `factor`.
    pub fn allocate_leaf(&mut self, factor: FactorIndex) -> TreeResult<NodeId> {
        self.allocate(MergeTreeNode::leaf(factor))
    }

    /// Allocate an internal node that takes ownership of two detached
    /// subtrees.
    pub fn allocate_internal(&mut self, left: NodeId, right: NodeId) -> TreeResult<NodeId> {
        if left == right {
            return Err(TreeError::IllegalTreeState(format!(
                "node {left} cannot be both children of one merge"
            )));
        }
        for child in [left, right] {
            if let Some(parent) = self.get(child)?.parent {
                return Err(TreeError::IllegalTreeState(format!(
                    "node {child} is already owned by {parent}"
                )));
            }
        }
        let id = self.allocate(MergeTreeNode::internal(left, right))?;
        self.get_mut(left)?.parent = Some(id);
        self.get_mut(right)?.parent = Some(id);
        Ok(id)
    }

    /// Free a single node. Its children, if any, are left untouched.
    pub(crate) fn release(&mut self, id: NodeId) -> TreeResult<MergeTreeNode> {
        let node = self
            .slots
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(TreeError::StaleHandle(id))?;
        self.live -= 1;
        Ok(node)
    }

    /// Point whichever child slot of `parent` holds `old_child` at
    /// `new_child`.
    pub(crate) fn replace_child(
        &mut self,
        parent: NodeId,
        old_child: NodeId,
        new_child: NodeId,
    ) -> TreeResult<()> {
        let node = self.get_mut(parent)?;
        let NodeKind::Internal { left, right } = &mut node.kind else {
            return Err(TreeError::IllegalTreeState(format!(
                "parent {parent} is a leaf"
            )));
        };
        if *left == old_child {
            *left = new_child;
            return Ok(());
        }
        if *right == old_child {
            *right = new_child;
            return Ok(());
        }
        Err(TreeError::IllegalTreeState(format!(
            "{old_child} is not a child of {parent}"
        )))
    }

    // ---------------------------------------------------------------
    // Predicates
    // ---------------------------------------------------------------

    /// Returns `true` if `id` is a leaf.
    pub fn is_leaf(&self, id: NodeId) -> TreeResult<bool> {
        Ok(self.get(id)?.is_leaf())
    }

    /// Returns `true` if `id` is internal and both of its children are
    /// leaves, i.e. it is a merge that can be performed right now.
    pub fn has_two_leaf_children(&self, id: NodeId) -> TreeResult<bool> {
        match self.get(id)?.children() {
            Some((left, right)) => Ok(self.is_leaf(left)? && self.is_leaf(right)?),
            None => Ok(false),
        }
    }

    /// Factor index of `id` if it is a leaf.
    pub fn factor_of(&self, id: NodeId) -> TreeResult<Option<FactorIndex>> {
        Ok(self.get(id)?.factor())
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Pre-order walk of the subtree rooted at `from`.
    pub fn preorder(&self, from: NodeId) -> Preorder<'_> {
        Preorder {
            arena: self,
            stack: vec![from],
        }
    }

    /// The leftmost node that has two leaf children.
    ///
    /// Descends into the left child whenever it is internal and into the
    /// right child otherwise. Every internal subtree contains such a node,
    /// so the walk only fails when `from` is itself a leaf.
    pub fn find_next_pending_merge(&self, from: NodeId) -> TreeResult<NodeId> {
        let mut current = from;
        loop {
            let Some((left, right)) = self.get(current)?.children() else {
                return Err(TreeError::FullyCollapsed);
            };
            let left_leaf = self.is_leaf(left)?;
            let right_leaf = self.is_leaf(right)?;
            current = match (left_leaf, right_leaf) {
                (true, true) => return Ok(current),
                (false, _) => left,
                (true, false) => right,
            };
        }
    }

    /// Locate the parents of the leaves holding either index of `pair`.
    ///
    /// Walks pre-order from `from`; at each internal node the left child is
    /// checked before the right one. A node is reported once for every
    /// matching leaf child, so siblings yield the same parent twice. The
    /// walk stops as soon as two entries are collected, and the order of
    /// the returned handles is the discovery order.
    pub fn find_parents_of(&self, from: NodeId, pair: MergePair) -> TreeResult<Vec<NodeId>> {
        let mut found = Vec::with_capacity(2);
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            let Some((left, right)) = self.get(id)?.children() else {
                continue;
            };
            for child in [left, right] {
                if let Some(factor) = self.factor_of(child)? {
                    if pair.contains(factor) {
                        found.push(id);
                        if found.len() == 2 {
                            return Ok(found);
                        }
                    }
                }
            }
            stack.push(right);
            stack.push(left);
        }
        Ok(found)
    }

    /// Number of internal nodes below and including `from`.
    pub fn count_internal_nodes(&self, from: NodeId) -> usize {
        self.preorder(from).filter(|(_, node)| !node.is_leaf()).count()
    }

    /// Number of leaves below and including `from`.
    pub fn count_leaves(&self, from: NodeId) -> usize {
        self.preorder(from).filter(|(_, node)| node.is_leaf()).count()
    }

    /// Factor indices of all leaves below `from`, left to right.
    pub fn leaf_indices(&self, from: NodeId) -> Vec<FactorIndex> {
        self.preorder(from)
            .filter_map(|(_, node)| node.factor())
            .collect()
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Perform the planned merge at `id`: free both leaf children and turn
    /// `id` into a leaf carrying `new_index`.
    pub fn collapse_to_leaf(&mut self, id: NodeId, new_index: FactorIndex) -> TreeResult<Collapse> {
        let children = self.get(id)?.children();
        let (left, right) = match children {
            Some(pair) if self.has_two_leaf_children(id)? => pair,
            _ => {
                return Err(TreeError::IllegalTreeState(format!(
                    "cannot collapse {id}: it does not have two leaf children"
                )))
            }
        };
        let left_factor = self.release(left)?.factor();
        let right_factor = self.release(right)?.factor();
        let (Some(first), Some(second)) = (left_factor, right_factor) else {
            return Err(TreeError::IllegalTreeState(format!(
                "children of {id} lost their factor indices"
            )));
        };
        self.get_mut(id)?.kind = NodeKind::Leaf { factor: new_index };
        Ok(Collapse {
            pair: MergePair { first, second },
            freed: [left, right],
        })
    }

    // ---------------------------------------------------------------
    // Diagnostics
    // ---------------------------------------------------------------

    /// Write the subtree at `from` as a tree rotated 90° counter-clockwise:
    /// right subtree first, each level indented by `offset` more spaces.
    /// Internal nodes print as `*`.
    pub fn pretty_print(&self, from: NodeId, offset: usize, sink: &mut dyn fmt::Write) -> fmt::Result {
        self.pretty_print_at(from, offset, 0, sink)
    }

    fn pretty_print_at(
        &self,
        id: NodeId,
        offset: usize,
        indentation: usize,
        sink: &mut dyn fmt::Write,
    ) -> fmt::Result {
        let Ok(node) = self.get(id) else {
            return writeln!(sink, "{:indentation$}<{id} freed>", "");
        };
        match node.kind {
            NodeKind::Leaf { factor } => writeln!(sink, "{:indentation$}{factor}", ""),
            NodeKind::Internal { left, right } => {
                self.pretty_print_at(right, offset, indentation + offset, sink)?;
                writeln!(sink, "{:indentation$}*", "")?;
                self.pretty_print_at(left, offset, indentation + offset, sink)
            }
        }
    }
}

/// Handle for the slot at position `len`.
fn slot_handle(len: usize) -> TreeResult<NodeId> {
    u32::try_from(len).map(NodeId::new).map_err(|_| {
        TreeError::IllegalTreeState(format!("arena is full: no handle for slot {len}"))
    })
}

/// Pre-order iterator over a subtree, left before right.
///
/// Handles that no longer resolve are skipped.
pub struct Preorder<'a> {
    arena: &'a NodeArena,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = (NodeId, &'a MergeTreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            let Ok(node) = self.arena.get(id) else {
                continue;
            };
            if let Some((left, right)) = node.children() {
                self.stack.push(right);
                self.stack.push(left);
            }
            return Some((id, node));
        }
        None
    }
}
