//! Planning and applying the reconciliation of a realized merge.
//!
//! Reconciliation is split in two phases. The planning functions here are
//! pure: they read the arena and describe the change as a
//! [`ReconcilePlan`], checking every precondition on the way. Only
//! [`NodeArena::apply`] mutates, and it runs after planning succeeded, so a
//! rejected reconciliation never leaves a half-linked tree behind.
//!
//! # Cases
//!
//! - Both merged factors are sibling leaves: the plan is a direct merge of
//!   their parent, identical to following the tree's own plan.
//! - The factors sit under two different parents: one parent is kept and
//!   its target leaf is relabelled with the new index. The other parent is
//!   freed together with its target leaf, and its remaining child is
//!   promoted into the freed parent's slot (or becomes the root).

use mst_types::{FactorIndex, KeptParent, MergePair};

use crate::arena::NodeArena;
use crate::error::{TreeError, TreeResult};
use crate::node::{NodeId, NodeKind};

/// The two parents located for a merge pair, in discovery order.
///
/// Both fields hold the same handle when the factors are siblings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocatedParents {
    pub first: NodeId,
    pub second: NodeId,
}

impl LocatedParents {
    /// Returns `true` if both factors hang below the same node.
    pub fn is_same(&self) -> bool {
        self.first == self.second
    }
}

/// A located parent split into the child holding a merged factor and the
/// other child.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParentSplit {
    pub parent: NodeId,
    /// Leaf child carrying one of the merged factor indices.
    pub target: NodeId,
    /// The remaining child; may be a leaf or a whole subtree.
    pub other: NodeId,
}

/// Description of a diverging-merge restructuring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Restructure {
    pub kept: KeptParent,
    /// Parent that stays in the tree.
    pub surviving_parent: NodeId,
    /// Leaf under the surviving parent that will carry the new index.
    pub relabeled_leaf: NodeId,
    /// Parent that is freed.
    pub removed_parent: NodeId,
    /// Leaf under the removed parent; freed with it.
    pub consumed_leaf: NodeId,
    /// Other child of the removed parent; takes the removed parent's slot.
    pub promoted: NodeId,
    /// Parent of the removed parent. `None` if the removed parent is the
    /// root, in which case `promoted` becomes the new root.
    pub grandparent: Option<NodeId>,
}

/// What reconciling a merge will do to the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcilePlan {
    /// The merged factors are siblings: collapse their parent.
    DirectMerge { parent: NodeId },
    /// The merged factors are not siblings: restructure.
    Restructure(Restructure),
}

/// Result of applying a plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Applied {
    /// Set when the root handle changed.
    pub(crate) new_root: Option<NodeId>,
    pub(crate) freed: Vec<NodeId>,
}

/// Find the parents of the leaves holding the factors of `pair`.
pub fn locate_parents(arena: &NodeArena, root: NodeId, pair: MergePair) -> TreeResult<LocatedParents> {
    if let Some(factor) = arena.factor_of(root)? {
        if pair.contains(factor) {
            return Err(TreeError::RootIsTarget { pair });
        }
    }
    let found = arena.find_parents_of(root, pair)?;
    match found.as_slice() {
        [first, second] => Ok(LocatedParents {
            first: *first,
            second: *second,
        }),
        _ => Err(TreeError::ParentsNotFound {
            pair,
            found: found.len(),
        }),
    }
}

/// Split a located parent into its target leaf and its other child.
///
/// The left child is checked first. A parent without a leaf child carrying
/// a factor of `pair` is an illegal tree state.
pub fn split_parent(arena: &NodeArena, parent: NodeId, pair: MergePair) -> TreeResult<ParentSplit> {
    let Some((left, right)) = arena.get(parent)?.children() else {
        return Err(TreeError::IllegalTreeState(format!(
            "located parent {parent} of merge {pair} is a leaf"
        )));
    };
    let holds_target = |id: NodeId| -> TreeResult<bool> {
        Ok(arena.factor_of(id)?.is_some_and(|factor| pair.contains(factor)))
    };
    if holds_target(left)? {
        Ok(ParentSplit {
            parent,
            target: left,
            other: right,
        })
    } else if holds_target(right)? {
        Ok(ParentSplit {
            parent,
            target: right,
            other: left,
        })
    } else {
        Err(TreeError::IllegalTreeState(format!(
            "located parent {parent} has no leaf child holding a factor of merge {pair}"
        )))
    }
}

/// Describe the restructuring that keeps one parent and removes the other.
pub fn plan_restructure(
    arena: &NodeArena,
    first: ParentSplit,
    second: ParentSplit,
    kept: KeptParent,
) -> TreeResult<Restructure> {
    let (surviving, removed) = match kept {
        KeptParent::First => (first, second),
        KeptParent::Second => (second, first),
    };
    Ok(Restructure {
        kept,
        surviving_parent: surviving.parent,
        relabeled_leaf: surviving.target,
        removed_parent: removed.parent,
        consumed_leaf: removed.target,
        promoted: removed.other,
        grandparent: arena.get(removed.parent)?.parent(),
    })
}

impl NodeArena {
    /// Carry out a plan produced against this arena.
    pub(crate) fn apply(&mut self, plan: &ReconcilePlan, new_index: FactorIndex) -> TreeResult<Applied> {
        match *plan {
            ReconcilePlan::DirectMerge { parent } => {
                let collapse = self.collapse_to_leaf(parent, new_index)?;
                Ok(Applied {
                    new_root: None,
                    freed: collapse.freed.to_vec(),
                })
            }
            ReconcilePlan::Restructure(r) => self.apply_restructure(&r, new_index),
        }
    }

    fn apply_restructure(&mut self, r: &Restructure, new_index: FactorIndex) -> TreeResult<Applied> {
        self.get_mut(r.relabeled_leaf)?.kind = NodeKind::Leaf { factor: new_index };

        // Detach the promoted subtree first so freeing the removed parent
        // cannot reach it.
        let new_root = match r.grandparent {
            Some(grandparent) => {
                self.replace_child(grandparent, r.removed_parent, r.promoted)?;
                None
            }
            None => Some(r.promoted),
        };
        self.get_mut(r.promoted)?.parent = r.grandparent;

        self.release(r.consumed_leaf)?;
        self.release(r.removed_parent)?;

        Ok(Applied {
            new_root,
            freed: vec![r.removed_parent, r.consumed_leaf],
        })
    }
}
