//! The merge tree and its driver-facing operations.
//!
//! # Invariants
//!
//! - Every internal node has exactly two live children whose back-link
//!   points at it; the root has no parent.
//! - No node is reachable twice, and every live arena slot is reachable
//!   from the root.
//! - Each successful [`MergeTree::next_merge`] or [`MergeTree::reconcile`]
//!   removes exactly one leaf. A tree over `n` leaves is a single leaf after
//!   exactly `n - 1` of them.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use mst_types::{FactorIndex, KeptParent, MergePair, SharedRandom, TieBreakPolicy};

use crate::arena::NodeArena;
use crate::error::{TreeError, TreeResult};
use crate::node::NodeId;
use crate::reconcile::{locate_parents, plan_restructure, split_parent, ReconcilePlan};

/// Which branch of reconciliation was taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileKind {
    /// The merged factors were siblings; their parent was collapsed.
    DirectMerge,
    /// The merged factors had different parents; the tree was restructured.
    Restructure { kept: KeptParent },
}

/// Report of a completed reconciliation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub kind: ReconcileKind,
    /// Handles freed by the operation. Always two.
    pub freed: Vec<NodeId>,
}

impl ReconcileOutcome {
    /// Returns `true` if the realized merge diverged from the plan.
    pub fn diverged(&self) -> bool {
        matches!(self.kind, ReconcileKind::Restructure { .. })
    }
}

/// A binary merge plan over factor indices.
pub struct MergeTree {
    arena: NodeArena,
    root: NodeId,
    rng: SharedRandom,
    policy: TieBreakPolicy,
}

impl MergeTree {
    /// Wrap an arena whose tree hangs below `root`.
    ///
    /// The structure is validated up front; plan builders are the usual
    /// way to obtain one (see [`MergeTreeBuilder`](crate::MergeTreeBuilder)).
    pub fn new(
        arena: NodeArena,
        root: NodeId,
        rng: SharedRandom,
        policy: TieBreakPolicy,
    ) -> TreeResult<Self> {
        let tree = Self {
            arena,
            root,
            rng,
            policy,
        };
        tree.validate()?;
        Ok(tree)
    }

    /// The tie-break policy chosen at construction.
    pub fn policy(&self) -> TieBreakPolicy {
        self.policy
    }

    /// Handle of the current root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Read access to the node storage.
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// The factor held by the root once the tree is fully collapsed.
    pub fn root_index(&self) -> Option<FactorIndex> {
        self.arena.factor_of(self.root).ok().flatten()
    }

    /// Returns `true` if a single factor remains.
    pub fn is_done(&self) -> bool {
        self.root_index().is_some()
    }

    /// Number of leaves, i.e. live factors tracked by the plan.
    pub fn num_leaves(&self) -> usize {
        self.arena.count_leaves(self.root)
    }

    /// Number of planned merges still ahead.
    pub fn num_internal_nodes(&self) -> usize {
        self.arena.count_internal_nodes(self.root)
    }

    /// Factor indices of all leaves, left to right.
    pub fn leaf_indices(&self) -> Vec<FactorIndex> {
        self.arena.leaf_indices(self.root)
    }

    // ---------------------------------------------------------------
    // Following the plan
    // ---------------------------------------------------------------

    /// The merge [`next_merge`](Self::next_merge) would perform, without
    /// performing it.
    pub fn peek_next_merge(&self) -> TreeResult<MergePair> {
        let node = self.arena.find_next_pending_merge(self.root)?;
        self.pending_pair(node)
    }

    fn pending_pair(&self, node: NodeId) -> TreeResult<MergePair> {
        let (left, right) = self
            .arena
            .get(node)?
            .children()
            .ok_or_else(|| TreeError::IllegalTreeState(format!("pending merge {node} is a leaf")))?;
        match (self.arena.factor_of(left)?, self.arena.factor_of(right)?) {
            (Some(first), Some(second)) => Ok(MergePair { first, second }),
            _ => Err(TreeError::IllegalTreeState(format!(
                "pending merge {node} lacks two leaf children"
            ))),
        }
    }

    /// Take the leftmost pending merge off the plan.
    ///
    /// Returns the two factors to merge, left then right. The caller must
    /// merge exactly these and the composite must be known as `new_index`;
    /// the tree already records it under that index when this returns.
    pub fn next_merge(&mut self, new_index: FactorIndex) -> TreeResult<MergePair> {
        let node = self.arena.find_next_pending_merge(self.root)?;
        self.check_fresh(new_index, self.pending_pair(node)?)?;
        let collapse = self.arena.collapse_to_leaf(node, new_index)?;
        debug!(
            first = %collapse.pair.first,
            second = %collapse.pair.second,
            new_index = %new_index,
            "merge tree: next merge"
        );
        self.debug_validate();
        Ok(collapse.pair)
    }

    // ---------------------------------------------------------------
    // Reconciliation
    // ---------------------------------------------------------------

    /// Describe what reconciling `pair` would do if the tie-break resolved
    /// to `kept`. Does not mutate the tree or consume randomness.
    pub fn plan_reconcile(&self, pair: MergePair, kept: KeptParent) -> TreeResult<ReconcilePlan> {
        self.build_plan(pair, || kept)
    }

    /// Fold a merge chosen outside the plan back into the tree.
    ///
    /// If the two factors are planned siblings this is a direct merge.
    /// Otherwise the tie-break policy picks which of the two located
    /// parents survives and the tree is restructured around it. Either way
    /// one leaf disappears and the composite is recorded as `new_index`.
    /// Randomness is drawn only for a restructure under
    /// [`TieBreakPolicy::UseRandom`].
    pub fn reconcile(&mut self, pair: MergePair, new_index: FactorIndex) -> TreeResult<ReconcileOutcome> {
        self.check_fresh(new_index, pair)?;
        let plan = self.build_plan(pair, || self.policy.choose(&mut *self.rng.borrow_mut()))?;

        let applied = self.arena.apply(&plan, new_index)?;
        if let Some(root) = applied.new_root {
            self.root = root;
        }

        let kind = match plan {
            ReconcilePlan::DirectMerge { .. } => ReconcileKind::DirectMerge,
            ReconcilePlan::Restructure(r) => ReconcileKind::Restructure { kept: r.kept },
        };
        debug!(
            first = %pair.first,
            second = %pair.second,
            new_index = %new_index,
            kind = ?kind,
            new_root = applied.new_root.is_some(),
            "merge tree: reconciled merge"
        );
        self.debug_validate();
        Ok(ReconcileOutcome {
            kind,
            freed: applied.freed,
        })
    }

    /// `new_index` may reuse one of the merged factors, which disappear,
    /// but no other live leaf.
    fn check_fresh(&self, new_index: FactorIndex, merged: MergePair) -> TreeResult<()> {
        if !merged.contains(new_index) && self.leaf_indices().contains(&new_index) {
            return Err(TreeError::DuplicateFactor(new_index));
        }
        Ok(())
    }

    fn build_plan(
        &self,
        pair: MergePair,
        choose: impl FnOnce() -> KeptParent,
    ) -> TreeResult<ReconcilePlan> {
        pair.checked()?;
        let located = locate_parents(&self.arena, self.root, pair)?;
        if located.is_same() {
            return Ok(ReconcilePlan::DirectMerge {
                parent: located.first,
            });
        }
        let first = split_parent(&self.arena, located.first, pair)?;
        let second = split_parent(&self.arena, located.second, pair)?;
        let kept = choose();
        Ok(ReconcilePlan::Restructure(plan_restructure(
            &self.arena,
            first,
            second,
            kept,
        )?))
    }

    // ---------------------------------------------------------------
    // Diagnostics
    // ---------------------------------------------------------------

    /// Write the tree, rotated 90°, with `offset` spaces per level.
    pub fn write_dump(&self, offset: usize, sink: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(sink, "Merge tree, read from left to right (90° rotated tree):")?;
        self.arena.pretty_print(self.root, offset, sink)
    }

    /// [`write_dump`](Self::write_dump) into a fresh string.
    pub fn dump(&self, offset: usize) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_dump(offset, &mut out);
        out
    }

    /// Check the structural invariants of the whole tree.
    pub fn validate(&self) -> TreeResult<()> {
        let root = self.arena.get(self.root)?;
        if let Some(parent) = root.parent() {
            return Err(TreeError::IllegalTreeState(format!(
                "root {} has parent {parent}",
                self.root
            )));
        }

        let mut seen = HashSet::new();
        let mut factors = HashSet::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                return Err(TreeError::IllegalTreeState(format!("{id} is reachable twice")));
            }
            let node = self.arena.get(id)?;
            if let Some(factor) = node.factor() {
                if !factors.insert(factor) {
                    return Err(TreeError::DuplicateFactor(factor));
                }
            }
            if let Some((left, right)) = node.children() {
                for child in [left, right] {
                    let back = self.arena.get(child)?.parent();
                    if back != Some(id) {
                        return Err(TreeError::IllegalTreeState(format!(
                            "{child} is a child of {id} but links back to {back:?}"
                        )));
                    }
                    stack.push(child);
                }
            }
        }

        if seen.len() != self.arena.len() {
            return Err(TreeError::IllegalTreeState(format!(
                "{} live nodes but only {} reachable from the root",
                self.arena.len(),
                seen.len()
            )));
        }
        Ok(())
    }

    fn debug_validate(&self) {
        debug_assert!(
            self.validate().is_ok(),
            "merge tree invariants broken: {:?}",
            self.validate()
        );
    }
}

impl fmt::Debug for MergeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeTree")
            .field("root", &self.root)
            .field("policy", &self.policy)
            .field("leaves", &self.leaf_indices())
            .finish()
    }
}
