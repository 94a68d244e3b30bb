//! Building initial merge plans.
//!
//! The shape of the initial plan is decided outside the merge tree; these
//! builders cover the common shapes and explicit nesting.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use mst_types::{FactorIndex, SharedRandom, TieBreakPolicy};

use crate::arena::NodeArena;
use crate::error::{TreeError, TreeResult};
use crate::node::NodeId;
use crate::tree::MergeTree;

/// Shape of a generated plan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeShape {
    /// Left-deep: every merge absorbs the next factor.
    #[default]
    Linear,
    /// Neighbours paired level by level.
    Balanced,
}

impl fmt::Display for TreeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Balanced => write!(f, "balanced"),
        }
    }
}

impl FromStr for TreeShape {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "balanced" => Ok(Self::Balanced),
            _ => Err(TreeError::UnknownShape(s.to_string())),
        }
    }
}

/// Explicit nested merge plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanNode {
    Leaf(FactorIndex),
    Merge(Box<PlanNode>, Box<PlanNode>),
}

impl PlanNode {
    /// A plan consisting of a single factor.
    pub fn leaf(index: usize) -> Self {
        Self::Leaf(FactorIndex::new(index))
    }

    /// A plan merging two sub-plans.
    pub fn merge(left: PlanNode, right: PlanNode) -> Self {
        Self::Merge(Box::new(left), Box::new(right))
    }
}

/// Builds [`MergeTree`]s with a fixed tie-break policy and random stream.
pub struct MergeTreeBuilder {
    policy: TieBreakPolicy,
    rng: SharedRandom,
}

impl MergeTreeBuilder {
    pub fn new(policy: TieBreakPolicy, rng: SharedRandom) -> Self {
        Self { policy, rng }
    }

    /// Plan of the given shape over `leaves`.
    pub fn build(
        &self,
        shape: TreeShape,
        leaves: impl IntoIterator<Item = usize>,
    ) -> TreeResult<MergeTree> {
        match shape {
            TreeShape::Linear => self.linear(leaves),
            TreeShape::Balanced => self.balanced(leaves),
        }
    }

    /// Left-deep plan: `((f0, f1), f2), f3 ...` in the given order.
    pub fn linear(&self, order: impl IntoIterator<Item = usize>) -> TreeResult<MergeTree> {
        let leaves = collect_distinct(order)?;
        let mut arena = NodeArena::with_capacity(2 * leaves.len());
        let mut iter = leaves.into_iter();
        let Some(first) = iter.next() else {
            return Err(TreeError::EmptyPlan);
        };
        let mut root = arena.allocate_leaf(first)?;
        for factor in iter {
            let leaf = arena.allocate_leaf(factor)?;
            root = arena.allocate_internal(root, leaf)?;
        }
        self.finish(arena, root)
    }

    /// Balanced plan: neighbours are paired level by level, an odd node out
    /// is carried up to the next level unchanged.
    pub fn balanced(&self, leaves: impl IntoIterator<Item = usize>) -> TreeResult<MergeTree> {
        let leaves = collect_distinct(leaves)?;
        if leaves.is_empty() {
            return Err(TreeError::EmptyPlan);
        }
        let mut arena = NodeArena::with_capacity(2 * leaves.len());
        let mut level = leaves
            .into_iter()
            .map(|factor| arena.allocate_leaf(factor))
            .collect::<TreeResult<Vec<NodeId>>>()?;
        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            for chunk in level.chunks(2) {
                if let [left, right] = *chunk {
                    next.push(arena.allocate_internal(left, right)?);
                } else {
                    next.extend_from_slice(chunk);
                }
            }
            level = next;
        }
        self.finish(arena, level[0])
    }

    /// Tree with exactly the nesting of `plan`.
    pub fn from_plan(&self, plan: &PlanNode) -> TreeResult<MergeTree> {
        let mut arena = NodeArena::new();
        let mut seen = HashSet::new();
        let root = allocate_plan(&mut arena, &mut seen, plan)?;
        self.finish(arena, root)
    }

    fn finish(&self, arena: NodeArena, root: NodeId) -> TreeResult<MergeTree> {
        MergeTree::new(arena, root, SharedRandom::clone(&self.rng), self.policy)
    }
}

fn collect_distinct(leaves: impl IntoIterator<Item = usize>) -> TreeResult<Vec<FactorIndex>> {
    let mut seen = HashSet::new();
    leaves
        .into_iter()
        .map(FactorIndex::new)
        .map(|factor| {
            if seen.insert(factor) {
                Ok(factor)
            } else {
                Err(TreeError::DuplicateFactor(factor))
            }
        })
        .collect()
}

fn allocate_plan(
    arena: &mut NodeArena,
    seen: &mut HashSet<FactorIndex>,
    plan: &PlanNode,
) -> TreeResult<NodeId> {
    match plan {
        PlanNode::Leaf(factor) => {
            if !seen.insert(*factor) {
                return Err(TreeError::DuplicateFactor(*factor));
            }
            arena.allocate_leaf(*factor)
        }
        PlanNode::Merge(left, right) => {
            let left = allocate_plan(arena, seen, left)?;
            let right = allocate_plan(arena, seen, right)?;
            arena.allocate_internal(left, right)
        }
    }
}
