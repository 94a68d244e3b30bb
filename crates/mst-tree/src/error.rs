//! Error types for merge tree operations.
//!
//! Every variant describes a caller contract violation. Operations check
//! their preconditions before touching the arena, so an `Err` leaves the
//! tree exactly as it was.

use mst_types::{FactorIndex, MergePair, TypeError};

use crate::node::NodeId;

/// Errors that can occur during merge tree operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TreeError {
    /// No node has two leaf children: the tree is already a single leaf.
    #[error("merge tree is fully collapsed: no pending merge remains")]
    FullyCollapsed,

    /// Fewer than two parents were found for the given merge pair.
    #[error("illegal tree state: found {found} of 2 parents for merge {pair}")]
    ParentsNotFound {
        /// The merge that was being reconciled.
        pair: MergePair,
        /// How many parents the lookup located.
        found: usize,
    },

    /// The merge pair names the factor held by a single-leaf root.
    #[error("illegal tree state: merge {pair} names the root factor")]
    RootIsTarget {
        /// The merge that was being reconciled.
        pair: MergePair,
    },

    /// A structural invariant does not hold.
    #[error("illegal tree state: {0}")]
    IllegalTreeState(String),

    /// A handle refers to a node that has been freed.
    #[error("stale node handle: {0}")]
    StaleHandle(NodeId),

    /// The same factor would label two leaves: either a plan mentions it
    /// twice, or a merge result reuses an index that is still live.
    #[error("factor {0} would label more than one leaf of the merge tree")]
    DuplicateFactor(FactorIndex),

    /// A merge plan has no leaves at all.
    #[error("merge plan has no leaves")]
    EmptyPlan,

    /// A tree shape name that is neither `linear` nor `balanced`.
    #[error("unknown merge tree shape: {0}")]
    UnknownShape(String),

    /// Malformed input value.
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Convenience alias for merge tree results.
pub type TreeResult<T> = Result<T, TreeError>;
