//! Merge tree for merge-and-shrink abstraction construction.
//!
//! A [`MergeTree`] records the order in which factors are planned to be
//! merged. Leaves reference live factor indices; every internal node is a
//! planned merge of exactly two children. The driver either follows the plan
//! ([`MergeTree::next_merge`]) or folds a merge chosen elsewhere back into it
//! ([`MergeTree::reconcile`]), which may restructure the tree.
//!
//! Nodes live in a [`NodeArena`] and are addressed by [`NodeId`] handles.
//! Children are owned through the arena; the parent link is a plain handle
//! used for upward navigation only.
//!
//! # Quick Start
//!
//! ```rust
//! use mst_tree::MergeTreeBuilder;
//! use mst_types::{FactorIndex, MergePair, SeededRng, TieBreakPolicy};
//!
//! let rng = SeededRng::shared(2016);
//! let mut tree = MergeTreeBuilder::new(TieBreakPolicy::UseFirst, rng)
//!     .balanced([0, 1, 2, 3])
//!     .unwrap();
//! assert_eq!(tree.next_merge(FactorIndex::new(4)).unwrap(), MergePair::new(0, 1));
//! tree.reconcile(MergePair::new(2, 3), FactorIndex::new(5)).unwrap();
//! assert_eq!(tree.next_merge(FactorIndex::new(6)).unwrap(), MergePair::new(4, 5));
//! assert_eq!(tree.root_index(), Some(FactorIndex::new(6)));
//! ```

pub mod arena;
pub mod builder;
pub mod error;
pub mod node;
pub mod reconcile;
pub mod tree;

pub use arena::{Collapse, NodeArena, Preorder};
pub use builder::{MergeTreeBuilder, PlanNode, TreeShape};
pub use error::{TreeError, TreeResult};
pub use node::{MergeTreeNode, NodeId, NodeKind};
pub use reconcile::{LocatedParents, ParentSplit, ReconcilePlan, Restructure};
pub use tree::{MergeTree, ReconcileKind, ReconcileOutcome};
