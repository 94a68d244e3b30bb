//! Merge selectors for merge-and-shrink.
//!
//! The driver asks a [`MergeSelector`] which pair of factors to merge next.
//! [`TreeSelector`] follows a precomputed [`MergeTree`](mst_tree::MergeTree);
//! [`ScoreBasedSelector`] scores every candidate pair and takes the best,
//! independent of any plan.
//!
//! # Quick Start
//!
//! ```rust
//! use mst_factors::{FactoredSystem, UniformTask};
//! use mst_selector::{MergeSelector, TreeSelector};
//! use mst_tree::TreeShape;
//! use mst_types::{MergePair, SeededRng, TieBreakPolicy};
//!
//! let task = UniformTask::new("demo", 3, 2);
//! let mut fts = FactoredSystem::atomic(&task).unwrap();
//! let mut selector =
//!     TreeSelector::new(TreeShape::Linear, TieBreakPolicy::UseFirst, SeededRng::shared(1));
//! selector.initialize(&task).unwrap();
//!
//! let pair = selector.select_merge(&fts, &[]).unwrap();
//! assert_eq!(pair, MergePair::new(0, 1));
//! fts.merge(pair).unwrap();
//! ```

pub mod error;
pub mod score_based;
pub mod selector;
pub mod tree_selector;

pub use error::{SelectorError, SelectorResult};
pub use score_based::{MergeScorer, ScoreBasedSelector, SmallestProductScorer};
pub use selector::{compute_merge_candidates, MergeSelector};
pub use tree_selector::TreeSelector;
