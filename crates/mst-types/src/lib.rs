//! Foundation types for merge-tree bookkeeping.
//!
//! Every other `mst-*` crate depends on `mst-types`. The merge tree, the
//! factored system and the merge selectors only ever exchange the values
//! defined here.
//!
//! # Key Types
//!
//! - [`FactorIndex`] — Index of a live factor in the factored transition system
//! - [`MergePair`] — An ordered pair of factor indices to be merged
//! - [`TieBreakPolicy`] — Which parent survives a diverging reconciliation
//! - [`RandomSource`] / [`SeededRng`] — Deterministic run-wide randomness

pub mod error;
pub mod factor;
pub mod rng;
pub mod tie_break;

pub use error::TypeError;
pub use factor::{FactorIndex, MergePair};
pub use rng::{RandomSource, SeededRng, SharedRandom};
pub use tie_break::{KeptParent, TieBreakPolicy};
