//! Factored transition system boundary.
//!
//! Merge planning only needs to know which factors exist and how merges
//! produce new indices. [`FactoredSystem`] provides exactly that: one atomic
//! factor per task variable, and a [`merge`](FactoredSystem::merge) that
//! retires two factors and appends their composite under the next index.
//! The transition-system algebra itself lives elsewhere.

pub mod error;
pub mod system;
pub mod task;

pub use error::{FactorError, FactorResult};
pub use system::{Factor, FactoredSystem};
pub use task::{PlanningTask, UniformTask};
