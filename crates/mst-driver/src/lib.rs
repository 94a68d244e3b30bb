//! Merge-and-shrink driver loop.
//!
//! The driver merges factors until one remains. Each merge is chosen by a
//! [`MergeSelector`](mst_selector::MergeSelector), performed on a
//! [`FactoredSystem`](mst_factors::FactoredSystem), and then folded into a
//! merge tree, either because the selector followed the tree or through
//! reconciliation. A run ends with a check that the tree collapsed onto the
//! surviving factor.
//!
//! ```rust
//! use mst_driver::{DriverConfig, MergeDriver, SelectorKind};
//! use mst_factors::UniformTask;
//!
//! let config = DriverConfig {
//!     selector: SelectorKind::SmallestFirst,
//!     ..Default::default()
//! };
//! let run = MergeDriver::new(config).run(&UniformTask::new("demo", 5, 2)).unwrap();
//! assert_eq!(run.steps.len(), 4);
//! assert_eq!(run.final_factor.get(), 8);
//! ```

pub mod config;
pub mod driver;
pub mod error;

pub use config::{DriverConfig, SelectorKind, DEFAULT_SEED};
pub use driver::{MergeDriver, MergeRun, MergeStep, StepKind};
pub use error::{DriverError, DriverResult};
