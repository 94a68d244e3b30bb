//! The planning task as seen by merge planning.

use serde::{Deserialize, Serialize};

/// Read-only view of a planning task.
///
/// Merge selectors consult it once during initialization; the factored
/// system uses it to create one atomic factor per variable.
pub trait PlanningTask {
    /// Short task name for logs.
    fn name(&self) -> &str;

    /// Number of state variables.
    fn num_variables(&self) -> usize;

    /// Number of values variable `var` can take.
    fn domain_size(&self, var: usize) -> usize;
}

/// Synthetic task in which every variable has the same domain size.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniformTask {
    pub name: String,
    pub num_variables: usize,
    pub domain_size: usize,
}

impl UniformTask {
    pub fn new(name: impl Into<String>, num_variables: usize, domain_size: usize) -> Self {
        Self {
            name: name.into(),
            num_variables,
            domain_size,
        }
    }
}

impl PlanningTask for UniformTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_variables(&self) -> usize {
        self.num_variables
    }

    fn domain_size(&self, _var: usize) -> usize {
        self.domain_size
    }
}
