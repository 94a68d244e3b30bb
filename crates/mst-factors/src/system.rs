//! Factor bookkeeping.
//!
//! # Invariants
//!
//! - Factor `i` lives at position `i`; indices are assigned in creation
//!   order and never reused.
//! - A merge retires both operands and creates exactly one new factor, so
//!   the active count drops by one per merge.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use mst_types::{FactorIndex, MergePair};

use crate::error::{FactorError, FactorResult};
use crate::task::PlanningTask;

/// A factor: the set of task variables it incorporates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factor {
    pub index: FactorIndex,
    /// Task variables incorporated into this factor.
    pub variables: BTreeSet<usize>,
    /// Number of abstract states (product of the domain sizes, saturating).
    pub num_states: u64,
    /// `false` once merged into a composite.
    pub active: bool,
}

impl Factor {
    /// Returns `true` if the factor covers a single variable.
    pub fn is_atomic(&self) -> bool {
        self.variables.len() == 1
    }
}

/// All factors created during one merge-and-shrink run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoredSystem {
    factors: Vec<Factor>,
    num_active: usize,
}

impl FactoredSystem {
    /// One atomic factor per task variable, indexed by variable.
    pub fn atomic(task: &dyn PlanningTask) -> FactorResult<Self> {
        if task.num_variables() == 0 {
            return Err(FactorError::EmptyTask);
        }
        let factors: Vec<Factor> = (0..task.num_variables())
            .map(|var| Factor {
                index: FactorIndex::new(var),
                variables: BTreeSet::from([var]),
                num_states: task.domain_size(var) as u64,
                active: true,
            })
            .collect();
        debug!(task = task.name(), factors = factors.len(), "created atomic factors");
        Ok(Self {
            num_active: factors.len(),
            factors,
        })
    }

    /// Total number of factors ever created.
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    /// Returns `true` if no factor was ever created.
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Number of factors not yet merged away.
    pub fn num_active(&self) -> usize {
        self.num_active
    }

    /// Returns `true` once a single factor remains.
    pub fn is_finished(&self) -> bool {
        self.num_active <= 1
    }

    /// The index the next merge will assign to its composite.
    pub fn next_index(&self) -> FactorIndex {
        FactorIndex::new(self.factors.len())
    }

    /// Look up a factor, active or not.
    pub fn get(&self, index: FactorIndex) -> FactorResult<&Factor> {
        self.factors
            .get(index.get())
            .ok_or(FactorError::UnknownFactor(index))
    }

    /// Indices of all active factors, ascending.
    pub fn active_indices(&self) -> Vec<FactorIndex> {
        self.factors
            .iter()
            .filter(|factor| factor.active)
            .map(|factor| factor.index)
            .collect()
    }

    /// Merge two active factors into a new one and return its index.
    ///
    /// The new index is always [`next_index`](Self::next_index) as observed
    /// before the call.
    pub fn merge(&mut self, pair: MergePair) -> FactorResult<FactorIndex> {
        if pair.first == pair.second {
            return Err(FactorError::SelfMerge(pair.first));
        }
        for index in [pair.first, pair.second] {
            if !self.get(index)?.active {
                return Err(FactorError::Inactive(index));
            }
        }

        let new_index = self.next_index();
        let (left, right) = (&self.factors[pair.first.get()], &self.factors[pair.second.get()]);
        let merged = Factor {
            index: new_index,
            variables: left.variables.union(&right.variables).copied().collect(),
            num_states: left.num_states.saturating_mul(right.num_states),
            active: true,
        };
        self.factors[pair.first.get()].active = false;
        self.factors[pair.second.get()].active = false;
        debug!(
            first = %pair.first,
            second = %pair.second,
            new_index = %new_index,
            states = merged.num_states,
            "merged factors"
        );
        self.factors.push(merged);
        self.num_active -= 1;
        Ok(new_index)
    }
}
