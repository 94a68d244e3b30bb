use tracing::info;

use mst_factors::{FactoredSystem, PlanningTask};
use mst_tree::MergeTree;
use mst_types::{FactorIndex, MergePair};

use crate::error::{SelectorError, SelectorResult};

// ---------------------------------------------------------------------------
// MergeSelector trait
// ---------------------------------------------------------------------------

/// Chooses the next pair of factors to merge.
///
/// A selector is initialized once per task, then consulted once per merge.
/// The driver performs the merge itself; a selector never mutates the
/// factored system.
pub trait MergeSelector {
    /// Human-readable name (e.g., "merge tree", "score based").
    fn name(&self) -> &str;

    /// Log selector-specific options. Nothing by default.
    fn dump_specific_options(&self) {}

    /// Log the name and all options.
    fn dump_options(&self) {
        info!(selector = self.name(), "merge selector");
        self.dump_specific_options();
    }

    /// One-time setup against the task.
    fn initialize(&mut self, task: &dyn PlanningTask) -> SelectorResult<()>;

    /// Pick the next merge among `indices_subset`, or among all active
    /// factors when the subset is empty.
    fn select_merge(
        &mut self,
        fts: &FactoredSystem,
        indices_subset: &[FactorIndex],
    ) -> SelectorResult<MergePair>;

    /// Whether the driver must compute initial-state distances for every
    /// factor before calling [`select_merge`](Self::select_merge).
    fn requires_init_distances(&self) -> bool {
        false
    }

    /// Whether the driver must compute goal distances for every factor
    /// before calling [`select_merge`](Self::select_merge).
    fn requires_goal_distances(&self) -> bool {
        false
    }

    /// The merge tree this selector follows, if any.
    fn merge_tree(&self) -> Option<&MergeTree> {
        None
    }
}

/// All unordered pairs of candidate factors.
///
/// With an empty subset every active factor is a candidate and pairs come
/// out in ascending index order. Otherwise pairs follow subset order, and
/// every subset member must be active.
pub fn compute_merge_candidates(
    fts: &FactoredSystem,
    indices_subset: &[FactorIndex],
) -> SelectorResult<Vec<MergePair>> {
    let pool = if indices_subset.is_empty() {
        fts.active_indices()
    } else {
        for &index in indices_subset {
            if !fts.get(index)?.active {
                return Err(mst_factors::FactorError::Inactive(index).into());
            }
        }
        indices_subset.to_vec()
    };
    if pool.len() < 2 {
        return Err(SelectorError::NoCandidates {
            available: pool.len(),
        });
    }

    let mut candidates = Vec::with_capacity(pool.len() * (pool.len() - 1) / 2);
    for (i, &first) in pool.iter().enumerate() {
        for &second in &pool[i + 1..] {
            candidates.push(MergePair::of(first, second));
        }
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mst_factors::{FactorError, UniformTask};

    fn system(vars: usize) -> FactoredSystem {
        FactoredSystem::atomic(&UniformTask::new("t", vars, 2)).unwrap()
    }

    fn f(i: usize) -> FactorIndex {
        FactorIndex::new(i)
    }

    #[test]
    fn all_active_pairs_in_index_order() {
        let candidates = compute_merge_candidates(&system(3), &[]).unwrap();
        assert_eq!(
            candidates,
            vec![MergePair::new(0, 1), MergePair::new(0, 2), MergePair::new(1, 2)]
        );
    }

    #[test]
    fn skips_merged_factors() {
        let mut fts = system(3);
        fts.merge(MergePair::new(0, 1)).unwrap();
        let candidates = compute_merge_candidates(&fts, &[]).unwrap();
        assert_eq!(candidates, vec![MergePair::new(2, 3)]);
    }

    #[test]
    fn subset_order_is_kept() {
        let candidates = compute_merge_candidates(&system(4), &[f(3), f(1), f(2)]).unwrap();
        assert_eq!(
            candidates,
            vec![MergePair::new(3, 1), MergePair::new(3, 2), MergePair::new(1, 2)]
        );
    }

    #[test]
    fn subset_with_inactive_factor_is_rejected() {
        let mut fts = system(3);
        fts.merge(MergePair::new(0, 1)).unwrap();
        assert_eq!(
            compute_merge_candidates(&fts, &[f(0), f(2)]),
            Err(SelectorError::Factor(FactorError::Inactive(f(0))))
        );
    }

    #[test]
    fn single_factor_has_no_candidates() {
        let mut fts = system(2);
        fts.merge(MergePair::new(0, 1)).unwrap();
        assert_eq!(
            compute_merge_candidates(&fts, &[]),
            Err(SelectorError::NoCandidates { available: 1 })
        );
    }
}
