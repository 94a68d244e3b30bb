use tracing::{debug, info};

use mst_factors::{FactoredSystem, PlanningTask};
use mst_types::{FactorIndex, MergePair};

use crate::error::{SelectorError, SelectorResult};
use crate::selector::{compute_merge_candidates, MergeSelector};

/// Assigns a score to each candidate merge. Lower is better.
pub trait MergeScorer {
    fn name(&self) -> &str;

    /// One score per candidate, in candidate order.
    fn score(&self, fts: &FactoredSystem, candidates: &[MergePair]) -> Vec<f64>;

    fn initialize(&mut self, _task: &dyn PlanningTask) {}

    fn requires_init_distances(&self) -> bool {
        false
    }

    fn requires_goal_distances(&self) -> bool {
        false
    }
}

/// Prefers the pair whose product has the fewest abstract states.
#[derive(Clone, Copy, Debug, Default)]
pub struct SmallestProductScorer;

impl MergeScorer for SmallestProductScorer {
    fn name(&self) -> &str {
        "smallest product"
    }

    fn score(&self, fts: &FactoredSystem, candidates: &[MergePair]) -> Vec<f64> {
        let states = |index: FactorIndex| fts.get(index).map_or(u64::MAX, |factor| factor.num_states);
        candidates
            .iter()
            .map(|pair| states(pair.first).saturating_mul(states(pair.second)) as f64)
            .collect()
    }
}

/// Scores every candidate pair and picks the lowest score. Ties go to the
/// earliest candidate.
pub struct ScoreBasedSelector<S> {
    scorer: S,
}

impl<S: MergeScorer> ScoreBasedSelector<S> {
    pub fn new(scorer: S) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }
}

impl<S: MergeScorer> MergeSelector for ScoreBasedSelector<S> {
    fn name(&self) -> &str {
        "score based"
    }

    fn dump_specific_options(&self) {
        info!(scorer = self.scorer.name(), "score based options");
    }

    fn initialize(&mut self, task: &dyn PlanningTask) -> SelectorResult<()> {
        self.scorer.initialize(task);
        Ok(())
    }

    fn select_merge(
        &mut self,
        fts: &FactoredSystem,
        indices_subset: &[FactorIndex],
    ) -> SelectorResult<MergePair> {
        let candidates = compute_merge_candidates(fts, indices_subset)?;
        let scores = self.scorer.score(fts, &candidates);
        if scores.len() != candidates.len() {
            return Err(SelectorError::ScoreCount {
                scorer: self.scorer.name().to_string(),
                expected: candidates.len(),
                actual: scores.len(),
            });
        }

        let mut best = 0;
        for (i, score) in scores.iter().enumerate().skip(1) {
            if *score < scores[best] {
                best = i;
            }
        }
        let pair = candidates[best];
        debug!(
            %pair,
            score = scores[best],
            candidates = candidates.len(),
            "selected merge by score"
        );
        Ok(pair)
    }

    fn requires_init_distances(&self) -> bool {
        self.scorer.requires_init_distances()
    }

    fn requires_goal_distances(&self) -> bool {
        self.scorer.requires_goal_distances()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mst_factors::UniformTask;

    /// Scores from a fixed list, or a wrong-length list on demand.
    struct Fixed(Vec<f64>);

    impl MergeScorer for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn score(&self, _fts: &FactoredSystem, _candidates: &[MergePair]) -> Vec<f64> {
            self.0.clone()
        }

        fn requires_goal_distances(&self) -> bool {
            true
        }
    }

    fn system(vars: usize) -> FactoredSystem {
        FactoredSystem::atomic(&UniformTask::new("t", vars, 2)).unwrap()
    }

    #[test]
    fn lowest_score_wins_and_ties_go_first() {
        let fts = system(3);
        let mut selector = ScoreBasedSelector::new(Fixed(vec![2.0, 1.0, 1.0]));
        assert_eq!(selector.select_merge(&fts, &[]).unwrap(), MergePair::new(0, 2));
    }

    #[test]
    fn wrong_score_count_is_rejected() {
        let fts = system(3);
        let mut selector = ScoreBasedSelector::new(Fixed(vec![1.0]));
        assert_eq!(
            selector.select_merge(&fts, &[]),
            Err(SelectorError::ScoreCount {
                scorer: "fixed".into(),
                expected: 3,
                actual: 1
            })
        );
    }

    #[test]
    fn smallest_product_prefers_small_factors() {
        let mut fts = system(4);
        fts.merge(MergePair::new(0, 1)).unwrap();
        // Active: 2 (2 states), 3 (2 states), 4 (4 states).
        let mut selector = ScoreBasedSelector::new(SmallestProductScorer);
        assert_eq!(selector.select_merge(&fts, &[]).unwrap(), MergePair::new(2, 3));
    }

    #[test]
    fn respects_subset() {
        let fts = system(4);
        let mut selector = ScoreBasedSelector::new(SmallestProductScorer);
        let subset = [FactorIndex::new(3), FactorIndex::new(1)];
        assert_eq!(selector.select_merge(&fts, &subset).unwrap(), MergePair::new(3, 1));
    }

    #[test]
    fn forwards_distance_requirements() {
        let selector = ScoreBasedSelector::new(Fixed(Vec::new()));
        assert!(selector.requires_goal_distances());
        assert!(!selector.requires_init_distances());
        assert!(selector.merge_tree().is_none());
    }
}
