use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use mst_factors::{FactoredSystem, PlanningTask};
use mst_selector::{MergeSelector, ScoreBasedSelector, SmallestProductScorer, TreeSelector};
use mst_tree::{MergeTree, MergeTreeBuilder, ReconcileKind};
use mst_types::{FactorIndex, KeptParent, MergePair, SeededRng, SharedRandom};

use crate::config::{DriverConfig, SelectorKind};
use crate::error::{DriverError, DriverResult};

// ---------------------------------------------------------------------------
// Run history
// ---------------------------------------------------------------------------

/// How the merge tree absorbed one merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// The selector followed the tree's own plan.
    Planned,
    /// A merge chosen elsewhere matched a pending merge of the tree.
    DirectMerge,
    /// A merge chosen elsewhere diverged and the tree was restructured.
    Restructure { kept: KeptParent },
}

/// One realized merge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStep {
    pub step: usize,
    pub pair: MergePair,
    pub new_index: FactorIndex,
    pub kind: StepKind,
}

/// Everything a completed run did, in order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRun {
    pub task: String,
    pub selector: String,
    pub steps: Vec<MergeStep>,
    /// Index of the single factor left at the end.
    pub final_factor: FactorIndex,
    /// Number of merges that forced a restructuring of the tree.
    pub divergences: usize,
    pub requires_init_distances: bool,
    pub requires_goal_distances: bool,
}

impl MergeRun {
    /// The realized merges, in order.
    pub fn merge_order(&self) -> Vec<MergePair> {
        self.steps.iter().map(|step| step.pair).collect()
    }
}

// ---------------------------------------------------------------------------
// MergeDriver
// ---------------------------------------------------------------------------

/// Runs merge-and-shrink merges until one factor remains, keeping a merge
/// tree in step with every realized merge.
///
/// A selector that owns a merge tree is trusted to advance it itself. For
/// any other selector the driver builds a tracking tree from the
/// configuration and reconciles it after each merge.
pub struct MergeDriver {
    config: DriverConfig,
}

impl MergeDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Run with the selector named by the configuration.
    pub fn run(&self, task: &dyn PlanningTask) -> DriverResult<MergeRun> {
        let rng = self.fresh_rng();
        match self.config.selector {
            SelectorKind::Tree => {
                let mut selector = TreeSelector::new(
                    self.config.tree_shape,
                    self.config.tie_break,
                    SharedRandom::clone(&rng),
                );
                self.drive(task, &mut selector, rng)
            }
            SelectorKind::SmallestFirst => {
                let mut selector = ScoreBasedSelector::new(SmallestProductScorer);
                self.drive(task, &mut selector, rng)
            }
        }
    }

    /// Run with a caller-provided selector.
    pub fn run_with(
        &self,
        task: &dyn PlanningTask,
        selector: &mut dyn MergeSelector,
    ) -> DriverResult<MergeRun> {
        self.drive(task, selector, self.fresh_rng())
    }

    /// Every run starts its random stream from the configured seed.
    fn fresh_rng(&self) -> SharedRandom {
        SeededRng::shared(self.config.seed)
    }

    fn drive(
        &self,
        task: &dyn PlanningTask,
        selector: &mut dyn MergeSelector,
        rng: SharedRandom,
    ) -> DriverResult<MergeRun> {
        let mut fts = FactoredSystem::atomic(task)?;
        selector.initialize(task)?;
        selector.dump_options();

        let mut tracking = match selector.merge_tree() {
            Some(_) => None,
            None => Some(
                MergeTreeBuilder::new(self.config.tie_break, rng)
                    .build(self.config.tree_shape, 0..task.num_variables())?,
            ),
        };
        info!(
            task = task.name(),
            factors = fts.num_active(),
            selector = selector.name(),
            tie_break = %self.config.tie_break,
            seed = self.config.seed,
            "starting merge run"
        );

        let mut steps = Vec::with_capacity(fts.num_active().saturating_sub(1));
        let mut divergences = 0;
        while !fts.is_finished() {
            let expected = fts.next_index();
            let pair = selector.select_merge(&fts, &[])?;
            let new_index = fts.merge(pair)?;
            if new_index != expected {
                return Err(DriverError::TreeOutOfSync(format!(
                    "merge {pair} produced factor {new_index}, tree was told {expected}"
                )));
            }

            let kind = match tracking.as_mut() {
                None => StepKind::Planned,
                Some(tree) => match tree.reconcile(pair, new_index)?.kind {
                    ReconcileKind::DirectMerge => StepKind::DirectMerge,
                    ReconcileKind::Restructure { kept } => {
                        divergences += 1;
                        debug!(%pair, %kept, "merge diverged from the tree's plan");
                        StepKind::Restructure { kept }
                    }
                },
            };
            let step = MergeStep {
                step: steps.len(),
                pair,
                new_index,
                kind,
            };
            debug!(step = step.step, %pair, %new_index, kind = ?kind, "merge step");

            if self.config.dump_tree {
                if let Some(tree) = tracking.as_ref().or(selector.merge_tree()) {
                    info!(step = step.step, "\n{}", tree.dump(2));
                }
            }
            steps.push(step);
        }

        let final_factor = fts
            .active_indices()
            .first()
            .copied()
            .ok_or_else(|| DriverError::TreeOutOfSync("no factor left".into()))?;
        let tree = tracking.as_ref().or(selector.merge_tree());
        check_collapsed(tree, final_factor)?;

        info!(
            merges = steps.len(),
            divergences,
            final_factor = %final_factor,
            "merge run finished"
        );
        Ok(MergeRun {
            task: task.name().to_string(),
            selector: selector.name().to_string(),
            steps,
            final_factor,
            divergences,
            requires_init_distances: selector.requires_init_distances(),
            requires_goal_distances: selector.requires_goal_distances(),
        })
    }
}

/// The tree must have collapsed onto the factor that is left.
fn check_collapsed(tree: Option<&MergeTree>, final_factor: FactorIndex) -> DriverResult<()> {
    let Some(tree) = tree else {
        return Err(DriverError::TreeOutOfSync("no merge tree to check".into()));
    };
    match tree.root_index() {
        Some(root) if root == final_factor => Ok(()),
        Some(root) => Err(DriverError::TreeOutOfSync(format!(
            "tree collapsed to {root}, factored system to {final_factor}"
        ))),
        None => Err(DriverError::TreeOutOfSync(format!(
            "{} merge(s) still pending after the last factor {final_factor}",
            tree.num_internal_nodes()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mst_factors::UniformTask;
    use mst_tree::TreeShape;
    use mst_types::TieBreakPolicy;

    fn config(selector: SelectorKind, shape: TreeShape) -> DriverConfig {
        DriverConfig {
            tie_break: TieBreakPolicy::UseFirst,
            tree_shape: shape,
            selector,
            ..Default::default()
        }
    }

    #[test]
    fn tree_selector_follows_plan() {
        let driver = MergeDriver::new(config(SelectorKind::Tree, TreeShape::Balanced));
        let run = driver.run(&UniformTask::new("t", 4, 2)).unwrap();
        assert_eq!(
            run.merge_order(),
            vec![MergePair::new(0, 1), MergePair::new(2, 3), MergePair::new(4, 5)]
        );
        assert!(run.steps.iter().all(|s| s.kind == StepKind::Planned));
        assert_eq!(run.final_factor, FactorIndex::new(6));
        assert_eq!(run.divergences, 0);
        assert_eq!(run.selector, "merge tree");
    }

    #[test]
    fn score_selector_reconciles_tracking_tree() {
        // Linear plan ((0,1),2),3 while the scorer merges 0-1, then 2-3.
        let driver = MergeDriver::new(config(SelectorKind::SmallestFirst, TreeShape::Linear));
        let run = driver.run(&UniformTask::new("t", 4, 2)).unwrap();
        assert_eq!(run.steps[0].kind, StepKind::DirectMerge);
        assert_eq!(run.steps[1].pair, MergePair::new(2, 3));
        assert!(matches!(run.steps[1].kind, StepKind::Restructure { .. }));
        assert_eq!(run.divergences, 1);
        assert_eq!(run.final_factor, FactorIndex::new(6));
    }

    #[test]
    fn single_variable_needs_no_merge() {
        let driver = MergeDriver::new(DriverConfig::default());
        let run = driver.run(&UniformTask::new("one", 1, 5)).unwrap();
        assert!(run.steps.is_empty());
        assert_eq!(run.final_factor, FactorIndex::new(0));
    }

    #[test]
    fn empty_task_fails() {
        let driver = MergeDriver::new(DriverConfig::default());
        let err = driver.run(&UniformTask::new("none", 0, 2)).unwrap_err();
        assert!(matches!(err, DriverError::Factor(_)));
    }

    #[test]
    fn collapse_check_reports_pending_merges() {
        let tree = MergeTreeBuilder::new(TieBreakPolicy::UseFirst, SeededRng::shared(0))
            .linear([0, 1])
            .unwrap();
        let err = check_collapsed(Some(&tree), FactorIndex::new(2)).unwrap_err();
        assert!(matches!(err, DriverError::TreeOutOfSync(_)));
        assert!(check_collapsed(None, FactorIndex::new(0)).is_err());
    }

    #[test]
    fn run_serializes_to_json() {
        let driver = MergeDriver::new(config(SelectorKind::SmallestFirst, TreeShape::Linear));
        let run = driver.run(&UniformTask::new("t", 3, 2)).unwrap();
        let json = serde_json::to_string(&run).unwrap();
        let parsed: MergeRun = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, run);
    }
}
