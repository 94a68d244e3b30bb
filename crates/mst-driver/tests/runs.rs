//! End-to-end merge runs over synthetic tasks.

use proptest::prelude::*;

use mst_driver::{DriverConfig, DriverError, MergeDriver, SelectorKind, StepKind};
use mst_factors::{FactoredSystem, PlanningTask, UniformTask};
use mst_selector::{MergeSelector, SelectorError, SelectorResult};
use mst_tree::TreeShape;
use mst_types::{FactorIndex, MergePair, TieBreakPolicy};

/// Task whose variables have different domain sizes.
struct Skewed {
    sizes: Vec<usize>,
}

impl PlanningTask for Skewed {
    fn name(&self) -> &str {
        "skewed"
    }

    fn num_variables(&self) -> usize {
        self.sizes.len()
    }

    fn domain_size(&self, var: usize) -> usize {
        self.sizes[var]
    }
}

/// Always merges the two newest active factors.
struct NewestFirst;

impl MergeSelector for NewestFirst {
    fn name(&self) -> &str {
        "newest first"
    }

    fn initialize(&mut self, _task: &dyn PlanningTask) -> SelectorResult<()> {
        Ok(())
    }

    fn select_merge(
        &mut self,
        fts: &FactoredSystem,
        _indices_subset: &[FactorIndex],
    ) -> SelectorResult<MergePair> {
        let active = fts.active_indices();
        match active.as_slice() {
            [.., a, b] => Ok(MergePair::of(*a, *b)),
            _ => Err(SelectorError::NoCandidates {
                available: active.len(),
            }),
        }
    }

    fn requires_init_distances(&self) -> bool {
        true
    }
}

fn config(selector: SelectorKind, shape: TreeShape, tie_break: TieBreakPolicy, seed: u64) -> DriverConfig {
    DriverConfig {
        tie_break,
        seed,
        tree_shape: shape,
        selector,
        dump_tree: false,
    }
}

#[test]
fn smallest_first_merges_small_factors_early() {
    let task = Skewed {
        sizes: vec![10, 2, 3, 10],
    };
    let driver = MergeDriver::new(config(
        SelectorKind::SmallestFirst,
        TreeShape::Balanced,
        TieBreakPolicy::UseSecond,
        1,
    ));
    let run = driver.run(&task).unwrap();
    assert_eq!(run.steps[0].pair, MergePair::new(1, 2));
    assert_eq!(run.final_factor, FactorIndex::new(6));
    // Balanced plan pairs (0,1) and (2,3); merging 1-2 first diverges.
    assert!(matches!(run.steps[0].kind, StepKind::Restructure { .. }));
    assert!(run.divergences >= 1);
}

#[test]
fn custom_selector_is_tracked_by_configured_tree() {
    let driver = MergeDriver::new(config(
        SelectorKind::Tree,
        TreeShape::Linear,
        TieBreakPolicy::UseRandom,
        2016,
    ));
    let mut selector = NewestFirst;
    let run = driver.run_with(&UniformTask::new("t", 5, 2), &mut selector).unwrap();
    assert_eq!(run.selector, "newest first");
    assert_eq!(run.steps.len(), 4);
    assert_eq!(run.steps[0].pair, MergePair::new(3, 4));
    assert_eq!(run.final_factor, FactorIndex::new(8));
    assert!(run.requires_init_distances);
    assert!(!run.requires_goal_distances);
}

#[test]
fn tree_selector_runs_are_never_divergent() {
    for shape in [TreeShape::Linear, TreeShape::Balanced] {
        let driver = MergeDriver::new(config(SelectorKind::Tree, shape, TieBreakPolicy::UseRandom, 4));
        let run = driver.run(&UniformTask::new("t", 9, 3)).unwrap();
        assert_eq!(run.divergences, 0);
        assert_eq!(run.final_factor, FactorIndex::new(16));
    }
}

#[test]
fn config_file_drives_a_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mst.toml");
    std::fs::write(&path, "selector = \"smallest_first\"\ntie_break = \"keep_random\"\nseed = 11\n").unwrap();

    let config = DriverConfig::from_file(&path).unwrap();
    let run = MergeDriver::new(config).run(&UniformTask::new("t", 6, 2)).unwrap();
    assert_eq!(run.steps.len(), 5);
    assert_eq!(run.final_factor, FactorIndex::new(10));
}

#[test]
fn bad_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mst.toml");
    std::fs::write(&path, "tie_break = \"keep_both\"\n").unwrap();
    assert!(matches!(DriverConfig::from_file(&path), Err(DriverError::Config(_))));
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn same_seed_same_run(
        sizes in prop::collection::vec(1usize..6, 2..12),
        seed in any::<u64>(),
        balanced in any::<bool>(),
    ) {
        let shape = if balanced { TreeShape::Balanced } else { TreeShape::Linear };
        let task = Skewed { sizes };
        let driver = MergeDriver::new(config(
            SelectorKind::SmallestFirst,
            shape,
            TieBreakPolicy::UseRandom,
            seed,
        ));
        let first = driver.run(&task).unwrap();
        let second = driver.run(&task).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.steps.len(), task.num_variables() - 1);
        prop_assert_eq!(first.final_factor, FactorIndex::new(2 * task.num_variables() - 2));
    }
}
