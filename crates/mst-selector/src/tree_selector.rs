use tracing::{debug, info};

use mst_factors::{FactoredSystem, PlanningTask};
use mst_tree::{MergeTree, MergeTreeBuilder, TreeShape};
use mst_types::{FactorIndex, MergePair, SharedRandom, TieBreakPolicy};

use crate::error::{SelectorError, SelectorResult};
use crate::selector::MergeSelector;

/// Follows a merge tree built over the task's variables at initialization.
///
/// Every selection consumes the next pending merge of the tree and labels
/// the new leaf with the index the factored system will assign next.
pub struct TreeSelector {
    shape: TreeShape,
    builder: MergeTreeBuilder,
    tree: Option<MergeTree>,
}

impl TreeSelector {
    pub fn new(shape: TreeShape, policy: TieBreakPolicy, rng: SharedRandom) -> Self {
        Self {
            shape,
            builder: MergeTreeBuilder::new(policy, rng),
            tree: None,
        }
    }

    pub fn shape(&self) -> TreeShape {
        self.shape
    }

    /// Mutable access to the tree, for reconciling merges chosen elsewhere.
    pub fn merge_tree_mut(&mut self) -> Option<&mut MergeTree> {
        self.tree.as_mut()
    }

    fn tree_mut(&mut self) -> SelectorResult<&mut MergeTree> {
        self.tree
            .as_mut()
            .ok_or_else(|| SelectorError::NotInitialized("merge tree".into()))
    }
}

impl MergeSelector for TreeSelector {
    fn name(&self) -> &str {
        "merge tree"
    }

    fn dump_specific_options(&self) {
        let policy = self.tree.as_ref().map(MergeTree::policy);
        info!(shape = %self.shape, policy = ?policy, "merge tree options");
    }

    fn initialize(&mut self, task: &dyn PlanningTask) -> SelectorResult<()> {
        let tree = self.builder.build(self.shape, 0..task.num_variables())?;
        debug!(
            task = task.name(),
            shape = %self.shape,
            leaves = tree.num_leaves(),
            "built merge tree"
        );
        self.tree = Some(tree);
        Ok(())
    }

    fn select_merge(
        &mut self,
        fts: &FactoredSystem,
        indices_subset: &[FactorIndex],
    ) -> SelectorResult<MergePair> {
        let new_index = fts.next_index();
        let tree = self.tree_mut()?;
        if !indices_subset.is_empty() {
            let pair = tree.peek_next_merge()?;
            if !indices_subset.contains(&pair.first) || !indices_subset.contains(&pair.second) {
                return Err(SelectorError::OutsideSubset { pair });
            }
        }
        Ok(tree.next_merge(new_index)?)
    }

    fn merge_tree(&self) -> Option<&MergeTree> {
        self.tree.as_ref()
    }
}
