use mst_factors::FactorError;
use mst_tree::TreeError;
use mst_types::MergePair;

/// Errors from merge selection.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SelectorError {
    /// `select_merge` was called before `initialize`.
    #[error("merge selector {0} used before initialization")]
    NotInitialized(String),

    /// Fewer than two factors are available to merge.
    #[error("no merge candidates: {available} factor(s) available")]
    NoCandidates { available: usize },

    /// The planned merge is not within the requested subset.
    #[error("planned merge {pair} lies outside the requested factor subset")]
    OutsideSubset { pair: MergePair },

    /// A scorer returned the wrong number of scores.
    #[error("scorer {scorer} returned {actual} scores for {expected} candidates")]
    ScoreCount {
        scorer: String,
        expected: usize,
        actual: usize,
    },

    #[error("merge tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("factor error: {0}")]
    Factor(#[from] FactorError),
}

/// Result alias for merge selection.
pub type SelectorResult<T> = Result<T, SelectorError>;
