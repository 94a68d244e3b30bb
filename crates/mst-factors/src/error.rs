use mst_types::FactorIndex;

/// Errors from factored system operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FactorError {
    /// The index was never handed out.
    #[error("unknown factor: {0}")]
    UnknownFactor(FactorIndex),

    /// The factor was already merged into a composite.
    #[error("factor {0} is no longer active")]
    Inactive(FactorIndex),

    /// Both operands of a merge are the same factor.
    #[error("cannot merge factor {0} with itself")]
    SelfMerge(FactorIndex),

    /// The task has no variables, so there is nothing to merge.
    #[error("planning task has no variables")]
    EmptyTask,
}

/// Result alias for factored system operations.
pub type FactorResult<T> = Result<T, FactorError>;
