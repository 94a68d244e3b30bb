use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown merge tree tie-break policy: {0}")]
    UnknownTieBreak(String),

    #[error("invalid factor index: {0}")]
    InvalidFactorIndex(String),

    #[error("merge pair must name two distinct factors, got {0} twice")]
    SelfMerge(usize),
}
