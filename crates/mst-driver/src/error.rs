use mst_factors::FactorError;
use mst_selector::SelectorError;
use mst_tree::TreeError;

/// Errors that can occur while configuring or running the driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The configuration file could not be read.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A selector name that is neither `tree` nor `smallest_first`.
    #[error("unknown merge selector: {0}")]
    UnknownSelector(String),

    /// The merge tree no longer describes the factors actually merged.
    #[error("merge tree out of sync: {0}")]
    TreeOutOfSync(String),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Factor(#[from] FactorError),

    #[error(transparent)]
    Selector(#[from] SelectorError),
}

impl PartialEq for DriverError {
    fn eq(&self, other: &Self) -> bool {
        // io::Error has no equality; compare rendered messages instead.
        self.to_string() == other.to_string()
    }
}

/// Result alias for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn equality_follows_message() {
        let a = DriverError::Io(io::Error::new(io::ErrorKind::NotFound, "mst.toml"));
        let b = DriverError::Io(io::Error::new(io::ErrorKind::Other, "mst.toml"));
        assert_eq!(a, b);
        assert_ne!(a, DriverError::Config("mst.toml".into()));
        assert_eq!(
            DriverError::from(TreeError::EmptyPlan),
            DriverError::Tree(TreeError::EmptyPlan)
        );
    }
}
