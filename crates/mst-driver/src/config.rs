use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use mst_tree::TreeShape;
use mst_types::TieBreakPolicy;

use crate::error::{DriverError, DriverResult};

/// Seed used when the configuration does not name one.
pub const DEFAULT_SEED: u64 = 2016;

/// Which selector chooses the merges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorKind {
    /// Follow the merge tree's own plan.
    #[default]
    Tree,
    /// Merge the pair with the smallest product; the tree only tracks.
    SmallestFirst,
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree => write!(f, "tree"),
            Self::SmallestFirst => write!(f, "smallest_first"),
        }
    }
}

impl FromStr for SelectorKind {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "tree" => Ok(Self::Tree),
            "smallest_first" => Ok(Self::SmallestFirst),
            _ => Err(DriverError::UnknownSelector(s.to_string())),
        }
    }
}

/// Driver configuration, usually read from a TOML file.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    /// Which parent survives a diverging merge.
    pub tie_break: TieBreakPolicy,
    /// Seed of the run-wide random stream.
    pub seed: u64,
    /// Shape of the initial merge tree.
    pub tree_shape: TreeShape,
    pub selector: SelectorKind,
    /// Log the merge tree after every step.
    pub dump_tree: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tie_break: TieBreakPolicy::default(),
            seed: DEFAULT_SEED,
            tree_shape: TreeShape::default(),
            selector: SelectorKind::default(),
            dump_tree: false,
        }
    }
}

impl DriverConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> DriverResult<Self> {
        toml::from_str(text).map_err(|e| DriverError::Config(e.to_string()))
    }

    /// Read and parse a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> DriverResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> DriverResult<String> {
        toml::to_string(self).map_err(|e| DriverError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = DriverConfig::default();
        assert_eq!(c.tie_break, TieBreakPolicy::UseRandom);
        assert_eq!(c.seed, 2016);
        assert_eq!(c.tree_shape, TreeShape::Linear);
        assert_eq!(c.selector, SelectorKind::Tree);
        assert!(!c.dump_tree);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(DriverConfig::from_toml_str("").unwrap(), DriverConfig::default());
    }

    #[test]
    fn parses_all_fields_and_aliases() {
        let c = DriverConfig::from_toml_str(
            r#"
            tie_break = "keep_second"
            seed = 7
            tree_shape = "balanced"
            selector = "smallest_first"
            dump_tree = true
            "#,
        )
        .unwrap();
        assert_eq!(c.tie_break, TieBreakPolicy::UseSecond);
        assert_eq!(c.seed, 7);
        assert_eq!(c.tree_shape, TreeShape::Balanced);
        assert_eq!(c.selector, SelectorKind::SmallestFirst);
        assert!(c.dump_tree);
    }

    #[test]
    fn unknown_tie_break_is_an_error() {
        let err = DriverConfig::from_toml_str(r#"tie_break = "keep_both""#).unwrap_err();
        assert!(matches!(err, DriverError::Config(_)));
        assert!(err.to_string().contains("keep_both"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = DriverConfig::from_toml_str("sed = 3").unwrap_err();
        assert!(matches!(err, DriverError::Config(_)));
    }

    #[test]
    fn reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "seed = 99\ntie_break = \"first\"").unwrap();
        let c = DriverConfig::from_file(file.path()).unwrap();
        assert_eq!(c.seed, 99);
        assert_eq!(c.tie_break, TieBreakPolicy::UseFirst);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DriverConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, DriverError::Io(_)));
    }

    #[test]
    fn toml_roundtrip() {
        let c = DriverConfig {
            seed: 3,
            selector: SelectorKind::SmallestFirst,
            ..Default::default()
        };
        let text = c.to_toml_string().unwrap();
        assert_eq!(DriverConfig::from_toml_str(&text).unwrap(), c);
    }

    #[test]
    fn selector_kind_parses() {
        assert_eq!("smallest-first".parse::<SelectorKind>(), Ok(SelectorKind::SmallestFirst));
        assert_eq!(SelectorKind::Tree.to_string(), "tree");
        assert_eq!(
            "greedy".parse::<SelectorKind>(),
            Err(DriverError::UnknownSelector("greedy".into()))
        );
    }
}
