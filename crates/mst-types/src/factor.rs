use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Index of a factor in the factored transition system.
///
/// Indices are handed out by the factored system and are never reused: a
/// merge retires both operands and produces a fresh index for the composite.
/// The merge tree stores nothing else about a factor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactorIndex(usize);

impl FactorIndex {
    /// Wrap a raw index.
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// The raw index.
    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Debug for FactorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}

impl fmt::Display for FactorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for FactorIndex {
    fn from(raw: usize) -> Self {
        Self(raw)
    }
}

impl From<FactorIndex> for usize {
    fn from(index: FactorIndex) -> Self {
        index.0
    }
}

impl FromStr for FactorIndex {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<usize>()
            .map(Self)
            .map_err(|_| TypeError::InvalidFactorIndex(s.to_string()))
    }
}

/// Two factors that are (or were) merged together.
///
/// The order is meaningful: it is the left-then-right order in which the
/// merge tree reports a planned merge, and the order the driver passes the
/// operands to the factored system.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergePair {
    pub first: FactorIndex,
    pub second: FactorIndex,
}

impl MergePair {
    /// Create a pair from two raw indices.
    pub const fn new(first: usize, second: usize) -> Self {
        Self {
            first: FactorIndex(first),
            second: FactorIndex(second),
        }
    }

    /// Create a pair from two factor indices.
    pub const fn of(first: FactorIndex, second: FactorIndex) -> Self {
        Self { first, second }
    }

    /// Reject a factor merged with itself.
    pub fn checked(self) -> Result<Self, TypeError> {
        if self.first == self.second {
            return Err(TypeError::SelfMerge(self.first.get()));
        }
        Ok(self)
    }

    /// Returns `true` if `index` is one of the two operands.
    pub fn contains(&self, index: FactorIndex) -> bool {
        self.first == index || self.second == index
    }

    /// The same pair with the operands swapped.
    pub fn swapped(&self) -> Self {
        Self {
            first: self.second,
            second: self.first,
        }
    }

    /// Returns `true` if both pairs name the same two factors, in any order.
    pub fn same_factors(&self, other: &Self) -> bool {
        self == other || *self == other.swapped()
    }
}

impl fmt::Debug for MergePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}, {:?})", self.first, self.second)
    }
}

impl fmt::Display for MergePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

impl From<(usize, usize)> for MergePair {
    fn from((first, second): (usize, usize)) -> Self {
        Self::new(first, second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_index_parses_and_displays() {
        let idx: FactorIndex = " 17 ".parse().unwrap();
        assert_eq!(idx.get(), 17);
        assert_eq!(format!("{idx}"), "17");
        assert_eq!(format!("{idx:?}"), "F17");
    }

    #[test]
    fn factor_index_rejects_garbage() {
        let err = "x1".parse::<FactorIndex>().unwrap_err();
        assert_eq!(err, TypeError::InvalidFactorIndex("x1".into()));
    }

    #[test]
    fn pair_contains_both_operands() {
        let pair = MergePair::new(3, 8);
        assert!(pair.contains(FactorIndex::new(3)));
        assert!(pair.contains(FactorIndex::new(8)));
        assert!(!pair.contains(FactorIndex::new(4)));
    }

    #[test]
    fn checked_pair_rejects_self_merge() {
        assert_eq!(MergePair::new(2, 2).checked(), Err(TypeError::SelfMerge(2)));
        assert!(MergePair::new(2, 5).checked().is_ok());
    }

    #[test]
    fn same_factors_ignores_order() {
        let pair = MergePair::new(1, 2);
        assert!(pair.same_factors(&MergePair::new(2, 1)));
        assert!(!pair.same_factors(&MergePair::new(1, 3)));
        assert_ne!(pair, pair.swapped());
    }

    #[test]
    fn serde_is_transparent_for_indices() {
        let pair = MergePair::new(0, 4);
        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(json, r#"{"first":0,"second":4}"#);
        let parsed: MergePair = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, pair);
    }
}
