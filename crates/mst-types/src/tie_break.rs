use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::rng::RandomSource;

/// Which located parent keeps its subtree when a realized merge does not
/// match the pairing planned by the merge tree.
///
/// "First" and "second" refer to discovery order of the parent lookup, which
/// is a pre-order, left-before-right walk from the root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakPolicy {
    /// Always keep the first-discovered parent.
    #[serde(alias = "keep_first", alias = "first")]
    UseFirst,
    /// Always keep the second-discovered parent.
    #[serde(alias = "keep_second", alias = "second")]
    UseSecond,
    /// Flip a fair coin drawn from the run's seeded random source.
    #[default]
    #[serde(alias = "keep_random", alias = "random")]
    UseRandom,
}

impl TieBreakPolicy {
    /// All policies, in declaration order.
    pub const ALL: [TieBreakPolicy; 3] = [Self::UseFirst, Self::UseSecond, Self::UseRandom];

    /// Resolve the policy into a concrete choice.
    ///
    /// Only [`TieBreakPolicy::UseRandom`] consumes a draw, so deterministic
    /// policies leave the shared random stream untouched.
    pub fn choose(self, rng: &mut dyn RandomSource) -> KeptParent {
        match self {
            Self::UseFirst => KeptParent::First,
            Self::UseSecond => KeptParent::Second,
            Self::UseRandom => {
                if rng.draw(2) == 0 {
                    KeptParent::First
                } else {
                    KeptParent::Second
                }
            }
        }
    }

    /// Canonical configuration name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UseFirst => "use_first",
            Self::UseSecond => "use_second",
            Self::UseRandom => "use_random",
        }
    }
}

impl fmt::Display for TieBreakPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TieBreakPolicy {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "use_first" | "keep_first" | "first" => Ok(Self::UseFirst),
            "use_second" | "keep_second" | "second" => Ok(Self::UseSecond),
            "use_random" | "keep_random" | "random" => Ok(Self::UseRandom),
            _ => Err(TypeError::UnknownTieBreak(s.to_string())),
        }
    }
}

/// Outcome of a tie-break: which of the two located parents survives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeptParent {
    First,
    Second,
}

impl fmt::Display for KeptParent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => write!(f, "first"),
            Self::Second => write!(f, "second"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SeededRng;

    /// Random source that replays a fixed script and counts draws.
    struct Scripted {
        values: Vec<usize>,
        draws: usize,
    }

    impl RandomSource for Scripted {
        fn draw(&mut self, bound: usize) -> usize {
            let v = self.values[self.draws % self.values.len()] % bound;
            self.draws += 1;
            v
        }
    }

    #[test]
    fn deterministic_policies_never_draw() {
        let mut rng = Scripted { values: vec![1], draws: 0 };
        assert_eq!(TieBreakPolicy::UseFirst.choose(&mut rng), KeptParent::First);
        assert_eq!(TieBreakPolicy::UseSecond.choose(&mut rng), KeptParent::Second);
        assert_eq!(rng.draws, 0);
    }

    #[test]
    fn random_policy_maps_zero_to_first() {
        let mut rng = Scripted { values: vec![0, 1], draws: 0 };
        assert_eq!(TieBreakPolicy::UseRandom.choose(&mut rng), KeptParent::First);
        assert_eq!(TieBreakPolicy::UseRandom.choose(&mut rng), KeptParent::Second);
        assert_eq!(rng.draws, 2);
    }

    #[test]
    fn random_policy_is_reproducible_per_seed() {
        let run = |seed| {
            let mut rng = SeededRng::new(seed);
            (0..32)
                .map(|_| TieBreakPolicy::UseRandom.choose(&mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn parses_all_aliases() {
        for (name, expected) in [
            ("use_first", TieBreakPolicy::UseFirst),
            ("keep-first", TieBreakPolicy::UseFirst),
            ("SECOND", TieBreakPolicy::UseSecond),
            ("keep_random", TieBreakPolicy::UseRandom),
        ] {
            assert_eq!(name.parse::<TieBreakPolicy>().unwrap(), expected);
        }
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = "use_third".parse::<TieBreakPolicy>().unwrap_err();
        assert_eq!(err, TypeError::UnknownTieBreak("use_third".into()));
    }

    #[test]
    fn display_roundtrips_through_from_str() {
        for policy in TieBreakPolicy::ALL {
            assert_eq!(policy.to_string().parse::<TieBreakPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn serde_accepts_aliases() {
        let policy: TieBreakPolicy = serde_json::from_str(r#""keep_second""#).unwrap();
        assert_eq!(policy, TieBreakPolicy::UseSecond);
        assert_eq!(
            serde_json::to_string(&TieBreakPolicy::UseRandom).unwrap(),
            r#""use_random""#
        );
    }
}
