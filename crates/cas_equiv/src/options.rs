//! Tunables of an equivalence check.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use cas_math::PolyBudget;
use cas_solver_core::SolveBudget;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which bipartite matcher pairs up the final equation lists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    /// First-fit, no backtracking. May miss a perfect matching that only
    /// exists in another order.
    #[default]
    Greedy,
    /// Augmenting-path maximum matching.
    Exact,
}

/// How elimination picks the substitution source among the equations that
/// solve uniquely for a target variable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// First solvable equation in list order.
    #[default]
    FirstSolved,
    /// Smallest solution by node count; list order among equals.
    FewestNodes,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct UnknownOption {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

impl FromStr for MatcherKind {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(MatcherKind::Greedy),
            "exact" => Ok(MatcherKind::Exact),
            other => Err(UnknownOption {
                kind: "matcher",
                value: other.to_string(),
                expected: "greedy, exact",
            }),
        }
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatcherKind::Greedy => "greedy",
            MatcherKind::Exact => "exact",
        })
    }
}

impl FromStr for TieBreak {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "first-solved" => Ok(TieBreak::FirstSolved),
            "fewest-nodes" | "fewest" => Ok(TieBreak::FewestNodes),
            other => Err(UnknownOption {
                kind: "tie-break",
                value: other.to_string(),
                expected: "first, fewest-nodes",
            }),
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TieBreak::FirstSolved => "first-solved",
            TieBreak::FewestNodes => "fewest-nodes",
        })
    }
}

/// Size limits handed to the algebra engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineLimits {
    pub max_terms: usize,
    pub max_total_degree: u32,
    /// Nesting of function inversions while isolating a variable.
    pub max_solve_depth: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        let poly = PolyBudget::default();
        Self {
            max_terms: poly.max_terms,
            max_total_degree: poly.max_total_degree,
            max_solve_depth: SolveBudget::default().max_depth,
        }
    }
}

impl EngineLimits {
    pub fn solve_budget(&self) -> SolveBudget {
        SolveBudget {
            max_depth: self.max_solve_depth,
            poly: PolyBudget {
                max_terms: self.max_terms,
                max_total_degree: self.max_total_degree,
                deadline: None,
            },
        }
    }
}

/// Options of one [`Judge`](crate::Judge).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquivOptions {
    pub matcher: MatcherKind,
    pub tie_break: TieBreak,
    /// Upper bound on eliminate-and-compare rounds.
    pub max_rounds: usize,
    /// Wall-clock limit per comparison, `None` for unlimited.
    pub timeout_ms: Option<u64>,
    pub poly_budget: EngineLimits,
}

impl Default for EquivOptions {
    fn default() -> Self {
        Self {
            matcher: MatcherKind::Greedy,
            tie_break: TieBreak::FirstSolved,
            max_rounds: 64,
            timeout_ms: None,
            poly_budget: EngineLimits::default(),
        }
    }
}

impl EquivOptions {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
