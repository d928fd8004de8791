//! The outcome of comparing two equation groups.

use std::fmt;

use serde::Serialize;

/// Why a comparison ended the way it did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictReason {
    /// Variable sets coincide and every equation found a partner.
    Matched,
    /// Variable sets coincide but some equation has no partner.
    Unmatched,
    /// Variable sets coincide but the groups have different sizes.
    CountMismatch,
    /// Private variables remain that no substitution can remove.
    IncompatibleVariables,
    /// Targets remain but neither group could eliminate any of them.
    Stagnated,
    RoundLimit,
    DeadlineExceeded,
}

impl VerdictReason {
    pub fn describe(self) -> &'static str {
        match self {
            VerdictReason::Matched => "equations correspond one-to-one",
            VerdictReason::Unmatched => "some equation has no equivalent partner",
            VerdictReason::CountMismatch => "groups have different numbers of equations",
            VerdictReason::IncompatibleVariables => {
                "groups have different variables but cannot unify them"
            }
            VerdictReason::Stagnated => "could not reduce the number of equations",
            VerdictReason::RoundLimit => "round limit reached",
            VerdictReason::DeadlineExceeded => "deadline exceeded",
        }
    }
}

impl fmt::Display for VerdictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub equivalent: bool,
    pub reason: VerdictReason,
    /// Eliminate-and-compare rounds entered.
    pub rounds: usize,
    /// Names of the variables eliminated from each group, in order.
    pub eliminated_a: Vec<String>,
    pub eliminated_b: Vec<String>,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = if self.equivalent {
            "equivalent"
        } else {
            "not equivalent"
        };
        write!(f, "{word} ({})", self.reason)
    }
}
