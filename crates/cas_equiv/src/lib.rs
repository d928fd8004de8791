//! Equivalence of equation groups (DAE models) up to elimination of
//! private variables.
//!
//! Two groups are equivalent when, after substituting away the variables
//! that only one of them uses, their equations correspond one-to-one and
//! every pair states the same relation. All algebra goes through the
//! [`AlgebraEngine`] trait; [`CasEngine`] is the exact default.
//!
//! ```ignore
//! let mut ctx = Context::new();
//! let a = EquationGroup::new(&mut ctx, vec![/* parsed equations */])?;
//! let b = EquationGroup::new(&mut ctx, vec![/* ... */])?;
//! let verdict = Judge::default().check(&mut ctx, &a, &b);
//! ```

pub mod checker;
pub mod eliminate;
pub mod engine;
pub mod error;
pub mod group;
pub mod matcher;
pub mod options;
pub mod pairwise;
pub mod verdict;

pub use checker::Judge;
pub use eliminate::{eliminate, eliminate_step, Elimination};
pub use engine::{AlgebraEngine, CasEngine};
pub use error::{EngineError, EquivError};
pub use group::EquationGroup;
pub use matcher::{one_to_one, EquationMatcher, ExactMatcher, GreedyMatcher};
pub use options::{EngineLimits, EquivOptions, MatcherKind, TieBreak, UnknownOption};
pub use pairwise::equations_equivalent;
pub use verdict::{Verdict, VerdictReason};
