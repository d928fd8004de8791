//! Equation solving kernels: isolate one variable of one equation.
//!
//! Everything here works on a caller-owned [`cas_ast::Context`] and uses the
//! exact normal form from `cas_math`, so results are closed-form expressions
//! and never numeric approximations.

pub mod error;
pub mod function_inverse;
pub mod quadratic_formula;
pub mod solve;
pub mod solve_budget;
pub mod substitution;

pub use error::SolveError;
pub use solve::solve_for;
pub use solve_budget::SolveBudget;
pub use substitution::{substitute_in_equation, substitute_var};
