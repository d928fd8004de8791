//! Exact algebra over opaque atoms.
//!
//! Expressions are mapped to rational functions `num / den` whose
//! polynomials have rational coefficients and whose variables are
//! [`atoms`]: symbols, constants, function calls and non-integer powers.
//! Two expressions are equal when their forms cross-multiply to the same
//! polynomial.

pub mod atoms;
pub mod error;
pub mod multipoly;
pub mod normal_form;
pub mod rational_form;

pub use atoms::{Atom, AtomId, AtomKind, AtomTable};
pub use error::PolyError;
pub use multipoly::{MultiPoly, PolyBudget};
pub use normal_form::{
    exprs_equal, free_symbols, is_identically_one, is_identically_zero, simplify, Normalizer,
};
pub use rational_form::RationalForm;
