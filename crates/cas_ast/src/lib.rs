//! Expression representation shared by the parser, the algebra engine and
//! the equation-group equivalence checker.

pub mod display;
pub mod equation;
pub mod expression;
pub mod symbol;
pub mod traversal;

pub use display::DisplayExpr;
pub use equation::{DisplayEquation, Equation};
pub use expression::{Constant, Context, Expr, ExprId};
pub use symbol::{SymbolId, SymbolTable};
