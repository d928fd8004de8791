//! Equations `lhs = rhs`.

use crate::display::DisplayExpr;
use crate::expression::{Context, Expr, ExprId};
use std::fmt;

/// An equation between two expressions of one [`Context`].
///
/// Equations are plain id pairs: transforming one (for example by
/// substitution) produces a new `Equation` and never touches the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Equation {
    pub lhs: ExprId,
    pub rhs: ExprId,
}

impl Equation {
    pub fn new(lhs: ExprId, rhs: ExprId) -> Self {
        Self { lhs, rhs }
    }

    /// `lhs - rhs`, the residual whose zeros are the equation's solutions.
    pub fn residual(&self, ctx: &mut Context) -> ExprId {
        ctx.add(Expr::Sub(self.lhs, self.rhs))
    }

    pub fn display<'a>(&self, ctx: &'a Context) -> DisplayEquation<'a> {
        DisplayEquation {
            context: ctx,
            equation: *self,
        }
    }
}

pub struct DisplayEquation<'a> {
    pub context: &'a Context,
    pub equation: Equation,
}

impl fmt::Display for DisplayEquation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {}",
            DisplayExpr {
                context: self.context,
                id: self.equation.lhs,
            },
            DisplayExpr {
                context: self.context,
                id: self.equation.rhs,
            }
        )
    }
}
