//! Plain-text display of expressions.
//!
//! Expressions recurse through ids, so they can only be printed together with
//! their [`Context`]; [`DisplayExpr`] bundles the two.

use crate::{Context, Expr, ExprId};
use num_traits::Signed;
use std::fmt;

pub struct DisplayExpr<'a> {
    pub context: &'a Context,
    pub id: ExprId,
}

const PREC_ADD: u8 = 1;
const PREC_MUL: u8 = 2;
const PREC_NEG: u8 = 3;
const PREC_POW: u8 = 4;
const PREC_ATOM: u8 = 5;

fn precedence(ctx: &Context, id: ExprId) -> u8 {
    match ctx.get(id) {
        Expr::Add(_, _) | Expr::Sub(_, _) => PREC_ADD,
        Expr::Mul(_, _) | Expr::Div(_, _) => PREC_MUL,
        Expr::Neg(_) => PREC_NEG,
        Expr::Pow(_, _) => PREC_POW,
        Expr::Number(n) if n.is_negative() => PREC_NEG,
        Expr::Number(n) if !n.is_integer() => PREC_MUL,
        Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) | Expr::Function(_, _) => {
            PREC_ATOM
        }
    }
}

impl DisplayExpr<'_> {
    fn child(&self, id: ExprId) -> DisplayExpr<'_> {
        DisplayExpr {
            context: self.context,
            id,
        }
    }

    /// Write `id`, parenthesised when its precedence is below `min`.
    fn write_operand(&self, f: &mut fmt::Formatter<'_>, id: ExprId, min: u8) -> fmt::Result {
        if precedence(self.context, id) < min {
            write!(f, "({})", self.child(id))
        } else {
            write!(f, "{}", self.child(id))
        }
    }
}

impl fmt::Display for DisplayExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.context;
        match ctx.get(self.id) {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Constant(c) => write!(f, "{}", c.name()),
            Expr::Variable(sym) => write!(f, "{}", ctx.sym_name(*sym)),
            Expr::Add(l, r) => {
                self.write_operand(f, *l, PREC_ADD)?;
                write!(f, " + ")?;
                self.write_operand(f, *r, PREC_ADD)
            }
            Expr::Sub(l, r) => {
                self.write_operand(f, *l, PREC_ADD)?;
                write!(f, " - ")?;
                // a - (b - c) keeps its parentheses
                self.write_operand(f, *r, PREC_ADD + 1)
            }
            Expr::Mul(l, r) => {
                self.write_operand(f, *l, PREC_MUL)?;
                write!(f, " * ")?;
                self.write_operand(f, *r, PREC_MUL)
            }
            Expr::Div(l, r) => {
                self.write_operand(f, *l, PREC_MUL)?;
                write!(f, " / ")?;
                self.write_operand(f, *r, PREC_MUL + 1)
            }
            Expr::Pow(b, e) => {
                // right-associative: (a^b)^c needs parentheses on the base
                self.write_operand(f, *b, PREC_POW + 1)?;
                write!(f, "^")?;
                self.write_operand(f, *e, PREC_ATOM)
            }
            Expr::Neg(e) => {
                write!(f, "-")?;
                self.write_operand(f, *e, PREC_POW)
            }
            Expr::Function(name, args) => {
                write!(f, "{}(", ctx.sym_name(*name))?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", self.child(*arg))?;
                }
                write!(f, ")")
            }
        }
    }
}
