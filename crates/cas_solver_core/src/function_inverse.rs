use cas_ast::{Constant, Context, Expr, ExprId};

/// Unary functions that the isolator knows how to undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryInverseKind {
    Ln,
    Exp,
    Sin,
    Cos,
    Tan,
    Arcsin,
    Arccos,
    Arctan,
}

impl UnaryInverseKind {
    /// Classify a unary function name into an inversion kind.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ln" | "log" => Some(Self::Ln),
            "exp" => Some(Self::Exp),
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            "tan" => Some(Self::Tan),
            "arcsin" | "asin" => Some(Self::Arcsin),
            "arccos" | "acos" => Some(Self::Arccos),
            "arctan" | "atan" => Some(Self::Arctan),
            _ => None,
        }
    }

    /// Values the argument can take when `f(arg) = rhs`.
    ///
    /// Periodic functions return the two principal branches; the caller
    /// decides what to do with more than one candidate.
    pub fn build_rhs(self, ctx: &mut Context, rhs: ExprId) -> Vec<ExprId> {
        match self {
            Self::Ln => {
                let e = ctx.add(Expr::Constant(Constant::E));
                vec![ctx.add(Expr::Pow(e, rhs))]
            }
            Self::Exp => vec![ctx.call("ln", vec![rhs])],
            Self::Sin => {
                let principal = ctx.call("arcsin", vec![rhs]);
                let pi = ctx.add(Expr::Constant(Constant::Pi));
                let mirrored = ctx.add(Expr::Sub(pi, principal));
                vec![principal, mirrored]
            }
            Self::Cos => {
                let principal = ctx.call("arccos", vec![rhs]);
                let mirrored = ctx.add(Expr::Neg(principal));
                vec![principal, mirrored]
            }
            Self::Tan => vec![ctx.call("arctan", vec![rhs])],
            Self::Arcsin => vec![ctx.call("sin", vec![rhs])],
            Self::Arccos => vec![ctx.call("cos", vec![rhs])],
            Self::Arctan => vec![ctx.call("tan", vec![rhs])],
        }
    }

    /// Human-readable action, used in trace output.
    pub fn step_description(self) -> &'static str {
        match self {
            Self::Ln => "Exponentiate both sides with base e",
            Self::Exp => "Take natural log of both sides",
            Self::Sin => "Take arcsin of both sides",
            Self::Cos => "Take arccos of both sides",
            Self::Tan => "Take arctan of both sides",
            Self::Arcsin => "Take sin of both sides",
            Self::Arccos => "Take cos of both sides",
            Self::Arctan => "Take tan of both sides",
        }
    }
}
