//! Equivalence of two single equations.

use cas_ast::{Context, Equation, Expr, SymbolId};
use tracing::trace;

use crate::engine::AlgebraEngine;
use crate::error::EngineError;

/// Whether `eq1` and `eq2` state the same relation.
///
/// Both must depend on exactly the same variables once simplified.
/// Structurally identical equations match at once; otherwise the first
/// variable for which both equations have a unique solution, and the ratio
/// of those solutions simplifies to exactly `1`, decides a match.
pub fn equations_equivalent<E: AlgebraEngine>(
    engine: &E,
    ctx: &mut Context,
    eq1: &Equation,
    eq2: &Equation,
) -> bool {
    let vars = engine.equation_variables(ctx, eq1);
    if vars != engine.equation_variables(ctx, eq2) {
        return false;
    }
    if eq1 == eq2 {
        return true;
    }

    for var in vars {
        match solutions_agree(engine, ctx, eq1, eq2, var) {
            Ok(true) => return true,
            Ok(false) => {}
            Err(err) => trace!(var = ctx.sym_name(var), error = %err, "ratio test failed"),
        }
    }
    false
}

fn solutions_agree<E: AlgebraEngine>(
    engine: &E,
    ctx: &mut Context,
    eq1: &Equation,
    eq2: &Equation,
    var: SymbolId,
) -> Result<bool, EngineError> {
    let s1 = engine.solve(ctx, eq1, var)?;
    let s2 = engine.solve(ctx, eq2, var)?;
    let ([s1], [s2]) = (s1.as_slice(), s2.as_slice()) else {
        return Ok(false);
    };
    let ratio = ctx.add(Expr::Div(*s1, *s2));
    let ratio = engine.simplify(ctx, ratio)?;
    let one = ctx.num(1);
    engine.equal(ctx, ratio, one)
}
