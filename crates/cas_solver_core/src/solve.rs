//! Solving one equation for one variable.
//!
//! The residual `lhs - rhs` is brought to normal form and its numerator is
//! treated as a polynomial in the target. When the target only occurs inside
//! a single invertible atom (`exp(x + 1)`, `sqrt(h)`, `2^n`, ...) the atom is
//! solved for first and then peeled off.

use cas_ast::{Context, Equation, Expr, ExprId, SymbolId};
use cas_math::{
    is_identically_zero, AtomId, AtomKind, MultiPoly, Normalizer, PolyError, RationalForm,
};
use tracing::trace;

use crate::error::SolveError;
use crate::function_inverse::UnaryInverseKind;
use crate::quadratic_formula::quadratic_roots;
use crate::solve_budget::SolveBudget;
use crate::substitution::substitute_var;

/// All closed-form solutions of `eq` for `var`.
///
/// An empty vector means `var` does not occur once the equation is
/// simplified (or every candidate was rejected). Degrees above two and
/// non-invertible occurrences are errors.
pub fn solve_for(
    ctx: &mut Context,
    eq: &Equation,
    var: SymbolId,
    budget: &SolveBudget,
) -> Result<Vec<ExprId>, SolveError> {
    let residual = eq.residual(ctx);
    let solutions = solve_residual(ctx, residual, var, budget)?;
    trace!(
        var = ctx.sym_name(var),
        count = solutions.len(),
        "solve attempt finished"
    );
    Ok(solutions)
}

/// What the numerator of a residual looks like with respect to the target.
enum Shape {
    Absent,
    Polynomial {
        atom: AtomId,
        num: MultiPoly,
    },
    Wrapped {
        atom: AtomId,
        num: MultiPoly,
    },
}

fn solve_residual(
    ctx: &mut Context,
    residual: ExprId,
    var: SymbolId,
    budget: &SolveBudget,
) -> Result<Vec<ExprId>, SolveError> {
    let var_name = ctx.sym_name(var).to_string();

    // Phase 1: normal form, candidate values, and the denominator to check.
    let (candidates, wrapped, den_expr) = {
        let mut norm = Normalizer::new(ctx, budget.poly.clone());
        let form = norm.normalize(residual)?;
        let den_expr = (!form.den.is_constant())
            .then(|| norm.poly_to_expr(&form.den));

        match classify(&norm, &form, var, &var_name)? {
            Shape::Absent => return Ok(Vec::new()),
            Shape::Polynomial { atom, num } => {
                let roots = polynomial_roots(&mut norm, &num, atom, &var_name)?;
                let exprs = roots.iter().map(|r| norm.to_expr(r)).collect::<Vec<_>>();
                (exprs, None, den_expr)
            }
            Shape::Wrapped { atom, num } => {
                let roots = polynomial_roots(&mut norm, &num, atom, &var_name)?;
                let exprs = roots.iter().map(|r| norm.to_expr(r)).collect::<Vec<_>>();
                let kind = norm.atoms().get(atom).kind.clone();
                (exprs, Some(kind), den_expr)
            }
        }
    };

    // Phase 2: peel the wrapper off, one nested solve per candidate value.
    let solutions = match wrapped {
        None => candidates,
        Some(kind) => {
            if !budget.can_descend() {
                return Err(SolveError::CannotIsolate(var_name));
            }
            let inner_budget = budget.descend();
            let mut all = Vec::new();
            for value in candidates {
                for inner in unwrap_atom(ctx, &kind, value, var, &var_name)? {
                    all.extend(solve_residual(ctx, inner, var, &inner_budget)?);
                }
            }
            all
        }
    };

    // Phase 3: drop values that make the residual's denominator vanish.
    let mut kept = Vec::with_capacity(solutions.len());
    for s in solutions {
        if kept.contains(&s) {
            continue;
        }
        if let Some(den) = den_expr {
            let at_s = substitute_var(ctx, den, var, s);
            match is_identically_zero(ctx, at_s, &budget.poly) {
                Ok(true) | Err(PolyError::DivisionByZero) => {
                    trace!(var = %var_name, "discarding solution that zeroes the denominator");
                    continue;
                }
                _ => {}
            }
        }
        kept.push(s);
    }
    Ok(kept)
}

fn classify(
    norm: &Normalizer<'_>,
    form: &RationalForm,
    var: SymbolId,
    var_name: &str,
) -> Result<Shape, SolveError> {
    let num = &form.num;
    let bare = norm
        .atoms()
        .find_symbol(var)
        .filter(|&a| num.contains_atom(a));
    let nested: Vec<AtomId> = norm
        .atoms()
        .nested_dependents(var)
        .into_iter()
        .filter(|&a| num.contains_atom(a))
        .collect();

    match (bare, nested.as_slice()) {
        (None, []) => Ok(Shape::Absent),
        (Some(atom), []) => Ok(Shape::Polynomial {
            atom,
            num: num.clone(),
        }),
        (None, [atom]) => Ok(Shape::Wrapped {
            atom: *atom,
            num: num.clone(),
        }),
        _ => Err(SolveError::CannotIsolate(var_name.to_string())),
    }
}

/// Roots of `num` viewed as a polynomial in `atom`.
fn polynomial_roots(
    norm: &mut Normalizer<'_>,
    num: &MultiPoly,
    atom: AtomId,
    var_name: &str,
) -> Result<Vec<RationalForm>, SolveError> {
    let budget = norm.budget().clone();
    let coeffs = num.coefficients_in(atom);
    match coeffs.as_slice() {
        [_] => Ok(Vec::new()),
        [c0, c1] => {
            let root = RationalForm::from_poly(c0.neg())
                .div(&RationalForm::from_poly(c1.clone()), &budget)?
                .reduce(&budget);
            Ok(vec![root])
        }
        [c, b, a] => Ok(quadratic_roots(norm, a, b, c)?),
        _ => Err(SolveError::UnsupportedDegree {
            var: var_name.to_string(),
            degree: num.degree_in(atom),
        }),
    }
}

/// Residuals `inner - inverse(value)` whose roots solve `atom = value`.
fn unwrap_atom(
    ctx: &mut Context,
    kind: &AtomKind,
    value: ExprId,
    var: SymbolId,
    var_name: &str,
) -> Result<Vec<ExprId>, SolveError> {
    let cannot = || SolveError::CannotIsolate(var_name.to_string());
    let (inner, inverses) = match kind {
        AtomKind::Call { name, args } if args.len() == 1 => {
            let inverse = UnaryInverseKind::from_name(name).ok_or_else(cannot)?;
            trace!(var = %var_name, step = inverse.step_description(), "isolating");
            (args[0], inverse.build_rhs(ctx, value))
        }
        // u^(p/q) = w  =>  u = w^(q/p)
        AtomKind::Root { base, exp } => {
            let inv = ctx.rational(exp.recip());
            (*base, vec![ctx.add(Expr::Pow(value, inv))])
        }
        AtomKind::Power { base, exp } => {
            let in_base = cas_ast::traversal::contains_var(ctx, *base, var);
            let in_exp = cas_ast::traversal::contains_var(ctx, *exp, var);
            match (in_base, in_exp) {
                // b^u = w  =>  u = ln(w) / ln(b)
                (false, true) => {
                    let ln_w = ctx.call("ln", vec![value]);
                    let ln_b = ctx.call("ln", vec![*base]);
                    (*exp, vec![ctx.add(Expr::Div(ln_w, ln_b))])
                }
                // u^k = w  =>  u = w^(1/k)
                (true, false) => {
                    let one = ctx.num(1);
                    let inv = ctx.add(Expr::Div(one, *exp));
                    (*base, vec![ctx.add(Expr::Pow(value, inv))])
                }
                _ => return Err(cannot()),
            }
        }
        _ => return Err(cannot()),
    };

    Ok(inverses
        .into_iter()
        .map(|rhs| ctx.add(Expr::Sub(inner, rhs)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_ast::DisplayExpr;
    use cas_math::{exprs_equal, PolyBudget};

    fn show(ctx: &Context, id: ExprId) -> String {
        DisplayExpr { context: ctx, id }.to_string()
    }

    fn solve(
        ctx: &mut Context,
        lhs: ExprId,
        rhs: ExprId,
        var: &str,
    ) -> Result<Vec<ExprId>, SolveError> {
        let sym = ctx.intern(var);
        solve_for(ctx, &Equation::new(lhs, rhs), sym, &SolveBudget::default())
    }

    fn assert_same(ctx: &mut Context, a: ExprId, b: ExprId) {
        let equal = exprs_equal(ctx, a, b, &PolyBudget::default()).unwrap();
        assert!(equal, "{} != {}", show(ctx, a), show(ctx, b));
    }

    #[test]
    fn linear_equation_has_one_solution() {
        let mut ctx = Context::new();
        let (h, q, a) = (ctx.var("h"), ctx.var("q_out"), ctx.var("A"));
        let rhs = ctx.add(Expr::Div(q, a));
        let sols = solve(&mut ctx, h, rhs, "q_out").unwrap();
        assert_eq!(sols.len(), 1);
        let expected = ctx.add(Expr::Mul(h, a));
        assert_same(&mut ctx, sols[0], expected);
    }

    #[test]
    fn absent_variable_has_no_solution() {
        let mut ctx = Context::new();
        let (x, y) = (ctx.var("x"), ctx.var("y"));
        ctx.intern("z");
        assert!(solve(&mut ctx, x, y, "z").unwrap().is_empty());
    }

    #[test]
    fn cancelling_variable_counts_as_absent() {
        let mut ctx = Context::new();
        let (x, y) = (ctx.var("x"), ctx.var("y"));
        let one = ctx.num(1);
        let lhs = ctx.add(Expr::Add(x, y));
        let rhs = ctx.add(Expr::Add(y, one));
        // x + y = y + 1 has no solutions for y
        assert!(solve(&mut ctx, lhs, rhs, "y").unwrap().is_empty());
    }

    #[test]
    fn quadratic_with_nonzero_discriminant_has_two_roots() {
        let mut ctx = Context::new();
        let (x, y) = (ctx.var("x"), ctx.var("y"));
        let two = ctx.num(2);
        let x2 = ctx.add(Expr::Pow(x, two));
        assert_eq!(solve(&mut ctx, x2, y, "x").unwrap().len(), 2);
    }

    #[test]
    fn double_root_is_reported_once() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let one = ctx.num(1);
        let two = ctx.num(2);
        let xm1 = ctx.add(Expr::Sub(x, one));
        let sq = ctx.add(Expr::Pow(xm1, two));
        let zero = ctx.num(0);
        let sols = solve(&mut ctx, sq, zero, "x").unwrap();
        assert_eq!(sols.len(), 1);
        assert!(ctx.is_number(sols[0], 1));
    }

    #[test]
    fn cubic_is_unsupported() {
        let mut ctx = Context::new();
        let (x, y) = (ctx.var("x"), ctx.var("y"));
        let three = ctx.num(3);
        let x3 = ctx.add(Expr::Pow(x, three));
        assert!(matches!(
            solve(&mut ctx, x3, y, "x"),
            Err(SolveError::UnsupportedDegree { degree: 3, .. })
        ));
    }

    #[test]
    fn isolates_through_exp() {
        let mut ctx = Context::new();
        let (x, y) = (ctx.var("x"), ctx.var("y"));
        let ex = ctx.call("exp", vec![x]);
        let sols = solve(&mut ctx, ex, y, "x").unwrap();
        assert_eq!(sols.len(), 1);
        let expected = ctx.call("ln", vec![y]);
        assert_same(&mut ctx, sols[0], expected);
    }

    #[test]
    fn isolates_through_square_root() {
        let mut ctx = Context::new();
        let (f, k, h) = (ctx.var("F"), ctx.var("k"), ctx.var("h"));
        let root = ctx.call("sqrt", vec![h]);
        let rhs = ctx.add(Expr::Mul(k, root));
        let sols = solve(&mut ctx, f, rhs, "h").unwrap();
        assert_eq!(sols.len(), 1);
        let ratio = ctx.add(Expr::Div(f, k));
        let two = ctx.num(2);
        let expected = ctx.add(Expr::Pow(ratio, two));
        assert_same(&mut ctx, sols[0], expected);
    }

    #[test]
    fn mixed_occurrences_cannot_be_isolated() {
        let mut ctx = Context::new();
        let (x, y) = (ctx.var("x"), ctx.var("y"));
        let ex = ctx.call("exp", vec![x]);
        let lhs = ctx.add(Expr::Mul(x, ex));
        assert!(matches!(
            solve(&mut ctx, lhs, y, "x"),
            Err(SolveError::CannotIsolate(_))
        ));
    }

    #[test]
    fn derivative_atoms_block_isolation() {
        let mut ctx = Context::new();
        let (v, t, q) = (ctx.var("V"), ctx.var("t"), ctx.var("q"));
        let d = ctx.call("diff", vec![v, t]);
        assert!(solve(&mut ctx, d, q, "V").is_err());
        // but the other side solves normally
        let sols = solve(&mut ctx, d, q, "q").unwrap();
        assert_eq!(sols, vec![d]);
    }
}
