use cas_ast::{Context, Equation, Expr, ExprId, SymbolId};

/// Substitute every occurrence of `var` with `value` in an expression tree.
///
/// Untouched subtrees keep their ids, so substituting a variable that does
/// not occur returns `expr` itself.
pub fn substitute_var(ctx: &mut Context, expr: ExprId, var: SymbolId, value: ExprId) -> ExprId {
    let expr_data = ctx.get(expr).clone();

    match expr_data {
        Expr::Variable(sym_id) if sym_id == var => value,
        Expr::Variable(_) | Expr::Number(_) | Expr::Constant(_) => expr,

        Expr::Add(a, b) => {
            let a_sub = substitute_var(ctx, a, var, value);
            let b_sub = substitute_var(ctx, b, var, value);
            ctx.add(Expr::Add(a_sub, b_sub))
        }
        Expr::Sub(a, b) => {
            let a_sub = substitute_var(ctx, a, var, value);
            let b_sub = substitute_var(ctx, b, var, value);
            ctx.add(Expr::Sub(a_sub, b_sub))
        }
        Expr::Mul(a, b) => {
            let a_sub = substitute_var(ctx, a, var, value);
            let b_sub = substitute_var(ctx, b, var, value);
            ctx.add(Expr::Mul(a_sub, b_sub))
        }
        Expr::Div(a, b) => {
            let a_sub = substitute_var(ctx, a, var, value);
            let b_sub = substitute_var(ctx, b, var, value);
            ctx.add(Expr::Div(a_sub, b_sub))
        }
        Expr::Pow(a, b) => {
            let a_sub = substitute_var(ctx, a, var, value);
            let b_sub = substitute_var(ctx, b, var, value);
            ctx.add(Expr::Pow(a_sub, b_sub))
        }
        Expr::Neg(a) => {
            let a_sub = substitute_var(ctx, a, var, value);
            ctx.add(Expr::Neg(a_sub))
        }
        Expr::Function(name, args) => {
            let args_sub: Vec<_> = args
                .iter()
                .map(|&arg| substitute_var(ctx, arg, var, value))
                .collect();
            ctx.add(Expr::Function(name, args_sub))
        }
    }
}

/// Substitute on both sides, producing a new equation.
pub fn substitute_in_equation(
    ctx: &mut Context,
    eq: &Equation,
    var: SymbolId,
    value: ExprId,
) -> Equation {
    let lhs = substitute_var(ctx, eq.lhs, var, value);
    let rhs = substitute_var(ctx, eq.rhs, var, value);
    Equation::new(lhs, rhs)
}
