//! Stack-safe traversal utilities.
//!
//! All walks use an explicit stack so arbitrarily deep expressions cannot
//! overflow the call stack.

use crate::expression::{Context, Expr, ExprId};
use crate::symbol::SymbolId;
use std::collections::BTreeSet;

/// Push all children of a node onto the stack.
#[inline]
fn push_children(node: &Expr, stack: &mut Vec<ExprId>) {
    match node {
        Expr::Add(l, r) | Expr::Sub(l, r) | Expr::Mul(l, r) | Expr::Div(l, r) | Expr::Pow(l, r) => {
            stack.push(*l);
            stack.push(*r);
        }
        Expr::Neg(e) => stack.push(*e),
        Expr::Function(_, args) => stack.extend(args),
        Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => {}
    }
}

/// Count all nodes of the tree rooted at `root` (shared subtrees counted
/// once per occurrence).
pub fn count_all_nodes(ctx: &Context, root: ExprId) -> usize {
    count_nodes_matching(ctx, root, |_| true)
}

pub fn count_nodes_matching<F>(ctx: &Context, root: ExprId, mut pred: F) -> usize
where
    F: FnMut(&Expr) -> bool,
{
    let mut count = 0;
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        let node = ctx.get(id);
        if pred(node) {
            count += 1;
        }
        push_children(node, &mut stack);
    }

    count
}

/// Collect the free variables of an expression.
///
/// Function names are not variables: `f(x)` has the single free variable `x`.
pub fn collect_variables(ctx: &Context, root: ExprId) -> BTreeSet<SymbolId> {
    let mut vars = BTreeSet::new();
    collect_variables_into(ctx, root, &mut vars);
    vars
}

/// Like [`collect_variables`], accumulating into an existing set.
pub fn collect_variables_into(ctx: &Context, root: ExprId, vars: &mut BTreeSet<SymbolId>) {
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        let node = ctx.get(id);
        if let Expr::Variable(sym) = node {
            vars.insert(*sym);
        }
        push_children(node, &mut stack);
    }
}

/// Whether `var` occurs anywhere in the tree rooted at `root`.
pub fn contains_var(ctx: &Context, root: ExprId, var: SymbolId) -> bool {
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        let node = ctx.get(id);
        if matches!(node, Expr::Variable(sym) if *sym == var) {
            return true;
        }
        push_children(node, &mut stack);
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_variables_but_not_function_names() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let t = ctx.var("t");
        let d = ctx.call("diff", vec![x, t]);
        let k = ctx.var("k");
        let rhs = ctx.add(Expr::Mul(k, d));

        let vars = collect_variables(&ctx, rhs);
        let names: Vec<&str> = vars.iter().map(|s| ctx.sym_name(*s)).collect();
        assert_eq!(names, vec!["x", "t", "k"]);
        assert!(ctx.lookup_symbol("diff").is_some_and(|f| !vars.contains(&f)));
    }

    #[test]
    fn contains_var_looks_through_nesting() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let two = ctx.num(2);
        let sq = ctx.add(Expr::Pow(x, two));
        let e = ctx.call("exp", vec![sq]);
        let sym_x = ctx.intern("x");
        let sym_y = ctx.intern("y");
        assert!(contains_var(&ctx, e, sym_x));
        assert!(!contains_var(&ctx, e, sym_y));
    }

    #[test]
    fn counts_every_occurrence() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let xx = ctx.add(Expr::Mul(x, x));
        assert_eq!(count_all_nodes(&ctx, xx), 3);
        assert_eq!(
            count_nodes_matching(&ctx, xx, |e| matches!(e, Expr::Variable(_))),
            2
        );
    }
}
