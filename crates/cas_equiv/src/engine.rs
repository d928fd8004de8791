//! The algebra capabilities the equivalence procedure relies on.
//!
//! Everything the checker knows about expressions goes through
//! [`AlgebraEngine`]: solving, substitution, simplification, exact equality
//! and free variables. [`CasEngine`] implements it on top of the exact
//! rational normal form of `cas_math`.

use std::collections::BTreeSet;
use std::time::Instant;

use cas_ast::traversal::collect_variables;
use cas_ast::{Context, Equation, ExprId, SymbolId};
use cas_solver_core::{solve_for, substitute_in_equation, substitute_var, SolveBudget};

use crate::error::EngineError;
use crate::options::EquivOptions;

pub trait AlgebraEngine {
    /// Closed-form solutions of `eq` for `var`.
    fn solve(
        &self,
        ctx: &mut Context,
        eq: &Equation,
        var: SymbolId,
    ) -> Result<Vec<ExprId>, EngineError>;

    /// Replace every occurrence of `var` in `expr` by `replacement`.
    fn substitute(
        &self,
        ctx: &mut Context,
        expr: ExprId,
        var: SymbolId,
        replacement: ExprId,
    ) -> ExprId;

    fn simplify(&self, ctx: &mut Context, expr: ExprId) -> Result<ExprId, EngineError>;

    /// Exact equality of the values of `a` and `b`.
    fn equal(&self, ctx: &mut Context, a: ExprId, b: ExprId) -> Result<bool, EngineError>;

    /// Variables `expr` depends on after simplification.
    fn free_variables(&self, ctx: &mut Context, expr: ExprId) -> BTreeSet<SymbolId>;

    /// A copy of this engine whose calls fail once `deadline` has passed.
    fn with_deadline(&self, deadline: Option<Instant>) -> Self
    where
        Self: Sized;

    fn deadline_expired(&self) -> bool {
        false
    }

    /// Variables of `eq`, read off its residual `lhs - rhs`.
    fn equation_variables(&self, ctx: &mut Context, eq: &Equation) -> BTreeSet<SymbolId> {
        let residual = eq.residual(ctx);
        self.free_variables(ctx, residual)
    }

    fn substitute_equation(
        &self,
        ctx: &mut Context,
        eq: &Equation,
        var: SymbolId,
        replacement: ExprId,
    ) -> Equation {
        let lhs = self.substitute(ctx, eq.lhs, var, replacement);
        let rhs = self.substitute(ctx, eq.rhs, var, replacement);
        Equation::new(lhs, rhs)
    }
}

/// Exact engine backed by `cas_math` normal forms and `cas_solver_core`.
#[derive(Clone, Debug, Default)]
pub struct CasEngine {
    budget: SolveBudget,
}

impl CasEngine {
    pub fn new(budget: SolveBudget) -> Self {
        Self { budget }
    }

    pub fn from_options(options: &EquivOptions) -> Self {
        Self::new(options.poly_budget.solve_budget())
    }

    pub fn budget(&self) -> &SolveBudget {
        &self.budget
    }
}

impl AlgebraEngine for CasEngine {
    fn solve(
        &self,
        ctx: &mut Context,
        eq: &Equation,
        var: SymbolId,
    ) -> Result<Vec<ExprId>, EngineError> {
        self.budget.poly.check_deadline()?;
        Ok(solve_for(ctx, eq, var, &self.budget)?)
    }

    fn substitute(
        &self,
        ctx: &mut Context,
        expr: ExprId,
        var: SymbolId,
        replacement: ExprId,
    ) -> ExprId {
        substitute_var(ctx, expr, var, replacement)
    }

    fn substitute_equation(
        &self,
        ctx: &mut Context,
        eq: &Equation,
        var: SymbolId,
        replacement: ExprId,
    ) -> Equation {
        substitute_in_equation(ctx, eq, var, replacement)
    }

    fn simplify(&self, ctx: &mut Context, expr: ExprId) -> Result<ExprId, EngineError> {
        Ok(cas_math::simplify(ctx, expr, &self.budget.poly)?)
    }

    fn equal(&self, ctx: &mut Context, a: ExprId, b: ExprId) -> Result<bool, EngineError> {
        Ok(cas_math::exprs_equal(ctx, a, b, &self.budget.poly)?)
    }

    fn free_variables(&self, ctx: &mut Context, expr: ExprId) -> BTreeSet<SymbolId> {
        match cas_math::free_symbols(ctx, expr, &self.budget.poly) {
            Ok(vars) => vars,
            // outside the normal form, fall back to the symbols as written
            Err(_) => collect_variables(ctx, expr),
        }
    }

    fn with_deadline(&self, deadline: Option<Instant>) -> Self {
        let mut engine = self.clone();
        engine.budget.poly.deadline = deadline;
        engine
    }

    fn deadline_expired(&self) -> bool {
        self.budget.poly.check_deadline().is_err()
    }
}
