//! Equation groups and their derived variable sets.

use std::collections::BTreeSet;

use cas_ast::{Context, Equation, SymbolId};

use crate::checker::Judge;
use crate::engine::{AlgebraEngine, CasEngine};
use crate::error::EquivError;

/// An ordered, non-empty list of equations describing one model.
///
/// The variable sets are derived once at construction. Groups are never
/// edited: elimination builds a new group from the rewritten equations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EquationGroup {
    equations: Vec<Equation>,
    equation_vars: Vec<BTreeSet<SymbolId>>,
    variables: BTreeSet<SymbolId>,
    shared: BTreeSet<SymbolId>,
}

impl EquationGroup {
    /// Group `equations`, deriving variables with the default engine.
    pub fn new(ctx: &mut Context, equations: Vec<Equation>) -> Result<Self, EquivError> {
        Self::with_engine(&CasEngine::default(), ctx, equations)
    }

    /// Group `equations`; each equation's variables are the ones its
    /// simplified residual still depends on, so cancelled terms do not count.
    pub fn with_engine<E: AlgebraEngine>(
        engine: &E,
        ctx: &mut Context,
        equations: Vec<Equation>,
    ) -> Result<Self, EquivError> {
        if equations.is_empty() {
            return Err(EquivError::EmptyGroup);
        }

        let equation_vars: Vec<BTreeSet<SymbolId>> = equations
            .iter()
            .map(|eq| engine.equation_variables(ctx, eq))
            .collect();

        let mut variables = BTreeSet::new();
        let mut shared = BTreeSet::new();
        for vars in &equation_vars {
            for &v in vars {
                // second sighting marks it shared
                if !variables.insert(v) {
                    shared.insert(v);
                }
            }
        }

        Ok(Self {
            equations,
            equation_vars,
            variables,
            shared,
        })
    }

    pub fn equations(&self) -> &[Equation] {
        &self.equations
    }

    /// Union of the free variables of all equations.
    pub fn variables(&self) -> &BTreeSet<SymbolId> {
        &self.variables
    }

    /// Variables that occur in at least two equations.
    pub fn shared_variables(&self) -> &BTreeSet<SymbolId> {
        &self.shared
    }

    /// Free variables of the equation at `index`.
    pub fn equation_variables(&self, index: usize) -> Option<&BTreeSet<SymbolId>> {
        self.equation_vars.get(index)
    }

    /// Indices of the equations mentioning `var`, in list order.
    pub fn equations_with(&self, var: SymbolId) -> Vec<usize> {
        self.equation_vars
            .iter()
            .enumerate()
            .filter(|(_, vars)| vars.contains(&var))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.equations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }

    pub fn display(&self, ctx: &Context) -> Vec<String> {
        self.equations
            .iter()
            .map(|eq| eq.display(ctx).to_string())
            .collect()
    }

    /// Whether `self` and `other` describe the same system under `judge`.
    pub fn equivalent_to<E: AlgebraEngine>(
        &self,
        other: &EquationGroup,
        ctx: &mut Context,
        judge: &Judge<E>,
    ) -> bool {
        judge.equivalent(ctx, self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_parser::parse_equation;

    fn group(ctx: &mut Context, lines: &[&str]) -> EquationGroup {
        let eqs = lines
            .iter()
            .map(|l| parse_equation(l, ctx).unwrap())
            .collect();
        EquationGroup::new(ctx, eqs).unwrap()
    }

    fn names(ctx: &Context, set: &BTreeSet<SymbolId>) -> Vec<String> {
        set.iter().map(|&s| ctx.sym_name(s).to_string()).collect()
    }

    #[test]
    fn derives_variables_and_shared_variables() {
        let mut ctx = Context::new();
        let g = group(&mut ctx, &["q_in = q_out", "h = q_in / A", "V = A * h"]);
        assert_eq!(g.len(), 3);
        assert_eq!(names(&ctx, g.variables()), ["q_in", "q_out", "h", "A", "V"]);
        assert_eq!(names(&ctx, g.shared_variables()), ["q_in", "h", "A"]);
        assert!(g.shared_variables().is_subset(g.variables()));
    }

    #[test]
    fn single_equation_shares_nothing() {
        let mut ctx = Context::new();
        let g = group(&mut ctx, &["x = x * y + 1"]);
        assert!(g.shared_variables().is_empty());
        assert_eq!(g.variables().len(), 2);
    }

    #[test]
    fn cancelled_terms_are_not_variables() {
        let mut ctx = Context::new();
        let g = group(&mut ctx, &["a = b + c", "d = a - c + c"]);
        assert_eq!(names(&ctx, g.variables()), ["a", "b", "c", "d"]);
        assert_eq!(names(&ctx, g.shared_variables()), ["a"]);
        let c = ctx.intern("c");
        assert_eq!(g.equations_with(c), vec![0]);
    }

    #[test]
    fn locates_equations_by_variable() {
        let mut ctx = Context::new();
        let g = group(&mut ctx, &["a = b", "c = d", "a = d"]);
        let a = ctx.intern("a");
        let d = ctx.intern("d");
        assert_eq!(g.equations_with(a), vec![0, 2]);
        assert_eq!(g.equations_with(d), vec![1, 2]);
        assert_eq!(g.equation_variables(1).map(|v| v.len()), Some(2));
        assert_eq!(g.equation_variables(3), None);
    }

    #[test]
    fn empty_group_is_rejected() {
        let mut ctx = Context::new();
        assert_eq!(
            EquationGroup::new(&mut ctx, Vec::new()),
            Err(EquivError::EmptyGroup)
        );
    }

    #[test]
    fn derivative_terms_count_the_time_variable() {
        let mut ctx = Context::new();
        let g = group(&mut ctx, &["der(V) = q_in - q_out", "q_out = k * V"]);
        assert_eq!(names(&ctx, g.variables()), ["V", "t", "q_in", "q_out", "k"]);
        assert_eq!(names(&ctx, g.shared_variables()), ["V", "q_out"]);
    }
}
