//! Removing locally shared variables from a group by substitution.
//!
//! One step solves a single equation for one target variable, substitutes
//! the unique solution into every other equation mentioning the target and
//! drops the solved equation. [`eliminate`] repeats steps until the targets
//! run out or no target can be solved any more.

use std::collections::BTreeSet;

use cas_ast::traversal::count_all_nodes;
use cas_ast::{Context, ExprId, SymbolId};
use tracing::{debug, trace};

use crate::engine::AlgebraEngine;
use crate::error::EquivError;
use crate::group::EquationGroup;
use crate::options::TieBreak;

/// Result of one or more elimination steps.
#[derive(Clone, Debug)]
pub struct Elimination {
    pub group: EquationGroup,
    /// Variables removed, in elimination order.
    pub eliminated: Vec<SymbolId>,
}

impl Elimination {
    pub fn progressed(&self) -> bool {
        !self.eliminated.is_empty()
    }
}

/// A unique solution of the equation at `index` for the current target.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    index: usize,
    solution: ExprId,
}

impl TieBreak {
    fn pick(self, ctx: &Context, candidates: &[Candidate]) -> Option<Candidate> {
        match self {
            TieBreak::FirstSolved => candidates.first().copied(),
            // min_by_key keeps the first of equal keys
            TieBreak::FewestNodes => candidates
                .iter()
                .min_by_key(|c| count_all_nodes(ctx, c.solution))
                .copied(),
        }
    }
}

/// Eliminate as many of `targets` from `group` as possible.
///
/// Consumed variables are removed from `targets`; what is left could not be
/// eliminated. Engine failures on individual attempts are skipped, only an
/// expired deadline is returned as an error.
pub fn eliminate<E: AlgebraEngine>(
    engine: &E,
    ctx: &mut Context,
    group: &EquationGroup,
    targets: &mut BTreeSet<SymbolId>,
    tie_break: TieBreak,
) -> Result<Elimination, EquivError> {
    let mut current = group.clone();
    let mut eliminated = Vec::new();

    while let Some((next, var)) = eliminate_step(engine, ctx, &current, targets, tie_break)? {
        eliminated.push(var);
        current = next;
    }

    if eliminated.is_empty() && !targets.is_empty() {
        debug!(
            remaining = targets.len(),
            "could not reduce the number of equations"
        );
    }

    Ok(Elimination {
        group: current,
        eliminated,
    })
}

/// One elimination step: the new group and the variable it removed, or
/// `None` when no target is both locally shared and uniquely solvable.
pub fn eliminate_step<E: AlgebraEngine>(
    engine: &E,
    ctx: &mut Context,
    group: &EquationGroup,
    targets: &mut BTreeSet<SymbolId>,
    tie_break: TieBreak,
) -> Result<Option<(EquationGroup, SymbolId)>, EquivError> {
    if group.shared_variables().is_empty() || targets.is_empty() {
        return Ok(None);
    }

    let order: Vec<SymbolId> = targets.iter().copied().collect();
    for var in order {
        if !group.shared_variables().contains(&var) {
            continue;
        }

        let holders = group.equations_with(var);
        let mut candidates = Vec::new();
        for &index in &holders {
            let eq = group.equations()[index];
            match engine.solve(ctx, &eq, var) {
                Ok(solutions) if solutions.len() == 1 => {
                    candidates.push(Candidate {
                        index,
                        solution: solutions[0],
                    });
                    if tie_break == TieBreak::FirstSolved {
                        break;
                    }
                }
                Ok(solutions) => trace!(
                    var = ctx.sym_name(var),
                    equation = index,
                    count = solutions.len(),
                    "no unique solution"
                ),
                Err(err) if err.is_deadline() => return Err(err.into()),
                Err(err) => trace!(
                    var = ctx.sym_name(var),
                    equation = index,
                    error = %err,
                    "solve attempt failed"
                ),
            }
        }

        let Some(source) = tie_break.pick(ctx, &candidates) else {
            continue;
        };

        let mut equations = Vec::with_capacity(group.len() - 1);
        for (index, eq) in group.equations().iter().enumerate() {
            if index == source.index {
                continue;
            }
            if holders.contains(&index) {
                equations.push(engine.substitute_equation(ctx, eq, var, source.solution));
            } else {
                equations.push(*eq);
            }
        }

        targets.remove(&var);
        debug!(
            var = ctx.sym_name(var),
            source = source.index,
            substituted = holders.len() - 1,
            "eliminated variable"
        );
        let next = EquationGroup::with_engine(engine, ctx, equations)?;
        return Ok(Some((next, var)));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CasEngine;
    use cas_parser::parse_equation;

    fn group(ctx: &mut Context, lines: &[&str]) -> EquationGroup {
        let eqs = lines
            .iter()
            .map(|l| parse_equation(l, ctx).unwrap())
            .collect();
        EquationGroup::new(ctx, eqs).unwrap()
    }

    fn targets(ctx: &mut Context, names: &[&str]) -> BTreeSet<SymbolId> {
        names.iter().map(|n| ctx.intern(n)).collect()
    }

    #[test]
    fn eliminates_a_from_two_equations() {
        let mut ctx = Context::new();
        let g = group(&mut ctx, &["a = b", "a = c"]);
        let mut t = targets(&mut ctx, &["a"]);
        let engine = CasEngine::default();
        let out = eliminate(&engine, &mut ctx, &g, &mut t, TieBreak::FirstSolved).unwrap();

        assert!(out.progressed());
        assert!(t.is_empty());
        assert_eq!(out.group.len(), 1);
        assert_eq!(out.group.display(&ctx), ["b = c"]);
        let a = ctx.intern("a");
        assert!(!out.group.variables().contains(&a));
    }

    #[test]
    fn first_solved_equation_is_the_source() {
        let mut ctx = Context::new();
        // only the second and third equations solve uniquely for a
        let g = group(&mut ctx, &["a^2 = b", "a = c + 1", "d = 2 * a"]);
        let mut t = targets(&mut ctx, &["a"]);
        let engine = CasEngine::default();
        let out = eliminate(&engine, &mut ctx, &g, &mut t, TieBreak::FirstSolved).unwrap();
        assert_eq!(out.group.display(&ctx), ["(c + 1)^2 = b", "d = 2 * (c + 1)"]);
    }

    #[test]
    fn fewest_nodes_prefers_the_smaller_solution() {
        let mut ctx = Context::new();
        let g = group(&mut ctx, &["a = c + d * e", "a = b"]);
        let mut t = targets(&mut ctx, &["a"]);
        let engine = CasEngine::default();
        let out = eliminate(&engine, &mut ctx, &g, &mut t, TieBreak::FewestNodes).unwrap();
        assert_eq!(out.group.display(&ctx), ["b = c + d * e"]);
    }

    #[test]
    fn unsolvable_targets_stay_put() {
        let mut ctx = Context::new();
        // a appears only squared: two roots everywhere, nothing to substitute
        let g = group(&mut ctx, &["a^2 = b", "a^2 = c + 1"]);
        let mut t = targets(&mut ctx, &["a"]);
        let engine = CasEngine::default();
        let out = eliminate(&engine, &mut ctx, &g, &mut t, TieBreak::FirstSolved).unwrap();
        assert!(!out.progressed());
        assert_eq!(t.len(), 1);
        assert_eq!(out.group, g);
    }

    #[test]
    fn private_targets_are_not_candidates() {
        let mut ctx = Context::new();
        let g = group(&mut ctx, &["a = b", "c = b + 1"]);
        let mut t = targets(&mut ctx, &["a"]);
        let engine = CasEngine::default();
        let step = eliminate_step(&engine, &mut ctx, &g, &mut t, TieBreak::FirstSolved).unwrap();
        assert!(step.is_none());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn chains_until_targets_are_exhausted() {
        let mut ctx = Context::new();
        let g = group(&mut ctx, &["x = y + 1", "y = 2 * z", "w = x + y + z"]);
        let mut t = targets(&mut ctx, &["x", "y"]);
        let engine = CasEngine::default();
        let out = eliminate(&engine, &mut ctx, &g, &mut t, TieBreak::FirstSolved).unwrap();
        assert_eq!(out.eliminated.len(), 2);
        assert_eq!(out.group.len(), 1);
        let names: Vec<_> = out
            .group
            .variables()
            .iter()
            .map(|&s| ctx.sym_name(s).to_string())
            .collect();
        assert_eq!(names, ["z", "w"]);
    }

    #[test]
    fn one_step_removes_one_equation_and_one_target() {
        let mut ctx = Context::new();
        let g = group(&mut ctx, &["x = y + 1", "y = 2 * z", "w = x + y + z"]);
        let mut t = targets(&mut ctx, &["x", "y"]);
        let engine = CasEngine::default();
        let (next, var) = eliminate_step(&engine, &mut ctx, &g, &mut t, TieBreak::FirstSolved)
            .unwrap()
            .unwrap();
        assert_eq!(ctx.sym_name(var), "x");
        assert_eq!(next.len(), 2);
        assert_eq!(t.len(), 1);
    }
}
