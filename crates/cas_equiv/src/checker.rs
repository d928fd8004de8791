//! Deciding whether two equation groups describe the same system.
//!
//! Each round compares the variable footprints of both groups. Equal
//! footprints go to the matcher; otherwise the variables private to one
//! side, restricted to those shared inside that side, are eliminated and
//! the next round starts from the reduced groups. A round in which neither
//! side made progress ends the comparison instead of repeating itself.

use std::collections::BTreeSet;
use std::time::Instant;

use cas_ast::{Context, SymbolId};
use tracing::{debug, info, warn};

use crate::eliminate::{eliminate, Elimination};
use crate::engine::{AlgebraEngine, CasEngine};
use crate::error::EquivError;
use crate::group::EquationGroup;
use crate::matcher::one_to_one;
use crate::options::EquivOptions;
use crate::verdict::{Verdict, VerdictReason};

/// Runs equivalence checks with one engine and one set of options.
#[derive(Clone, Debug)]
pub struct Judge<E = CasEngine> {
    engine: E,
    options: EquivOptions,
}

impl Judge<CasEngine> {
    pub fn new(options: EquivOptions) -> Self {
        let engine = CasEngine::from_options(&options);
        Self { engine, options }
    }
}

impl Default for Judge<CasEngine> {
    fn default() -> Self {
        Self::new(EquivOptions::default())
    }
}

impl<E: AlgebraEngine> Judge<E> {
    pub fn with_engine(engine: E, options: EquivOptions) -> Self {
        Self { engine, options }
    }

    pub fn options(&self) -> &EquivOptions {
        &self.options
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn equivalent(&self, ctx: &mut Context, a: &EquationGroup, b: &EquationGroup) -> bool {
        self.check(ctx, a, b).equivalent
    }

    pub fn check(&self, ctx: &mut Context, a: &EquationGroup, b: &EquationGroup) -> Verdict {
        let deadline = self.options.timeout().map(|t| Instant::now() + t);
        let engine = self.engine.with_deadline(deadline);
        let mut run = Run {
            engine: &engine,
            options: &self.options,
            rounds: 0,
            eliminated_a: Vec::new(),
            eliminated_b: Vec::new(),
        };
        let reason = run.compare(ctx, a.clone(), b.clone());
        let verdict = run.finish(ctx, reason);
        info!(
            equivalent = verdict.equivalent,
            reason = ?verdict.reason,
            rounds = verdict.rounds,
            "comparison finished"
        );
        verdict
    }
}

/// State of one comparison.
struct Run<'j, E> {
    engine: &'j E,
    options: &'j EquivOptions,
    rounds: usize,
    eliminated_a: Vec<SymbolId>,
    eliminated_b: Vec<SymbolId>,
}

impl<E: AlgebraEngine> Run<'_, E> {
    fn compare(
        &mut self,
        ctx: &mut Context,
        mut a: EquationGroup,
        mut b: EquationGroup,
    ) -> VerdictReason {
        while self.rounds < self.options.max_rounds {
            self.rounds += 1;
            if self.engine.deadline_expired() {
                warn!(round = self.rounds, "deadline exceeded");
                return VerdictReason::DeadlineExceeded;
            }

            let only_a: BTreeSet<SymbolId> =
                a.variables().difference(b.variables()).copied().collect();
            let only_b: BTreeSet<SymbolId> =
                b.variables().difference(a.variables()).copied().collect();

            if only_a.is_empty() && only_b.is_empty() {
                return self.match_groups(ctx, &a, &b);
            }

            let mut targets_a: BTreeSet<SymbolId> =
                only_a.intersection(a.shared_variables()).copied().collect();
            let mut targets_b: BTreeSet<SymbolId> =
                only_b.intersection(b.shared_variables()).copied().collect();
            if targets_a.is_empty() && targets_b.is_empty() {
                debug!(
                    private_a = only_a.len(),
                    private_b = only_b.len(),
                    "groups have different variables but cannot unify them"
                );
                return VerdictReason::IncompatibleVariables;
            }

            // reduce only fails once the deadline has passed
            let Ok(step_a) = self.reduce(ctx, &a, &mut targets_a) else {
                return VerdictReason::DeadlineExceeded;
            };
            let Ok(step_b) = self.reduce(ctx, &b, &mut targets_b) else {
                return VerdictReason::DeadlineExceeded;
            };

            if !step_a.progressed() && !step_b.progressed() {
                warn!(
                    round = self.rounds,
                    targets_a = targets_a.len(),
                    targets_b = targets_b.len(),
                    "could not reduce the number of equations"
                );
                return VerdictReason::Stagnated;
            }

            self.eliminated_a.extend(step_a.eliminated);
            self.eliminated_b.extend(step_b.eliminated);
            a = step_a.group;
            b = step_b.group;
            debug!(
                round = self.rounds,
                left = a.len(),
                right = b.len(),
                "groups reduced"
            );
        }

        warn!(max_rounds = self.options.max_rounds, "round limit reached");
        VerdictReason::RoundLimit
    }

    /// Eliminate what can be eliminated from `group`. Errors other than an
    /// expired deadline leave the group as it was.
    fn reduce(
        &self,
        ctx: &mut Context,
        group: &EquationGroup,
        targets: &mut BTreeSet<SymbolId>,
    ) -> Result<Elimination, EquivError> {
        let unchanged = || Elimination {
            group: group.clone(),
            eliminated: Vec::new(),
        };
        if targets.is_empty() {
            return Ok(unchanged());
        }
        match eliminate(self.engine, ctx, group, targets, self.options.tie_break) {
            Ok(step) => Ok(step),
            Err(err) if err.is_deadline() => {
                warn!(error = %err, "elimination aborted");
                Err(err)
            }
            Err(err) => {
                warn!(error = %err, "elimination failed, group left unreduced");
                Ok(unchanged())
            }
        }
    }

    fn match_groups(
        &self,
        ctx: &mut Context,
        a: &EquationGroup,
        b: &EquationGroup,
    ) -> VerdictReason {
        if a.len() != b.len() {
            debug!(left = a.len(), right = b.len(), "equation counts differ");
            return VerdictReason::CountMismatch;
        }
        let matcher = self.options.matcher.build();
        if one_to_one(matcher.as_ref(), self.engine, ctx, a.equations(), b.equations()) {
            VerdictReason::Matched
        } else if self.engine.deadline_expired() {
            warn!("deadline exceeded while matching");
            VerdictReason::DeadlineExceeded
        } else {
            VerdictReason::Unmatched
        }
    }

    fn finish(self, ctx: &Context, reason: VerdictReason) -> Verdict {
        let names = |vars: Vec<SymbolId>| -> Vec<String> {
            vars.into_iter()
                .map(|v| ctx.sym_name(v).to_string())
                .collect()
        };
        Verdict {
            equivalent: reason == VerdictReason::Matched,
            reason,
            rounds: self.rounds,
            eliminated_a: names(self.eliminated_a),
            eliminated_b: names(self.eliminated_b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{MatcherKind, TieBreak};
    use cas_math::PolyError;
    use cas_parser::parse_equation;
    use cas_solver_core::SolveError;
    use std::cell::Cell;

    fn group(ctx: &mut Context, lines: &[&str]) -> EquationGroup {
        let eqs = lines
            .iter()
            .map(|l| parse_equation(l, ctx).unwrap())
            .collect();
        EquationGroup::new(ctx, eqs).unwrap()
    }

    fn verdict(a: &[&str], b: &[&str]) -> Verdict {
        let mut ctx = Context::new();
        let ga = group(&mut ctx, a);
        let gb = group(&mut ctx, b);
        Judge::new(EquivOptions::default()).check(&mut ctx, &ga, &gb)
    }

    #[test]
    fn eliminates_private_shared_variable() {
        let v = verdict(&["q_in = q_out", "h = q_in / A"], &["h = q_out / A"]);
        assert!(v.equivalent);
        assert_eq!(v.reason, VerdictReason::Matched);
        assert_eq!(v.eliminated_a, ["q_in"]);
        assert!(v.eliminated_b.is_empty());
        assert_eq!(v.rounds, 2);
    }

    #[test]
    fn private_unshared_variables_are_incompatible() {
        let v = verdict(&["x = y"], &["x = y", "z = w"]);
        assert!(!v.equivalent);
        assert_eq!(v.reason, VerdictReason::IncompatibleVariables);
    }

    #[test]
    fn same_footprint_different_relation_is_unmatched() {
        let v = verdict(&["x = y + 1"], &["x = y + 2"]);
        assert_eq!(v.reason, VerdictReason::Unmatched);
        assert_eq!(v.rounds, 1);
    }

    #[test]
    fn same_footprint_different_sizes() {
        let v = verdict(&["x = y", "x = 2 * y"], &["x + y = 0"]);
        assert_eq!(v.reason, VerdictReason::CountMismatch);
    }

    #[test]
    fn unsolvable_targets_stagnate() {
        // a only ever appears squared, so it can never be substituted away
        let v = verdict(&["a^2 = b", "a^2 = c"], &["b = c"]);
        assert!(!v.equivalent);
        assert_eq!(v.reason, VerdictReason::Stagnated);
        assert_eq!(v.rounds, 1);
    }

    #[test]
    fn round_limit_is_enforced() {
        let mut ctx = Context::new();
        let ga = group(&mut ctx, &["q_in = q_out", "h = q_in / A"]);
        let gb = group(&mut ctx, &["h = q_out / A"]);
        let judge = Judge::new(EquivOptions {
            max_rounds: 1,
            ..EquivOptions::default()
        });
        let v = judge.check(&mut ctx, &ga, &gb);
        assert_eq!(v.reason, VerdictReason::RoundLimit);
        assert!(!v.equivalent);
    }

    #[test]
    fn group_equality_relation_uses_the_judge() {
        let mut ctx = Context::new();
        let ga = group(&mut ctx, &["V = A * h", "q = k * h"]);
        let gb = group(&mut ctx, &["q / k = h", "h * A = V"]);
        let judge = Judge::new(EquivOptions {
            matcher: MatcherKind::Exact,
            tie_break: TieBreak::FewestNodes,
            ..EquivOptions::default()
        });
        assert!(ga.equivalent_to(&gb, &mut ctx, &judge));
        assert!(gb.equivalent_to(&ga, &mut ctx, &judge));
    }

    /// Engine whose deadline is reported as expired after a fixed number of
    /// checks, to exercise the abort path deterministically.
    struct CountdownEngine {
        inner: CasEngine,
        remaining: Cell<usize>,
    }

    impl AlgebraEngine for CountdownEngine {
        fn solve(
            &self,
            ctx: &mut Context,
            eq: &cas_ast::Equation,
            var: SymbolId,
        ) -> Result<Vec<cas_ast::ExprId>, crate::EngineError> {
            self.inner.solve(ctx, eq, var)
        }

        fn substitute(
            &self,
            ctx: &mut Context,
            expr: cas_ast::ExprId,
            var: SymbolId,
            replacement: cas_ast::ExprId,
        ) -> cas_ast::ExprId {
            self.inner.substitute(ctx, expr, var, replacement)
        }

        fn simplify(
            &self,
            ctx: &mut Context,
            expr: cas_ast::ExprId,
        ) -> Result<cas_ast::ExprId, crate::EngineError> {
            self.inner.simplify(ctx, expr)
        }

        fn equal(
            &self,
            ctx: &mut Context,
            a: cas_ast::ExprId,
            b: cas_ast::ExprId,
        ) -> Result<bool, crate::EngineError> {
            self.inner.equal(ctx, a, b)
        }

        fn free_variables(
            &self,
            ctx: &mut Context,
            expr: cas_ast::ExprId,
        ) -> BTreeSet<SymbolId> {
            self.inner.free_variables(ctx, expr)
        }

        fn with_deadline(&self, _deadline: Option<Instant>) -> Self {
            Self {
                inner: self.inner.clone(),
                remaining: Cell::new(self.remaining.get()),
            }
        }

        fn deadline_expired(&self) -> bool {
            let left = self.remaining.get();
            self.remaining.set(left.saturating_sub(1));
            left == 0
        }
    }

    #[test]
    fn expired_deadline_ends_the_comparison() {
        let mut ctx = Context::new();
        let ga = group(&mut ctx, &["q_in = q_out", "h = q_in / A"]);
        let gb = group(&mut ctx, &["h = q_out / A"]);
        let engine = CountdownEngine {
            inner: CasEngine::default(),
            remaining: Cell::new(1),
        };
        let judge = Judge::with_engine(engine, EquivOptions::default());
        let v = judge.check(&mut ctx, &ga, &gb);
        assert_eq!(v.reason, VerdictReason::DeadlineExceeded);
        assert_eq!(v.rounds, 2);
        assert_eq!(v.eliminated_a, ["q_in"]);
    }

    /// Engine whose algebra always fails, but never because of a deadline.
    struct StuckEngine {
        inner: CasEngine,
    }

    impl AlgebraEngine for StuckEngine {
        fn solve(
            &self,
            ctx: &mut Context,
            _eq: &cas_ast::Equation,
            var: SymbolId,
        ) -> Result<Vec<cas_ast::ExprId>, crate::EngineError> {
            let name = ctx.sym_name(var).to_string();
            Err(SolveError::CannotIsolate(name).into())
        }

        fn substitute(
            &self,
            ctx: &mut Context,
            expr: cas_ast::ExprId,
            var: SymbolId,
            replacement: cas_ast::ExprId,
        ) -> cas_ast::ExprId {
            self.inner.substitute(ctx, expr, var, replacement)
        }

        fn simplify(
            &self,
            _ctx: &mut Context,
            _expr: cas_ast::ExprId,
        ) -> Result<cas_ast::ExprId, crate::EngineError> {
            Err(PolyError::BudgetExceeded.into())
        }

        fn equal(
            &self,
            _ctx: &mut Context,
            _a: cas_ast::ExprId,
            _b: cas_ast::ExprId,
        ) -> Result<bool, crate::EngineError> {
            Err(PolyError::BudgetExceeded.into())
        }

        fn free_variables(
            &self,
            ctx: &mut Context,
            expr: cas_ast::ExprId,
        ) -> BTreeSet<SymbolId> {
            self.inner.free_variables(ctx, expr)
        }

        fn with_deadline(&self, _deadline: Option<Instant>) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }

    #[test]
    fn engine_failures_are_not_reported_as_deadlines() {
        let judge = Judge::with_engine(
            StuckEngine {
                inner: CasEngine::default(),
            },
            EquivOptions::default(),
        );

        let mut ctx = Context::new();
        let ga = group(&mut ctx, &["q_in = q_out", "h = q_in / A"]);
        let gb = group(&mut ctx, &["h = q_out / A"]);
        let v = judge.check(&mut ctx, &ga, &gb);
        assert_eq!(v.reason, VerdictReason::Stagnated);
        assert_eq!(v.rounds, 1);

        let ga = group(&mut ctx, &["x = y"]);
        let gb = group(&mut ctx, &["y = x"]);
        let v = judge.check(&mut ctx, &ga, &gb);
        assert_eq!(v.reason, VerdictReason::Unmatched);
    }

    #[test]
    fn zero_timeout_is_reported() {
        let mut ctx = Context::new();
        let ga = group(&mut ctx, &["x = y"]);
        let gb = group(&mut ctx, &["y = x"]);
        let judge = Judge::new(EquivOptions {
            timeout_ms: Some(0),
            ..EquivOptions::default()
        });
        let v = judge.check(&mut ctx, &ga, &gb);
        assert_eq!(v.reason, VerdictReason::DeadlineExceeded);
    }
}
