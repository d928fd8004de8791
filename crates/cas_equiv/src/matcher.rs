//! One-to-one matching between two equation lists.
//!
//! Matchers only see a relation `related(a, b)` between indices, so the
//! combinatorics stay independent of the algebra. The relation is evaluated
//! lazily because every call is a pairwise equivalence test.

use cas_ast::{Context, Equation};
use tracing::debug;

use crate::engine::AlgebraEngine;
use crate::options::MatcherKind;
use crate::pairwise::equations_equivalent;

pub trait EquationMatcher {
    fn name(&self) -> &'static str;

    /// For every `b` in `0..len_b`, the `a` it is paired with, or `None`
    /// when no full one-to-one pairing was found.
    fn assign(
        &self,
        len_a: usize,
        len_b: usize,
        related: &mut dyn FnMut(usize, usize) -> bool,
    ) -> Option<Vec<usize>>;
}

/// Takes the first unused related `a` for each `b` in order and never
/// revisits a choice.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyMatcher;

impl EquationMatcher for GreedyMatcher {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn assign(
        &self,
        len_a: usize,
        len_b: usize,
        related: &mut dyn FnMut(usize, usize) -> bool,
    ) -> Option<Vec<usize>> {
        let mut used = vec![false; len_a];
        let mut pairs = Vec::with_capacity(len_b);
        for b in 0..len_b {
            let a = (0..len_a).find(|&a| !used[a] && related(a, b));
            match a {
                Some(a) => {
                    used[a] = true;
                    pairs.push(a);
                }
                None => {
                    debug!(equation = b, "no equivalent equation in the other group");
                    return None;
                }
            }
        }
        Some(pairs)
    }
}

/// Maximum bipartite matching by augmenting paths (Kuhn). Finds a perfect
/// matching whenever one exists; each pair is tested at most once.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExactMatcher;

impl EquationMatcher for ExactMatcher {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn assign(
        &self,
        len_a: usize,
        len_b: usize,
        related: &mut dyn FnMut(usize, usize) -> bool,
    ) -> Option<Vec<usize>> {
        let mut memo = Relation::new(len_a, len_b, related);
        // owner[a] = the b currently paired with a
        let mut owner: Vec<Option<usize>> = vec![None; len_a];

        for b in 0..len_b {
            let mut visited = vec![false; len_a];
            if !augment(b, &mut memo, &mut owner, &mut visited) {
                debug!(equation = b, "no augmenting path");
                return None;
            }
        }

        let mut pairs = vec![0; len_b];
        for (a, b) in owner.iter().enumerate() {
            if let Some(b) = b {
                pairs[*b] = a;
            }
        }
        Some(pairs)
    }
}

struct Relation<'r> {
    len_b: usize,
    cache: Vec<Option<bool>>,
    related: &'r mut dyn FnMut(usize, usize) -> bool,
}

impl<'r> Relation<'r> {
    fn new(len_a: usize, len_b: usize, related: &'r mut dyn FnMut(usize, usize) -> bool) -> Self {
        Self {
            len_b,
            cache: vec![None; len_a * len_b],
            related,
        }
    }

    fn get(&mut self, a: usize, b: usize) -> bool {
        let slot = a * self.len_b + b;
        match self.cache[slot] {
            Some(known) => known,
            None => {
                let value = (self.related)(a, b);
                self.cache[slot] = Some(value);
                value
            }
        }
    }
}

fn augment(
    b: usize,
    rel: &mut Relation<'_>,
    owner: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for a in 0..owner.len() {
        if visited[a] || !rel.get(a, b) {
            continue;
        }
        visited[a] = true;
        let free = match owner[a] {
            None => true,
            Some(other) => augment(other, rel, owner, visited),
        };
        if free {
            owner[a] = Some(b);
            return true;
        }
    }
    false
}

impl MatcherKind {
    pub fn build(self) -> Box<dyn EquationMatcher> {
        match self {
            MatcherKind::Greedy => Box::new(GreedyMatcher),
            MatcherKind::Exact => Box::new(ExactMatcher),
        }
    }
}

/// Whether `list_a` and `list_b` pair up one-to-one under pairwise
/// equivalence. Lists of different lengths never do.
pub fn one_to_one<E: AlgebraEngine>(
    matcher: &dyn EquationMatcher,
    engine: &E,
    ctx: &mut Context,
    list_a: &[Equation],
    list_b: &[Equation],
) -> bool {
    if list_a.len() != list_b.len() {
        debug!(
            left = list_a.len(),
            right = list_b.len(),
            "equation counts differ"
        );
        return false;
    }
    let mut related =
        |a: usize, b: usize| equations_equivalent(engine, ctx, &list_a[a], &list_b[b]);
    let matched = matcher
        .assign(list_a.len(), list_b.len(), &mut related)
        .is_some();
    debug!(matcher = matcher.name(), matched, "one-to-one matching");
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CasEngine;
    use cas_parser::parse_equation;

    fn table<'a>(rows: &'a [&'a [bool]]) -> impl FnMut(usize, usize) -> bool + 'a {
        move |a, b| rows[a][b]
    }

    #[test]
    fn greedy_pairs_in_order() {
        let rows: &[&[bool]] = &[&[false, true], &[true, false]];
        let mut rel = table(rows);
        assert_eq!(GreedyMatcher.assign(2, 2, &mut rel), Some(vec![1, 0]));
    }

    #[test]
    fn greedy_misses_matchings_that_need_backtracking() {
        // a0 relates to both b0 and b1, a1 only to b0. Greedy hands a0 to b0
        // and then has nothing left for b1.
        let rows: &[&[bool]] = &[&[true, true], &[true, false]];
        let mut rel = table(rows);
        assert_eq!(GreedyMatcher.assign(2, 2, &mut rel), None);

        let mut rel = table(rows);
        assert_eq!(ExactMatcher.assign(2, 2, &mut rel), Some(vec![1, 0]));
    }

    #[test]
    fn exact_reports_missing_perfect_matching() {
        let rows: &[&[bool]] = &[&[true, true, false], &[true, true, false], &[true, true, false]];
        let mut rel = table(rows);
        assert_eq!(ExactMatcher.assign(3, 3, &mut rel), None);
    }

    #[test]
    fn exact_evaluates_each_pair_at_most_once() {
        let mut calls = vec![0usize; 9];
        let mut rel = |a: usize, b: usize| {
            calls[a * 3 + b] += 1;
            a == (b + 1) % 3 || a == b
        };
        assert!(ExactMatcher.assign(3, 3, &mut rel).is_some());
        assert!(calls.iter().all(|&n| n <= 1));
    }

    #[test]
    fn one_to_one_over_equations() {
        let mut ctx = Context::new();
        let a: Vec<Equation> = ["h = q / A", "V = A * h"]
            .iter()
            .map(|l| parse_equation(l, &mut ctx).unwrap())
            .collect();
        let b: Vec<Equation> = ["h * A = V", "q = h * A"]
            .iter()
            .map(|l| parse_equation(l, &mut ctx).unwrap())
            .collect();
        let engine = CasEngine::default();
        assert!(one_to_one(&GreedyMatcher, &engine, &mut ctx, &a, &b));
        assert!(one_to_one(&ExactMatcher, &engine, &mut ctx, &a, &b));
        assert!(!one_to_one(&GreedyMatcher, &engine, &mut ctx, &a, &b[..1]));
    }

    #[test]
    fn matcher_kind_builds_named_matchers() {
        assert_eq!(MatcherKind::Greedy.build().name(), "greedy");
        assert_eq!(MatcherKind::Exact.build().name(), "exact");
    }
}
