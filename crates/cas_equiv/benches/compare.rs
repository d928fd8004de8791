//! Full comparisons of small process models, from parsing to verdict.

use cas_ast::Context;
use cas_equiv::{EquationGroup, EquivOptions, Judge, MatcherKind};
use cas_parser::parse_equation;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const TANKS_A: [&str; 4] = [
    "der(h_1) = (q_0 - q_1) / A_1",
    "q_1 = h_1 / R_1",
    "der(h_2) = (q_1 - q_2) / A_2",
    "q_2 = h_2 / R_2",
];

const TANKS_B: [&str; 3] = [
    "A_1 * der(h_1) = q_0 - f",
    "f = h_1 / R_1",
    "A_2 * der(h_2) = f - h_2 / R_2",
];

const STORAGE_A: [&str; 3] = [
    "der(V) = q_in - q_out",
    "V = A * h",
    "q_out = k * sqrt(h)",
];

const STORAGE_B: [&str; 1] = ["der(V) = q_in - k * sqrt(V / A)"];

fn group(ctx: &mut Context, lines: &[&str]) -> EquationGroup {
    let eqs = lines
        .iter()
        .map(|l| parse_equation(l, ctx).expect("benchmark input parses"))
        .collect();
    EquationGroup::new(ctx, eqs).expect("benchmark groups are non-empty")
}

fn compare(judge: &Judge, a: &[&str], b: &[&str]) -> bool {
    let mut ctx = Context::new();
    let ga = group(&mut ctx, a);
    let gb = group(&mut ctx, b);
    judge.equivalent(&mut ctx, &ga, &gb)
}

fn bench_compare(c: &mut Criterion) {
    let greedy = Judge::new(EquivOptions::default());
    let exact = Judge::new(EquivOptions {
        matcher: MatcherKind::Exact,
        ..EquivOptions::default()
    });

    let mut group = c.benchmark_group("compare");
    group.bench_function("two_tanks_greedy", |b| {
        b.iter(|| compare(&greedy, black_box(&TANKS_A), black_box(&TANKS_B)))
    });
    group.bench_function("two_tanks_exact", |b| {
        b.iter(|| compare(&exact, black_box(&TANKS_A), black_box(&TANKS_B)))
    });
    group.bench_function("liquid_storage", |b| {
        b.iter(|| compare(&greedy, black_box(&STORAGE_A), black_box(&STORAGE_B)))
    });
    group.finish();
}

criterion_group!(benches, bench_compare);
criterion_main!(benches);
