//! N-queens benchmarks: construction, counting and reordering.
//!
//! Run with:
//! ```bash
//! cargo bench --bench queens
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use robdd::{Bdd, Lit, Ref, ReorderMethod, Var};

/// Conjunction of the N-queens constraints, referenced.
fn solve_queens(bdd: &Bdd, n: usize) -> Ref {
    bdd.set_var_num(n * n).unwrap();
    let q = |i: usize, j: usize| Var::new((i * n + j) as u32);

    let mut clauses: Vec<Vec<Lit>> = Vec::new();
    for i in 0..n {
        clauses.push((0..n).map(|j| Lit::pos(q(i, j))).collect());
    }
    for i1 in 0..n {
        for j1 in 0..n {
            for i2 in i1..n {
                for j2 in 0..n {
                    if (i1, j1) >= (i2, j2) {
                        continue;
                    }
                    if i1 == i2 || j1 == j2 || i1.abs_diff(i2) == j1.abs_diff(j2) {
                        clauses.push(vec![Lit::neg(q(i1, j1)), Lit::neg(q(i2, j2))]);
                    }
                }
            }
        }
    }

    let mut res = bdd.add_ref(bdd.one()).unwrap();
    for clause in clauses {
        let c = bdd.mk_clause(clause).unwrap();
        let next = bdd.add_ref(bdd.apply_and(res, c).unwrap()).unwrap();
        bdd.del_ref(res).unwrap();
        res = next;
    }
    res
}

/// Random 3-CNF over `vars` variables, referenced.
fn random_cnf(bdd: &Bdd, rng: &mut ChaCha8Rng, vars: usize, clauses: usize) -> Ref {
    bdd.set_var_num(vars).unwrap();
    let mut res = bdd.add_ref(bdd.one()).unwrap();
    for _ in 0..clauses {
        let lits: Vec<Lit> = (0..3)
            .map(|_| {
                let v = Var::new(rng.random_range(0..vars as u32));
                if rng.random() {
                    Lit::pos(v)
                } else {
                    Lit::neg(v)
                }
            })
            .collect();
        let c = bdd.mk_clause(lits).unwrap();
        let next = bdd.add_ref(bdd.apply_and(res, c).unwrap()).unwrap();
        bdd.del_ref(res).unwrap();
        res = next;
    }
    res
}

fn bench_queens(c: &mut Criterion) {
    let mut group = c.benchmark_group("queens");
    group.sample_size(10);
    for n in [4, 5, 6, 7] {
        group.bench_with_input(BenchmarkId::new("build", n), &n, |b, &n| {
            b.iter(|| {
                let bdd = Bdd::default();
                let f = solve_queens(&bdd, n);
                bdd.sat_count(f).unwrap()
            });
        });
    }
    group.finish();
}

fn bench_reorder(c: &mut Criterion) {
    let mut group = c.benchmark_group("reorder");
    group.sample_size(10);
    for method in [ReorderMethod::Win2, ReorderMethod::Win3, ReorderMethod::Sift, ReorderMethod::Random] {
        group.bench_with_input(BenchmarkId::new("queens-6", method), &method, |b, &method| {
            b.iter_with_setup(
                || {
                    let bdd = Bdd::default();
                    solve_queens(&bdd, 6);
                    bdd
                },
                |bdd| bdd.reorder(method).unwrap(),
            );
        });
    }
    group.finish();
}

fn bench_counting(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let bdd = Bdd::default();
    let f = random_cnf(&bdd, &mut rng, 40, 120);

    let mut group = c.benchmark_group("counting");
    group.bench_function("sat_count", |b| b.iter(|| bdd.sat_count(f).unwrap()));
    group.bench_function("sat_count_exact", |b| b.iter(|| bdd.sat_count_exact(f).unwrap()));
    group.bench_function("path_count", |b| b.iter(|| bdd.path_count(f).unwrap()));
    group.finish();
}

criterion_group!(benches, bench_queens, bench_reorder, bench_counting);
criterion_main!(benches);
