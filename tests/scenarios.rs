//! End-to-end scenarios over the public API.

use robdd::{Bdd, BddConfig, Lit, Ref, ReorderMethod, Var};

fn setup(n: usize) -> (Bdd, Vec<Ref>) {
    let bdd = Bdd::default();
    bdd.set_var_num(n).unwrap();
    let vars = (0..n as u32).map(|i| bdd.ith_var(Var::new(i)).unwrap()).collect();
    (bdd, vars)
}

// ─── Small scenarios ───────────────────────────────────────────────────────────

#[test]
fn conjunction_count() {
    let (bdd, x) = setup(3);
    let f = bdd.apply_and(x[0], x[1]).unwrap();
    assert_eq!(bdd.sat_count(f).unwrap(), 2.0);
}

#[test]
fn complementary_literals() {
    let bdd = Bdd::default();
    bdd.set_var_num(1).unwrap();
    let f = bdd.ith_var(Var::new(0)).unwrap();
    let g = bdd.nith_var(Var::new(0)).unwrap();
    assert_eq!(bdd.apply_and(f, g).unwrap(), bdd.zero());
    assert_eq!(bdd.apply_or(f, g).unwrap(), bdd.one());
}

#[test]
fn sat_one_implies_function() {
    let (bdd, x) = setup(3);
    let f = bdd.apply_xor(x[0], x[1]).unwrap();
    let cube = bdd.sat_one(f).unwrap();
    assert!(!bdd.is_zero(cube));
    // Every extension of the partial assignment satisfies `f`.
    assert_eq!(bdd.apply_imp(cube, f).unwrap(), bdd.one());
    assert_eq!(bdd.print_set(cube).unwrap(), "<x0:0, x1:1>");
}

#[test]
fn replace_renames_variables() {
    let (bdd, x) = setup(4);
    let mut pairing = bdd.make_pair();
    pairing.set_var(Var::new(0), Var::new(2));
    pairing.set_var(Var::new(1), Var::new(3));
    let f = bdd.apply_and(x[0], x[1]).unwrap();
    let g = bdd.replace(f, &pairing).unwrap();
    assert_eq!(g, bdd.apply_and(x[2], x[3]).unwrap());
}

// ─── N-queens ──────────────────────────────────────────────────────────────────

/// Conjunction of the N-queens constraints over `n * n` variables, referenced.
///
/// Variable `i * n + j` is true iff a queen stands on row `i`, column `j`.
fn queens(bdd: &Bdd, n: usize) -> Ref {
    bdd.set_var_num(n * n).unwrap();
    let q = |i: usize, j: usize| Var::new((i * n + j) as u32);

    let mut res = bdd.add_ref(bdd.one()).unwrap();
    let mut conjoin = |c: Ref| {
        let next = bdd.add_ref(bdd.apply_and(res, c).unwrap()).unwrap();
        bdd.del_ref(res).unwrap();
        res = next;
    };

    for i in 0..n {
        let row = (0..n).map(|j| Lit::pos(q(i, j)));
        conjoin(bdd.mk_clause(row).unwrap());
    }
    for i1 in 0..n {
        for j1 in 0..n {
            for i2 in 0..n {
                for j2 in 0..n {
                    if (i1, j1) >= (i2, j2) {
                        continue;
                    }
                    let same_row = i1 == i2;
                    let same_col = j1 == j2;
                    let same_diag = i1.abs_diff(i2) == j1.abs_diff(j2);
                    if same_row || same_col || same_diag {
                        conjoin(bdd.mk_clause([Lit::neg(q(i1, j1)), Lit::neg(q(i2, j2))]).unwrap());
                    }
                }
            }
        }
    }
    res
}

#[test]
fn queens_6() {
    let bdd = Bdd::default();
    let f = queens(&bdd, 6);
    assert_eq!(bdd.sat_count(f).unwrap(), 4.0);
    assert_eq!(bdd.sat_count_exact(f).unwrap(), 4u32.into());
}

#[test]
fn queens_8() {
    let bdd = Bdd::default();
    let f = queens(&bdd, 8);
    assert_eq!(bdd.sat_count(f).unwrap(), 92.0);
    assert_eq!(bdd.all_sat(f).unwrap().count(), 92);
}

#[test]
fn queens_with_small_table() {
    let config = BddConfig::default()
        .with_node_table_size(256)
        .with_cache_size(256)
        .with_max_increase(1000);
    let bdd = Bdd::with_config(config);
    let f = queens(&bdd, 6);
    assert_eq!(bdd.sat_count(f).unwrap(), 4.0);
    let stats = bdd.stats();
    assert!(stats.gc_count > 0);
    assert!(stats.capacity > 256);
}

#[test]
fn queens_with_node_limit() {
    let config = BddConfig::default()
        .with_node_table_size(64)
        .with_cache_size(64)
        .with_max_node_num(128);
    let bdd = Bdd::with_config(config);
    bdd.set_var_num(36).unwrap();
    let x: Vec<Ref> = (0..36).map(|i| bdd.ith_var(Var::new(i)).unwrap()).collect();
    let terms: Vec<Ref> = (0..18)
        .map(|i| bdd.add_ref(bdd.apply_and(x[i], x[i + 18]).unwrap()).unwrap())
        .collect();
    // (x0 & x18) | (x1 & x19) | ... needs far more than 128 nodes in this order.
    let mut acc = bdd.zero();
    let mut failure = None;
    for &term in &terms {
        match bdd.apply_or(acc, term) {
            Ok(next) => acc = bdd.add_ref(next).unwrap(),
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }
    let err = failure.expect("the node limit was never reached");
    assert_eq!(err.kind(), robdd::ErrorKind::ResourceExhausted);
    // The manager is still usable.
    assert_eq!(bdd.apply_and(x[0], -x[0]).unwrap(), bdd.zero());
}

#[test]
fn queens_with_auto_reorder() {
    let bdd = Bdd::default();
    bdd.set_reorder_threshold(500);
    bdd.auto_reorder(ReorderMethod::Sift, None);
    bdd.enable_reorder();
    let f = queens(&bdd, 6);
    assert!(bdd.stats().reorders > 0);
    assert_eq!(bdd.sat_count(f).unwrap(), 4.0);

    bdd.disable_reorder();
    let before = bdd.stats().reorders;
    let g = bdd.apply_not(f).unwrap();
    assert_eq!(bdd.stats().reorders, before);
    assert_eq!(bdd.sat_count(g).unwrap(), 2f64.powi(36) - 4.0);
}

#[test]
fn queens_manual_reorder() {
    let bdd = Bdd::default();
    let f = queens(&bdd, 5);
    let stats = bdd.reorder(ReorderMethod::SiftIte).unwrap();
    assert!(stats.nodes_after <= stats.nodes_before);
    assert_eq!(bdd.reorder_gain(), stats.gain());
    assert_eq!(bdd.sat_count(f).unwrap(), 10.0);
}
