//! N-queens with optional dynamic reordering.
//!
//! Run with:
//! ```bash
//! cargo run --release --example queens -- 8 --reorder sift
//! ```

use std::ops::ControlFlow;

use clap::Parser;
use log::info;

use robdd::hooks::{GcPhase, GcStats, ReorderEvent, ReorderPhase};
use robdd::{Bdd, BddConfig, Lit, Ref, ReorderMethod, Var};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of queens.
    #[arg(value_name = "INT", default_value = "8")]
    n: usize,

    /// Initial node table size.
    #[clap(long, value_name = "INT", default_value = "10000")]
    size: usize,

    /// Operation cache size.
    #[clap(long, value_name = "INT", default_value = "10000")]
    cache: usize,

    /// Automatic reordering method (none, win2, win2ite, win3, win3ite, sift, siftite, random).
    #[clap(long, value_name = "METHOD", default_value = "none")]
    reorder: ReorderMethod,

    /// Live node count that triggers the first automatic reordering.
    #[clap(long, value_name = "INT", default_value = "10000")]
    threshold: usize,

    /// Print every solution.
    #[clap(long)]
    print: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    info!("args = {:?}", args);

    let config = BddConfig::new(args.size, args.cache).with_reorder_threshold(args.threshold);
    let bdd = Bdd::with_config(config);
    bdd.set_gc_hook(Some(Box::new(|phase: GcPhase, stats: &GcStats| {
        if phase == GcPhase::After {
            info!("{}", stats);
        }
    })));
    bdd.set_reorder_hook(Some(Box::new(|event: &ReorderEvent| {
        if event.phase != ReorderPhase::Progress {
            info!("reorder {:?}: {} nodes after {} swaps", event.phase, event.nodes, event.swaps);
        }
        ControlFlow::Continue(())
    })));
    if args.reorder != ReorderMethod::None {
        bdd.auto_reorder(args.reorder, None);
        bdd.enable_reorder();
        bdd.reorder_verbose(1);
    }

    // Variable `i * n + j` is true iff a queen stands on row `i`, column `j`.
    let n = args.n;
    bdd.set_var_num(n * n)?;
    let q = |i: usize, j: usize| Var::new((i * n + j) as u32);

    info!("Encoding {}-queens", n);
    let mut res = bdd.add_ref(bdd.one())?;
    let mut conjoin = |c: Ref| -> color_eyre::Result<()> {
        let next = bdd.add_ref(bdd.apply_and(res, c)?)?;
        bdd.del_ref(res)?;
        res = next;
        Ok(())
    };

    // At least one queen per row:
    for i in 0..n {
        conjoin(bdd.mk_clause((0..n).map(|j| Lit::pos(q(i, j))))?)?;
    }
    // No two queens attack each other:
    for i1 in 0..n {
        for j1 in 0..n {
            for i2 in i1..n {
                for j2 in 0..n {
                    if (i1, j1) >= (i2, j2) {
                        continue;
                    }
                    if i1 == i2 || j1 == j2 || i1.abs_diff(i2) == j1.abs_diff(j2) {
                        conjoin(bdd.mk_clause([Lit::neg(q(i1, j1)), Lit::neg(q(i2, j2))])?)?;
                    }
                }
            }
        }
    }

    info!("Result: {} nodes", bdd.node_count(res)?);
    info!("Solutions: {}", bdd.sat_count_exact(res)?);
    if args.print {
        for path in bdd.all_sat(res)? {
            let queens: Vec<String> = path
                .iter()
                .enumerate()
                .filter(|(_, &v)| v == Some(true))
                .map(|(k, _)| format!("({}, {})", k / n, k % n))
                .collect();
            println!("{}", queens.join(" "));
        }
    }
    println!("{}", bdd.stats());
    bdd.del_ref(res)?;

    let time_total = time_total.elapsed();
    println!("Done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
