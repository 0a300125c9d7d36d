//! # robdd: Reduced Ordered Binary Decision Diagrams
//!
//! **`robdd`** is a manager-centric library for building and manipulating
//! **Reduced Ordered Binary Decision Diagrams** with complement edges,
//! explicit reference counting, garbage collection and dynamic variable
//! reordering.
//!
//! ## What is a BDD?
//!
//! A Binary Decision Diagram represents a boolean function as a directed
//! acyclic graph. For a fixed variable order it is **canonical**: every
//! function has exactly one representation, so equivalence is handle
//! equality and satisfiability is a comparison against `0`.
//!
//! ## Key Features
//!
//! - **One manager, many handles**: all nodes live in a [`Bdd`][crate::bdd::Bdd]
//!   manager and are addressed by small [`Ref`][crate::reference::Ref] handles.
//!   Negation flips a bit in the handle and costs nothing.
//! - **Explicit memory model**: handles survive garbage collection only while
//!   they carry an external reference ([`add_ref`][crate::bdd::Bdd::add_ref]).
//!   A full table is collected, grown, and the interrupted operation restarted.
//! - **Operation cache**: every recursive algorithm memoizes its subproblems.
//! - **Dynamic reordering**: sifting, window permutation and random swaps,
//!   manual or automatic, respecting user-defined variable blocks.
//! - **0-based variables**: variables are numbered `0..var_num()` and start
//!   out in the order of their ids.
//!
//! ## Basic Usage
//!
//! ```rust
//! use robdd::bdd::Bdd;
//! use robdd::types::Var;
//!
//! let bdd = Bdd::default();
//! bdd.set_var_num(2).unwrap();
//!
//! let x0 = bdd.ith_var(Var::new(0)).unwrap();
//! let x1 = bdd.ith_var(Var::new(1)).unwrap();
//!
//! // f = x0 AND (NOT x1), kept alive across garbage collections:
//! let f = bdd.add_ref(bdd.apply_and(x0, -x1).unwrap()).unwrap();
//!
//! assert!(!bdd.is_zero(f));
//! assert!(bdd.eval(f, &[true, false]).unwrap());
//! assert_eq!(bdd.sat_count(f).unwrap(), 1.0);
//!
//! bdd.del_ref(f).unwrap();
//! ```
//!
//! ## Core Components
//!
//! - **[`bdd`]**: the [`Bdd`][crate::bdd::Bdd] manager, variables and handles.
//! - **[`apply`]**: boolean connectives and if-then-else.
//! - **[`quant`]**: quantification and relational products.
//! - **[`subst`]** and **[`pairing`]**: restriction, generalized cofactors,
//!   composition and variable renaming.
//! - **[`sat`]** and **[`paths`]**: satisfying assignments and model counting.
//! - **[`reorder`]** and **[`blocks`]**: dynamic variable reordering.

pub mod apply;
pub mod bdd;
pub mod blocks;
pub mod cache;
pub mod config;
pub mod error;
pub mod gc;
pub mod hooks;
pub mod inspect;
pub mod node;
pub mod order;
pub mod pairing;
pub mod paths;
pub mod quant;
pub mod reference;
pub mod reorder;
pub mod sat;
pub mod subst;
pub mod subtable;
pub mod table;
pub mod types;
pub mod utils;

pub use crate::apply::BddOp;
pub use crate::bdd::Bdd;
pub use crate::config::BddConfig;
pub use crate::error::{BddError, ErrorKind, Result};
pub use crate::pairing::{Image, Pairing};
pub use crate::reference::Ref;
pub use crate::reorder::{ReorderMethod, ReorderStats};
pub use crate::types::{Level, Lit, Var};
