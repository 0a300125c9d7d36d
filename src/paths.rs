//! Lazy enumeration of the satisfying paths of a BDD.
//!
//! Each path is a partial assignment: a vector indexed by variable id where
//! `None` marks a variable that does not occur on the path (a "don't care"
//! standing for both values). Paths are produced top-down, the low branch
//! of every node before its high branch.
//!
//! ```
//! use robdd::bdd::Bdd;
//! use robdd::types::Var;
//!
//! let bdd = Bdd::default();
//! bdd.set_var_num(3).unwrap();
//! let x = bdd.ith_var(Var::new(0)).unwrap();
//! let y = bdd.ith_var(Var::new(1)).unwrap();
//!
//! let f = bdd.apply_xor(x, y).unwrap();
//! let paths: Vec<_> = bdd.all_sat(f).unwrap().collect();
//! assert_eq!(
//!     paths,
//!     vec![
//!         vec![Some(false), Some(true), None],
//!         vec![Some(true), Some(false), None],
//!     ]
//! );
//! ```

use crate::bdd::Bdd;
use crate::error::Result;
use crate::reference::Ref;
use crate::types::Var;

impl Bdd {
    /// Returns an iterator over all satisfying paths of `f`.
    ///
    /// The iterator holds an external reference to `f` until it is dropped.
    /// While it is alive the variable order is frozen: automatic reordering
    /// is skipped and explicit reordering fails with `InvalidArgument`.
    pub fn all_sat(&self, f: Ref) -> Result<AllSat<'_>> {
        self.add_ref(f)?;
        Ok(AllSat::new(self, f))
    }
}

/// Which branch of a node to explore next.
#[derive(Debug, Clone, Copy)]
enum Branch {
    Low,
    High,
    Done,
}

#[derive(Debug)]
struct Frame {
    node: Ref,
    var: Var,
    next: Branch,
}

/// Iterator returned by [`Bdd::all_sat`].
pub struct AllSat<'a> {
    bdd: &'a Bdd,
    root: Ref,
    stack: Vec<Frame>,
    /// Current partial assignment, by variable id.
    path: Vec<Option<bool>>,
    pending: Option<Ref>,
}

impl<'a> AllSat<'a> {
    fn new(bdd: &'a Bdd, f: Ref) -> Self {
        bdd.reorder.borrow_mut().frozen += 1;
        Self {
            bdd,
            root: f,
            stack: Vec::new(),
            path: vec![None; bdd.var_num()],
            pending: Some(f),
        }
    }
}

impl Iterator for AllSat<'_> {
    type Item = Vec<Option<bool>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // Descend into a freshly reached node.
            if let Some(node) = self.pending.take() {
                if node == Ref::ONE {
                    return Some(self.path.clone());
                }
                if node != Ref::ZERO {
                    let var = self.bdd.table.borrow().variable(node.id());
                    self.stack.push(Frame {
                        node,
                        var,
                        next: Branch::Low,
                    });
                }
                continue;
            }

            let frame = self.stack.last_mut()?;
            let (low, high) = self.bdd.cofactors(frame.node);
            match frame.next {
                Branch::Low => {
                    frame.next = Branch::High;
                    self.path[frame.var.index()] = Some(false);
                    self.pending = Some(low);
                }
                Branch::High => {
                    frame.next = Branch::Done;
                    self.path[frame.var.index()] = Some(true);
                    self.pending = Some(high);
                }
                Branch::Done => {
                    self.path[frame.var.index()] = None;
                    self.stack.pop();
                }
            }
        }
    }
}

impl Drop for AllSat<'_> {
    fn drop(&mut self) {
        self.bdd.reorder.borrow_mut().frozen -= 1;
        let _ = self.bdd.del_ref(self.root);
    }
}
