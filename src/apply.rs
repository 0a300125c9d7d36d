//! Binary Boolean operators, if-then-else and negation.
//!
//! Thanks to complemented edges every one of the ten operators reduces to
//! either conjunction or exclusive-or with some inputs and the output
//! negated, so only those two recursions (plus ITE) are memoized.

use std::fmt;

use log::debug;

use crate::bdd::Bdd;
use crate::cache::OpKey;
use crate::error::{BddError, Result};
use crate::reference::Ref;
use crate::types::Level;

/// Binary Boolean operator.
///
/// The discriminants are the classic operator codes (`and = 0` ... `invimp = 9`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BddOp {
    And = 0,
    Xor = 1,
    Or = 2,
    Nand = 3,
    Nor = 4,
    /// Implication `f → g`.
    Imp = 5,
    /// Equivalence `f ↔ g`.
    Biimp = 6,
    /// Set difference `f ∧ ¬g`.
    Diff = 7,
    /// `¬f ∧ g`.
    Less = 8,
    /// Inverse implication `f ← g`.
    Invimp = 9,
}

/// The two operators that are actually computed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum BaseOp {
    And,
    Xor,
}

impl BddOp {
    pub const ALL: [BddOp; 10] = [
        BddOp::And,
        BddOp::Xor,
        BddOp::Or,
        BddOp::Nand,
        BddOp::Nor,
        BddOp::Imp,
        BddOp::Biimp,
        BddOp::Diff,
        BddOp::Less,
        BddOp::Invimp,
    ];

    /// Truth table of the operator.
    pub fn eval(self, a: bool, b: bool) -> bool {
        match self {
            BddOp::And => a && b,
            BddOp::Xor => a ^ b,
            BddOp::Or => a || b,
            BddOp::Nand => !(a && b),
            BddOp::Nor => !(a || b),
            BddOp::Imp => !a || b,
            BddOp::Biimp => a == b,
            BddOp::Diff => a && !b,
            BddOp::Less => !a && b,
            BddOp::Invimp => a || !b,
        }
    }

    /// `op(f, g) = out ^ base(f ^ nf, g ^ ng)`, as `(base, nf, ng, out)`.
    pub(crate) fn decompose(self) -> (BaseOp, bool, bool, bool) {
        match self {
            BddOp::And => (BaseOp::And, false, false, false),
            BddOp::Xor => (BaseOp::Xor, false, false, false),
            BddOp::Or => (BaseOp::And, true, true, true),
            BddOp::Nand => (BaseOp::And, false, false, true),
            BddOp::Nor => (BaseOp::And, true, true, false),
            BddOp::Imp => (BaseOp::And, false, true, true),
            BddOp::Biimp => (BaseOp::Xor, false, false, true),
            BddOp::Diff => (BaseOp::And, false, true, false),
            BddOp::Less => (BaseOp::And, true, false, false),
            BddOp::Invimp => (BaseOp::And, true, false, true),
        }
    }
}

impl TryFrom<u32> for BddOp {
    type Error = BddError;

    fn try_from(code: u32) -> Result<Self> {
        BddOp::ALL
            .get(code as usize)
            .copied()
            .ok_or_else(|| BddError::invalid_argument(format!("unsupported operator code {}", code)))
    }
}

impl fmt::Display for BddOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BddOp::And => "and",
            BddOp::Xor => "xor",
            BddOp::Or => "or",
            BddOp::Nand => "nand",
            BddOp::Nor => "nor",
            BddOp::Imp => "imp",
            BddOp::Biimp => "biimp",
            BddOp::Diff => "diff",
            BddOp::Less => "less",
            BddOp::Invimp => "invimp",
        };
        f.write_str(name)
    }
}

impl Bdd {
    /// Top level of two functions together with their cofactors at that level.
    #[inline]
    pub(crate) fn split2(&self, f: Ref, g: Ref) -> (Level, (Ref, Ref), (Ref, Ref)) {
        let top = self.level_of(f).min(self.level_of(g));
        (top, self.cofactors_at(f, top), self.cofactors_at(g, top))
    }

    pub(crate) fn and_rec(&self, f: Ref, g: Ref) -> Result<Ref> {
        if f == Ref::ZERO || g == Ref::ZERO || f == -g {
            return Ok(Ref::ZERO);
        }
        if f == Ref::ONE || f == g {
            return Ok(g);
        }
        if g == Ref::ONE {
            return Ok(f);
        }

        let (f, g) = if f <= g { (f, g) } else { (g, f) };
        let key = OpKey::And(f, g);
        if let Some(res) = self.cache.borrow().get(&key) {
            return Ok(res);
        }

        let (top, (f0, f1), (g0, g1)) = self.split2(f, g);
        let low = self.and_rec(f0, g0)?;
        let high = self.and_rec(f1, g1)?;
        let res = self.mk_at(top, low, high)?;

        self.cache.borrow_mut().insert(key, res);
        Ok(res)
    }

    pub(crate) fn xor_rec(&self, f: Ref, g: Ref) -> Result<Ref> {
        if f == g {
            return Ok(Ref::ZERO);
        }
        if f == -g {
            return Ok(Ref::ONE);
        }
        if f == Ref::ZERO {
            return Ok(g);
        }
        if g == Ref::ZERO {
            return Ok(f);
        }
        if f == Ref::ONE {
            return Ok(-g);
        }
        if g == Ref::ONE {
            return Ok(-f);
        }

        // xor(~F,G) == xor(F,~G) == ~xor(F,G)
        let n = f.is_negated() ^ g.is_negated();
        let (f, g) = (f.regular(), g.regular());
        let (f, g) = if f <= g { (f, g) } else { (g, f) };

        let key = OpKey::Xor(f, g);
        if let Some(res) = self.cache.borrow().get(&key) {
            return Ok(res.negate_if(n));
        }

        let (top, (f0, f1), (g0, g1)) = self.split2(f, g);
        let low = self.xor_rec(f0, g0)?;
        let high = self.xor_rec(f1, g1)?;
        let res = self.mk_at(top, low, high)?;

        self.cache.borrow_mut().insert(key, res);
        Ok(res.negate_if(n))
    }

    pub(crate) fn or_rec(&self, f: Ref, g: Ref) -> Result<Ref> {
        Ok(-self.and_rec(-f, -g)?)
    }

    pub(crate) fn op_rec(&self, op: BddOp, f: Ref, g: Ref) -> Result<Ref> {
        let (base, nf, ng, out) = op.decompose();
        let (f, g) = (f.negate_if(nf), g.negate_if(ng));
        let res = match base {
            BaseOp::And => self.and_rec(f, g)?,
            BaseOp::Xor => self.xor_rec(f, g)?,
        };
        Ok(res.negate_if(out))
    }

    pub(crate) fn ite_rec(&self, f: Ref, g: Ref, h: Ref) -> Result<Ref> {
        // Base cases:
        //   ite(1,G,H) => G
        //   ite(0,G,H) => H
        if f == Ref::ONE {
            return Ok(g);
        }
        if f == Ref::ZERO {
            return Ok(h);
        }

        // More base cases:
        //   ite(F,G,G) => G
        //   ite(F,1,0) => F
        //   ite(F,0,1) => ~F
        //   ite(F,1,~F) => 1
        //   ite(F,F,1) => 1
        //   ite(F,~F,0) => 0
        //   ite(F,0,F) => F
        if g == h {
            return Ok(g);
        }
        if g == Ref::ONE && h == Ref::ZERO {
            return Ok(f);
        }
        if g == Ref::ZERO && h == Ref::ONE {
            return Ok(-f);
        }
        if g == Ref::ONE && h == -f {
            return Ok(Ref::ONE);
        }
        if g == f && h == Ref::ONE {
            return Ok(Ref::ONE);
        }
        if g == -f && h == Ref::ZERO {
            return Ok(Ref::ZERO);
        }
        if g == Ref::ZERO && h == f {
            return Ok(f);
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,~F) => ite(F,G,1)
        if g == f {
            return self.ite_rec(f, Ref::ONE, h);
        }
        if h == f {
            return self.ite_rec(f, g, Ref::ZERO);
        }
        if g == -f {
            return self.ite_rec(f, Ref::ZERO, h);
        }
        if h == -f {
            return self.ite_rec(f, g, Ref::ONE);
        }

        let i = self.level_of(f);
        let j = self.level_of(g);
        let k = self.level_of(h);

        // Equivalent pairs (choose the one with the topmost first argument):
        //   ite(F,1,H) == ite(H,1,F) == F ∨ H
        //   ite(F,G,0) == ite(G,F,0) == F ∧ G
        //   ite(F,G,1) == ite(~G,~F,1) == F -> G
        //   ite(F,0,H) == ite(~H,0,~F) == ~F ∧ H
        //   ite(F,G,~G) == ite(G,F,~F)
        if g == Ref::ONE && k < i {
            return self.ite_rec(h, Ref::ONE, f);
        }
        if h == Ref::ZERO && j < i {
            return self.ite_rec(g, f, Ref::ZERO);
        }
        if h == Ref::ONE && j < i {
            return self.ite_rec(-g, -f, Ref::ONE);
        }
        if g == Ref::ZERO && k < i {
            return self.ite_rec(-h, Ref::ZERO, -f);
        }
        if g == -h && j < i {
            return self.ite_rec(g, f, -f);
        }

        // Make sure the first two arguments are regular:
        //   ite(~F,G,H) => ite(F,H,G)
        //   ite(F,~G,H) => ~ite(F,G,~H)
        let (mut f, mut g, mut h) = (f, g, h);
        if f.is_negated() {
            f = -f;
            std::mem::swap(&mut g, &mut h);
        }
        let n = g.is_negated();
        if n {
            g = -g;
            h = -h;
        }

        let key = OpKey::Ite(f, g, h);
        if let Some(res) = self.cache.borrow().get(&key) {
            return Ok(res.negate_if(n));
        }

        let top = self.level_of(f).min(self.level_of(g)).min(self.level_of(h));
        let (f0, f1) = self.cofactors_at(f, top);
        let (g0, g1) = self.cofactors_at(g, top);
        let (h0, h1) = self.cofactors_at(h, top);

        let e = self.ite_rec(f0, g0, h0)?;
        let t = self.ite_rec(f1, g1, h1)?;
        let res = self.mk_at(top, e, t)?;

        self.cache.borrow_mut().insert(key, res);
        Ok(res.negate_if(n))
    }
}

impl Bdd {
    /// Combines `f` and `g` with a binary operator.
    pub fn apply(&self, op: BddOp, f: Ref, g: Ref) -> Result<Ref> {
        debug!("apply(op = {}, f = {}, g = {})", op, f, g);
        self.run_op("apply", &[f, g], |bdd| bdd.op_rec(op, f, g))
    }

    /// `*f = op(*f, g)`, moving references.
    ///
    /// Both `*f` and `g` are expected to carry one external reference each;
    /// those are released and the result is referenced in place of `*f`.
    pub fn apply_with(&self, op: BddOp, f: &mut Ref, g: Ref) -> Result<()> {
        let res = self.apply(op, *f, g)?;
        self.add_ref(res)?;
        self.del_ref(*f)?;
        self.del_ref(g)?;
        *f = res;
        Ok(())
    }

    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(f, g, h) = (f ∧ g) ∨ (¬f ∧ h)
    /// ```
    ///
    /// ```
    /// use robdd::bdd::Bdd;
    /// use robdd::types::Var;
    ///
    /// let bdd = Bdd::default();
    /// bdd.set_var_num(3).unwrap();
    /// let x = bdd.ith_var(Var::new(0)).unwrap();
    /// let y = bdd.ith_var(Var::new(1)).unwrap();
    /// let z = bdd.ith_var(Var::new(2)).unwrap();
    /// let f = bdd.apply_ite(x, y, z).unwrap();
    /// assert_eq!(f, bdd.mk_node(Var::new(0), z, y).unwrap());
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Result<Ref> {
        debug!("apply_ite(f = {}, g = {}, h = {})", f, g, h);
        self.run_op("ite", &[f, g, h], |bdd| bdd.ite_rec(f, g, h))
    }

    pub fn apply_not(&self, f: Ref) -> Result<Ref> {
        self.check_live()?;
        self.check_ref(f)?;
        Ok(-f)
    }

    pub fn apply_and(&self, f: Ref, g: Ref) -> Result<Ref> {
        self.apply(BddOp::And, f, g)
    }

    pub fn apply_or(&self, f: Ref, g: Ref) -> Result<Ref> {
        self.apply(BddOp::Or, f, g)
    }

    pub fn apply_xor(&self, f: Ref, g: Ref) -> Result<Ref> {
        self.apply(BddOp::Xor, f, g)
    }

    pub fn apply_imp(&self, f: Ref, g: Ref) -> Result<Ref> {
        self.apply(BddOp::Imp, f, g)
    }

    pub fn apply_biimp(&self, f: Ref, g: Ref) -> Result<Ref> {
        self.apply(BddOp::Biimp, f, g)
    }

    /// Conjunction of all `nodes`; the running result is kept referenced.
    pub fn apply_and_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Result<Ref> {
        self.fold_many(BddOp::And, Ref::ONE, nodes)
    }

    /// Disjunction of all `nodes`; the running result is kept referenced.
    pub fn apply_or_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Result<Ref> {
        self.fold_many(BddOp::Or, Ref::ZERO, nodes)
    }

    fn fold_many(&self, op: BddOp, init: Ref, nodes: impl IntoIterator<Item = Ref>) -> Result<Ref> {
        let mut res = self.add_ref(init)?;
        for node in nodes {
            let next = self.apply(op, res, node);
            self.del_ref(res)?;
            res = self.add_ref(next?)?;
        }
        self.del_ref(res)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::types::Var;

    fn setup(n: usize) -> (Bdd, Vec<Ref>) {
        let bdd = Bdd::default();
        bdd.set_var_num(n).unwrap();
        let vars = (0..n as u32).map(|i| bdd.ith_var(Var::new(i)).unwrap()).collect();
        (bdd, vars)
    }

    #[test]
    fn test_op_codes() {
        for (code, op) in BddOp::ALL.iter().enumerate() {
            assert_eq!(BddOp::try_from(code as u32).unwrap(), *op);
            assert_eq!(*op as usize, code);
        }
        assert!(BddOp::try_from(10).is_err());
    }

    #[test]
    fn test_decompose_matches_truth_table() {
        for op in BddOp::ALL {
            let (base, nf, ng, out) = op.decompose();
            for a in [false, true] {
                for b in [false, true] {
                    let (x, y) = (a ^ nf, b ^ ng);
                    let r = match base {
                        BaseOp::And => x && y,
                        BaseOp::Xor => x ^ y,
                    };
                    assert_eq!(r ^ out, op.eval(a, b), "{} on ({}, {})", op, a, b);
                }
            }
        }
    }

    #[test]
    fn test_and_or_constants() {
        let (bdd, x) = setup(1);
        assert_eq!(bdd.apply_and(x[0], -x[0]).unwrap(), bdd.zero());
        assert_eq!(bdd.apply_or(x[0], -x[0]).unwrap(), bdd.one());
        assert_eq!(bdd.apply_and(x[0], x[0]).unwrap(), x[0]);
        assert_eq!(bdd.apply_xor(x[0], x[0]).unwrap(), bdd.zero());
        assert_eq!(bdd.apply_biimp(x[0], x[0]).unwrap(), bdd.one());
    }

    #[test]
    fn test_de_morgan() {
        let (bdd, x) = setup(3);
        let f = bdd.apply_or(x[0], x[2]).unwrap();
        let g = bdd.apply_and(-x[0], -x[2]).unwrap();
        assert_eq!(f, -g);
        let h = bdd.apply(BddOp::Nor, x[0], x[2]).unwrap();
        assert_eq!(h, g);
    }

    #[test]
    fn test_ite_matches_definition() {
        let (bdd, x) = setup(3);
        let ite = bdd.apply_ite(x[0], x[1], x[2]).unwrap();
        let a = bdd.apply_and(x[0], x[1]).unwrap();
        let b = bdd.apply_and(-x[0], x[2]).unwrap();
        assert_eq!(ite, bdd.apply_or(a, b).unwrap());

        // Arguments out of order:
        let ite = bdd.apply_ite(x[2], x[0], -x[1]).unwrap();
        let a = bdd.apply_and(x[2], x[0]).unwrap();
        let b = bdd.apply_and(-x[2], -x[1]).unwrap();
        assert_eq!(ite, bdd.apply_or(a, b).unwrap());
    }

    #[test]
    fn test_ite_identities() {
        let (bdd, x) = setup(2);
        let f = bdd.apply_xor(x[0], x[1]).unwrap();
        assert_eq!(bdd.apply_ite(f, bdd.one(), bdd.zero()).unwrap(), f);
        assert_eq!(bdd.apply_not(bdd.apply_not(f).unwrap()).unwrap(), f);
    }

    #[test]
    fn test_apply_with() {
        let (bdd, x) = setup(2);
        let mut f = bdd.add_ref(bdd.apply_or(x[0], x[1]).unwrap()).unwrap();
        let g = bdd.add_ref(bdd.apply_xor(x[0], x[1]).unwrap()).unwrap();
        let old = f;
        bdd.apply_with(BddOp::Diff, &mut f, g).unwrap();
        assert_eq!(f, bdd.apply_and(x[0], x[1]).unwrap());
        assert_eq!(bdd.ref_count(f).unwrap(), 1);
        assert_eq!(bdd.ref_count(old).unwrap(), 0);
        assert_eq!(bdd.ref_count(g).unwrap(), 0);
    }

    #[test]
    fn test_and_many() {
        let (bdd, x) = setup(4);
        let f = bdd.apply_and_many(x.iter().copied()).unwrap();
        let mut assignment = vec![true; 4];
        assert!(bdd.eval(f, &assignment).unwrap());
        assignment[2] = false;
        assert!(!bdd.eval(f, &assignment).unwrap());

        let g = bdd.apply_or_many(x.iter().copied()).unwrap();
        assert!(!bdd.eval(g, &[false; 4]).unwrap());
        assert!(bdd.eval(g, &assignment).unwrap());

        assert_eq!(bdd.apply_and_many([]).unwrap(), bdd.one());
    }
}
