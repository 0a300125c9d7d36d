//! Quantification and fused apply-and-quantify operations.
//!
//! Variable sets are passed as positive cubes (see
//! [`Bdd::make_set`][crate::bdd::Bdd::make_set]). The recursion follows the
//! structure of the operands. For `exist` and `for_all` a quantified
//! variable that does not occur on a path can be skipped there; for unique
//! quantification such a variable makes the whole branch `0`, since
//! `g ⊕ g = 0` for any `g` that does not depend on it.

use log::debug;

use crate::apply::BddOp;
use crate::bdd::Bdd;
use crate::cache::OpKey;
use crate::error::{BddError, Result};
use crate::reference::Ref;
use crate::types::Level;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Quant {
    /// `f|x=0 ∨ f|x=1`
    Exist = 0,
    /// `f|x=0 ∧ f|x=1`
    ForAll = 1,
    /// `f|x=0 ⊕ f|x=1`
    Unique = 2,
}

/// Literals of a cube, indexed by level.
#[derive(Debug, Clone)]
pub(crate) struct LevelSet {
    values: Vec<Option<bool>>,
    /// `before[l]` is the number of literals at levels `< l`.
    before: Vec<usize>,
    last: Option<Level>,
}

impl LevelSet {
    #[inline]
    pub fn get(&self, level: Level) -> Option<bool> {
        self.values.get(level.index()).copied().flatten()
    }

    #[inline]
    pub fn contains(&self, level: Level) -> bool {
        self.get(level).is_some()
    }

    /// Deepest level mentioned by the cube.
    pub fn last(&self) -> Option<Level> {
        self.last
    }

    /// Number of set members above each level, the terminal level last.
    pub fn ranks(&self) -> &[usize] {
        &self.before
    }

    /// Whether the set has a literal at a level in `from..to`.
    pub fn any_in(&self, from: Level, to: Level) -> bool {
        let n = self.values.len();
        let (from, to) = (from.index().min(n), to.index().min(n));
        to > from && self.before[to] > self.before[from]
    }
}

impl Bdd {
    /// Decodes a cube into its literals by level.
    ///
    /// With `positive_only`, negative literals are rejected (variable sets).
    pub(crate) fn cube_levels(&self, cube: Ref, positive_only: bool) -> Result<LevelSet> {
        let mut values = vec![None; self.var_num()];
        let mut last = None;
        let mut cur = cube;
        while !cur.is_const() {
            let level = self.level_of(cur);
            let (low, high) = self.cofactors(cur);
            if low == Ref::ZERO {
                values[level.index()] = Some(true);
                cur = high;
            } else if high == Ref::ZERO && !positive_only {
                values[level.index()] = Some(false);
                cur = low;
            } else {
                return Err(BddError::invalid_argument(format!(
                    "{} is not a {}",
                    cube,
                    if positive_only { "variable set" } else { "cube" }
                )));
            }
            last = Some(level);
        }
        if cur == Ref::ZERO {
            return Err(BddError::invalid_argument("the empty function is not a cube"));
        }
        let mut before = Vec::with_capacity(values.len() + 1);
        before.push(0);
        for v in &values {
            let prev = before[before.len() - 1];
            before.push(prev + v.is_some() as usize);
        }
        Ok(LevelSet { values, before, last })
    }

    fn combine(&self, q: Quant, low: Ref, high: Ref) -> Result<Ref> {
        match q {
            Quant::Exist => self.or_rec(low, high),
            Quant::ForAll => self.and_rec(low, high),
            Quant::Unique => self.xor_rec(low, high),
        }
    }

    pub(crate) fn quant_rec(&self, q: Quant, f: Ref, set: &LevelSet, cube: Ref) -> Result<Ref> {
        if f.is_const() {
            return Ok(f);
        }
        let level = self.level_of(f);
        match set.last() {
            Some(last) if level <= last => {}
            _ => return Ok(f),
        }

        let key = OpKey::Quant(q, f, cube);
        if let Some(res) = self.cache.borrow().get(&key) {
            return Ok(res);
        }

        let (f0, f1) = self.cofactors(f);
        let low = self.quant_child(q, f0, level, set, cube)?;
        let high = self.quant_child(q, f1, level, set, cube)?;
        let res = if set.contains(level) {
            self.combine(q, low, high)?
        } else {
            self.mk_at(level, low, high)?
        };

        self.cache.borrow_mut().insert(key, res);
        Ok(res)
    }

    /// Quantifies a child of a node at `parent`.
    fn quant_child(&self, q: Quant, f: Ref, parent: Level, set: &LevelSet, cube: Ref) -> Result<Ref> {
        if q == Quant::Unique && set.any_in(parent.next(), self.level_of(f)) {
            return Ok(Ref::ZERO);
        }
        self.quant_rec(q, f, set, cube)
    }

    pub(crate) fn app_quant_rec(
        &self,
        op: BddOp,
        q: Quant,
        f: Ref,
        g: Ref,
        set: &LevelSet,
        cube: Ref,
    ) -> Result<Ref> {
        // With a constant operand the operator itself is trivial.
        let top = self.level_of(f).min(self.level_of(g));
        if f.is_const() || g.is_const() {
            let h = self.op_rec(op, f, g)?;
            if q == Quant::Unique && set.any_in(top, self.level_of(h)) {
                return Ok(Ref::ZERO);
            }
            return self.quant_rec(q, h, set, cube);
        }

        match set.last() {
            Some(last) if top <= last => {}
            _ => return self.op_rec(op, f, g),
        }

        let key = OpKey::AppQuant(op, q, f, g, cube);
        if let Some(res) = self.cache.borrow().get(&key) {
            return Ok(res);
        }

        let (f0, f1) = self.cofactors_at(f, top);
        let (g0, g1) = self.cofactors_at(g, top);
        let low = self.app_quant_child(op, q, f0, g0, top, set, cube)?;
        let high = self.app_quant_child(op, q, f1, g1, top, set, cube)?;
        let res = if set.contains(top) {
            self.combine(q, low, high)?
        } else {
            self.mk_at(top, low, high)?
        };

        self.cache.borrow_mut().insert(key, res);
        Ok(res)
    }

    #[allow(clippy::too_many_arguments)]
    fn app_quant_child(
        &self,
        op: BddOp,
        q: Quant,
        f: Ref,
        g: Ref,
        parent: Level,
        set: &LevelSet,
        cube: Ref,
    ) -> Result<Ref> {
        let below = self.level_of(f).min(self.level_of(g));
        if q == Quant::Unique && set.any_in(parent.next(), below) {
            return Ok(Ref::ZERO);
        }
        self.app_quant_rec(op, q, f, g, set, cube)
    }

    fn quantify(&self, q: Quant, f: Ref, vars: Ref) -> Result<Ref> {
        debug!("quantify(q = {:?}, f = {}, vars = {})", q, f, vars);
        self.run_op("quantify", &[f, vars], |bdd| {
            let set = bdd.cube_levels(vars, true)?;
            if q == Quant::Unique && set.any_in(Level::new(0), bdd.level_of(f)) {
                return Ok(Ref::ZERO);
            }
            bdd.quant_rec(q, f, &set, vars)
        })
    }

    fn app_quantify(&self, op: BddOp, q: Quant, f: Ref, g: Ref, vars: Ref) -> Result<Ref> {
        debug!("app_quantify(op = {}, q = {:?}, f = {}, g = {}, vars = {})", op, q, f, g, vars);
        self.run_op("app_quantify", &[f, g, vars], |bdd| {
            let set = bdd.cube_levels(vars, true)?;
            let top = bdd.level_of(f).min(bdd.level_of(g));
            if q == Quant::Unique && set.any_in(Level::new(0), top) {
                return Ok(Ref::ZERO);
            }
            bdd.app_quant_rec(op, q, f, g, &set, vars)
        })
    }

    /// Existential quantification of `f` over the variable set `vars`.
    pub fn exist(&self, f: Ref, vars: Ref) -> Result<Ref> {
        self.quantify(Quant::Exist, f, vars)
    }

    /// Universal quantification of `f` over the variable set `vars`.
    pub fn for_all(&self, f: Ref, vars: Ref) -> Result<Ref> {
        self.quantify(Quant::ForAll, f, vars)
    }

    /// Unique (exclusive-or) quantification of `f` over the variable set `vars`.
    ///
    /// Every variable of `vars` counts, including those `f` does not depend
    /// on: such a variable contributes `f ^ f`, so the result is `0`. BuDDy's
    /// `bdd_unique` instead skips variables outside the support of `f`.
    pub fn unique(&self, f: Ref, vars: Ref) -> Result<Ref> {
        self.quantify(Quant::Unique, f, vars)
    }

    /// Relational product `∃vars. f ∧ g`, without building `f ∧ g`.
    pub fn rel_prod(&self, f: Ref, g: Ref, vars: Ref) -> Result<Ref> {
        self.app_quantify(BddOp::And, Quant::Exist, f, g, vars)
    }

    /// `∃vars. op(f, g)`.
    pub fn app_ex(&self, op: BddOp, f: Ref, g: Ref, vars: Ref) -> Result<Ref> {
        self.app_quantify(op, Quant::Exist, f, g, vars)
    }

    /// `∀vars. op(f, g)`.
    pub fn app_all(&self, op: BddOp, f: Ref, g: Ref, vars: Ref) -> Result<Ref> {
        self.app_quantify(op, Quant::ForAll, f, g, vars)
    }

    /// Unique quantification of `op(f, g)` over `vars`.
    pub fn app_uni(&self, op: BddOp, f: Ref, g: Ref, vars: Ref) -> Result<Ref> {
        self.app_quantify(op, Quant::Unique, f, g, vars)
    }
}
