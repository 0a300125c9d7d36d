//! Cofactoring and substitution: `restrict`, `constrain`, `simplify`,
//! `compose`, `vec_compose` and `replace`.

use log::debug;

use crate::bdd::Bdd;
use crate::cache::OpKey;
use crate::error::{BddError, Result};
use crate::pairing::{Image, Pairing};
use crate::quant::LevelSet;
use crate::reference::Ref;
use crate::types::{Level, Var};

/// Pairing images resolved against the current order, indexed by level.
struct LevelMap {
    images: Vec<Option<Ref>>,
    levels: Vec<Option<Level>>,
    last: Option<Level>,
}

impl Bdd {
    fn restrict_rec(&self, f: Ref, set: &LevelSet, cube: Ref) -> Result<Ref> {
        if f.is_const() {
            return Ok(f);
        }
        let level = self.level_of(f);
        match set.last() {
            Some(last) if level <= last => {}
            _ => return Ok(f),
        }

        let key = OpKey::Restrict(f, cube);
        if let Some(res) = self.cache.borrow().get(&key) {
            return Ok(res);
        }

        let (f0, f1) = self.cofactors(f);
        let res = match set.get(level) {
            Some(true) => self.restrict_rec(f1, set, cube)?,
            Some(false) => self.restrict_rec(f0, set, cube)?,
            None => {
                let low = self.restrict_rec(f0, set, cube)?;
                let high = self.restrict_rec(f1, set, cube)?;
                self.mk_at(level, low, high)?
            }
        };

        self.cache.borrow_mut().insert(key, res);
        Ok(res)
    }

    /// Fixes the variables of `cube` to the polarities they have in it.
    ///
    /// `cube` is a conjunction of literals, e.g. from [`Bdd::mk_cube`].
    pub fn restrict(&self, f: Ref, cube: Ref) -> Result<Ref> {
        debug!("restrict(f = {}, cube = {})", f, cube);
        self.run_op("restrict", &[f, cube], |bdd| {
            let set = bdd.cube_levels(cube, false)?;
            bdd.restrict_rec(f, &set, cube)
        })
    }

    /// In-place [`restrict`][Bdd::restrict], moving references like [`Bdd::apply_with`].
    pub fn restrict_with(&self, f: &mut Ref, cube: Ref) -> Result<()> {
        let res = self.restrict(*f, cube)?;
        self.add_ref(res)?;
        self.del_ref(*f)?;
        self.del_ref(cube)?;
        *f = res;
        Ok(())
    }

    fn constrain_rec(&self, f: Ref, c: Ref) -> Result<Ref> {
        if c == Ref::ZERO {
            return Ok(Ref::ZERO);
        }
        if c == Ref::ONE || f.is_const() {
            return Ok(f);
        }
        if f == c {
            return Ok(Ref::ONE);
        }
        if f == -c {
            return Ok(Ref::ZERO);
        }

        let key = OpKey::Constrain(f, c);
        if let Some(res) = self.cache.borrow().get(&key) {
            return Ok(res);
        }

        let (top, (f0, f1), (c0, c1)) = self.split2(f, c);
        let res = if c1 == Ref::ZERO {
            self.constrain_rec(f0, c0)?
        } else if c0 == Ref::ZERO {
            self.constrain_rec(f1, c1)?
        } else {
            let low = self.constrain_rec(f0, c0)?;
            let high = self.constrain_rec(f1, c1)?;
            self.mk_at(top, low, high)?
        };

        self.cache.borrow_mut().insert(key, res);
        Ok(res)
    }

    /// Generalized cofactor `f ↓ c` (Coudert and Madre).
    ///
    /// The result agrees with `f` wherever `c` holds.
    pub fn constrain(&self, f: Ref, c: Ref) -> Result<Ref> {
        debug!("constrain(f = {}, c = {})", f, c);
        self.run_op("constrain", &[f, c], |bdd| bdd.constrain_rec(f, c))
    }

    fn simplify_rec(&self, f: Ref, d: Ref) -> Result<Ref> {
        if d == Ref::ONE || f.is_const() {
            return Ok(f);
        }
        if d == f {
            return Ok(Ref::ONE);
        }
        if d == Ref::ZERO || d == -f {
            return Ok(Ref::ZERO);
        }

        let key = OpKey::Simplify(f, d);
        if let Some(res) = self.cache.borrow().get(&key) {
            return Ok(res);
        }

        let level_f = self.level_of(f);
        let level_d = self.level_of(d);
        let res = if level_f == level_d {
            let (f0, f1) = self.cofactors(f);
            let (d0, d1) = self.cofactors(d);
            if d0 == Ref::ZERO {
                self.simplify_rec(f1, d1)?
            } else if d1 == Ref::ZERO {
                self.simplify_rec(f0, d0)?
            } else {
                let low = self.simplify_rec(f0, d0)?;
                let high = self.simplify_rec(f1, d1)?;
                self.mk_at(level_f, low, high)?
            }
        } else if level_f < level_d {
            let (f0, f1) = self.cofactors(f);
            let low = self.simplify_rec(f0, d)?;
            let high = self.simplify_rec(f1, d)?;
            self.mk_at(level_f, low, high)?
        } else {
            // `f` does not depend on the top variable of `d`.
            let (d0, d1) = self.cofactors(d);
            let d = self.or_rec(d0, d1)?;
            self.simplify_rec(f, d)?
        };

        self.cache.borrow_mut().insert(key, res);
        Ok(res)
    }

    /// Minimizes `f` using `d` as the care set (Coudert and Madre restrict).
    ///
    /// The result agrees with `f` wherever `d` holds and is usually smaller.
    pub fn simplify(&self, f: Ref, d: Ref) -> Result<Ref> {
        debug!("simplify(f = {}, d = {})", f, d);
        self.run_op("simplify", &[f, d], |bdd| bdd.simplify_rec(f, d))
    }

    fn compose_rec(&self, f: Ref, g: Ref, v: Var, level: Level) -> Result<Ref> {
        let level_f = self.level_of(f);
        if level_f > level {
            return Ok(f);
        }

        let key = OpKey::Compose(f, g, v);
        if let Some(res) = self.cache.borrow().get(&key) {
            return Ok(res);
        }

        let res = if level_f == level {
            let (f0, f1) = self.cofactors(f);
            self.ite_rec(g, f1, f0)?
        } else {
            let (top, (f0, f1), (g0, g1)) = self.split2(f, g);
            let low = self.compose_rec(f0, g0, v, level)?;
            let high = self.compose_rec(f1, g1, v, level)?;
            self.mk_at(top, low, high)?
        };

        self.cache.borrow_mut().insert(key, res);
        Ok(res)
    }

    /// Substitutes `g` for the variable `v` in `f`.
    pub fn compose(&self, f: Ref, g: Ref, v: Var) -> Result<Ref> {
        debug!("compose(f = {}, g = {}, v = {})", f, g, v);
        self.check_live()?;
        self.check_var(v)?;
        self.run_op("compose", &[f, g], |bdd| {
            let level = bdd.order.borrow().level(v);
            bdd.compose_rec(f, g, v, level)
        })
    }

    /// Resolves `pairing` against the current order.
    ///
    /// With `vars_only`, function images are rejected.
    fn level_map(&self, pairing: &Pairing, vars_only: bool) -> Result<LevelMap> {
        let n = self.var_num();
        let mut map = LevelMap {
            images: vec![None; n],
            levels: vec![None; n],
            last: None,
        };
        let order = self.order.borrow();
        for (v, img) in pairing.iter() {
            let level = order.level(v);
            let image = match img {
                Image::Var(w) => {
                    map.levels[level.index()] = Some(order.level(w));
                    self.vars.borrow()[w.index()]
                }
                Image::Func(g) if !vars_only => g,
                Image::Func(_) => {
                    return Err(BddError::invalid_argument(format!(
                        "{} is mapped to a function, use vec_compose",
                        v
                    )));
                }
            };
            map.images[level.index()] = Some(image);
            map.last = map.last.max(Some(level));
        }
        Ok(map)
    }

    fn vec_compose_rec(&self, f: Ref, map: &LevelMap, id: u64) -> Result<Ref> {
        let level = self.level_of(f);
        match map.last {
            Some(last) if level <= last => {}
            _ => return Ok(f),
        }

        let key = OpKey::VecCompose(f, id);
        if let Some(res) = self.cache.borrow().get(&key) {
            return Ok(res);
        }

        let (f0, f1) = self.cofactors(f);
        let low = self.vec_compose_rec(f0, map, id)?;
        let high = self.vec_compose_rec(f1, map, id)?;
        let g = match map.images[level.index()] {
            Some(g) => g,
            None => self.vars.borrow()[self.order.borrow().var(level).index()],
        };
        let res = self.ite_rec(g, high, low)?;

        self.cache.borrow_mut().insert(key, res);
        Ok(res)
    }

    /// Simultaneously substitutes every image of `pairing` for its variable.
    pub fn vec_compose(&self, f: Ref, pairing: &Pairing) -> Result<Ref> {
        debug!("vec_compose(f = {}, pairing = {})", f, pairing);
        self.check_live()?;
        self.check_pairing(pairing)?;
        let mut operands = pairing.funcs();
        operands.push(f);
        self.run_op("vec_compose", &operands, |bdd| {
            let map = bdd.level_map(pairing, false)?;
            bdd.vec_compose_rec(f, &map, pairing.id())
        })
    }

    /// Builds `level ? high : low` where `level` may lie below the tops of the children.
    fn correctify(&self, level: Level, low: Ref, high: Ref) -> Result<Ref> {
        let level_l = self.level_of(low);
        let level_h = self.level_of(high);
        if level < level_l && level < level_h {
            return self.mk_at(level, low, high);
        }
        if level == level_l || level == level_h {
            return Err(BddError::order_violation(format!(
                "renaming onto variable at {} which is already used below",
                level
            )));
        }
        let top = level_l.min(level_h);
        let (l0, l1) = self.cofactors_at(low, top);
        let (h0, h1) = self.cofactors_at(high, top);
        let r0 = self.correctify(level, l0, h0)?;
        let r1 = self.correctify(level, l1, h1)?;
        self.mk_at(top, r0, r1)
    }

    fn replace_rec(&self, f: Ref, map: &LevelMap, id: u64) -> Result<Ref> {
        let level = self.level_of(f);
        match map.last {
            Some(last) if level <= last => {}
            _ => return Ok(f),
        }

        let key = OpKey::Replace(f, id);
        if let Some(res) = self.cache.borrow().get(&key) {
            return Ok(res);
        }

        let (f0, f1) = self.cofactors(f);
        let low = self.replace_rec(f0, map, id)?;
        let high = self.replace_rec(f1, map, id)?;
        let target = map.levels[level.index()].unwrap_or(level);
        let res = self.correctify(target, low, high)?;

        self.cache.borrow_mut().insert(key, res);
        Ok(res)
    }

    /// Renames variables according to `pairing`.
    ///
    /// Every image must be a variable. Fails with `OrderViolation` when a
    /// variable would be renamed onto one that still occurs below it.
    pub fn replace(&self, f: Ref, pairing: &Pairing) -> Result<Ref> {
        debug!("replace(f = {}, pairing = {})", f, pairing);
        self.check_live()?;
        self.check_pairing(pairing)?;
        self.run_op("replace", &[f], |bdd| {
            let map = bdd.level_map(pairing, true)?;
            bdd.replace_rec(f, &map, pairing.id())
        })
    }

    /// In-place [`replace`][Bdd::replace]; `*f` keeps carrying one external reference.
    pub fn replace_with(&self, f: &mut Ref, pairing: &Pairing) -> Result<()> {
        let res = self.replace(*f, pairing)?;
        self.add_ref(res)?;
        self.del_ref(*f)?;
        *f = res;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::error::ErrorKind;
    use crate::types::Lit;

    fn setup(n: usize) -> (Bdd, Vec<Ref>) {
        let bdd = Bdd::default();
        bdd.set_var_num(n).unwrap();
        let vars = (0..n as u32).map(|i| bdd.ith_var(Var::new(i)).unwrap()).collect();
        (bdd, vars)
    }

    #[test]
    fn test_restrict() {
        let (bdd, x) = setup(3);
        // f = x0 ? x1 : x2
        let f = bdd.apply_ite(x[0], x[1], x[2]).unwrap();
        let pos = bdd.mk_cube([Lit::pos(Var::new(0))]).unwrap();
        let neg = bdd.mk_cube([Lit::neg(Var::new(0))]).unwrap();
        assert_eq!(bdd.restrict(f, pos).unwrap(), x[1]);
        assert_eq!(bdd.restrict(f, neg).unwrap(), x[2]);

        let both = bdd.mk_cube([Lit::pos(Var::new(0)), Lit::neg(Var::new(1))]).unwrap();
        assert_eq!(bdd.restrict(f, both).unwrap(), bdd.zero());
        assert_eq!(bdd.restrict(f, bdd.one()).unwrap(), f);
        assert_eq!(bdd.restrict(f, bdd.zero()).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_restrict_with() {
        let (bdd, x) = setup(2);
        let mut f = bdd.apply_and(x[0], x[1]).unwrap();
        bdd.add_ref(f).unwrap();
        let cube = bdd.add_ref(x[1]).unwrap();
        bdd.restrict_with(&mut f, cube).unwrap();
        assert_eq!(f, x[0]);
    }

    #[test]
    fn test_constrain() {
        let (bdd, x) = setup(3);
        let f = bdd.apply_or(x[0], x[1]).unwrap();
        // Under x0, f is one.
        assert_eq!(bdd.constrain(f, x[0]).unwrap(), bdd.one());
        // Under ~x0, f is x1.
        assert_eq!(bdd.constrain(f, -x[0]).unwrap(), x[1]);
        assert_eq!(bdd.constrain(f, f).unwrap(), bdd.one());
        assert_eq!(bdd.constrain(f, -f).unwrap(), bdd.zero());
        assert_eq!(bdd.constrain(f, bdd.one()).unwrap(), f);
    }

    #[test]
    fn test_constrain_agrees_on_care_set() {
        let (bdd, x) = setup(4);
        let a = bdd.apply_xor(x[0], x[2]).unwrap();
        let f = bdd.apply_or(a, x[3]).unwrap();
        let c = bdd.apply_or(x[1], x[2]).unwrap();
        let r = bdd.constrain(f, c).unwrap();
        let lhs = bdd.apply_and(r, c).unwrap();
        let rhs = bdd.apply_and(f, c).unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_simplify() {
        let (bdd, x) = setup(3);
        let f = bdd.apply_and(x[0], x[1]).unwrap();
        // Within x0, f reduces to x1.
        assert_eq!(bdd.simplify(f, x[0]).unwrap(), x[1]);
        assert_eq!(bdd.simplify(f, bdd.one()).unwrap(), f);
        assert_eq!(bdd.simplify(f, f).unwrap(), bdd.one());
        assert_eq!(bdd.simplify(f, bdd.zero()).unwrap(), bdd.zero());

        // Care set not mentioning the top variable of f.
        let d = bdd.apply_or(x[1], x[2]).unwrap();
        let r = bdd.simplify(f, d).unwrap();
        let lhs = bdd.apply_and(r, d).unwrap();
        let rhs = bdd.apply_and(f, d).unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_compose() {
        let (bdd, x) = setup(4);
        // f = x0 & x1, x1 := x2 | x3
        let f = bdd.apply_and(x[0], x[1]).unwrap();
        let g = bdd.apply_or(x[2], x[3]).unwrap();
        let res = bdd.compose(f, g, Var::new(1)).unwrap();
        let expected = bdd.apply_and(x[0], g).unwrap();
        assert_eq!(res, expected);

        // Substituting a variable above the top of f.
        let h = bdd.apply_and(x[2], x[3]).unwrap();
        let res = bdd.compose(h, x[0], Var::new(3)).unwrap();
        let expected = bdd.apply_and(x[2], x[0]).unwrap();
        assert_eq!(res, expected);

        // A variable that does not occur.
        assert_eq!(bdd.compose(f, g, Var::new(3)).unwrap(), f);
    }

    #[test]
    fn test_vec_compose() {
        let (bdd, x) = setup(4);
        let f = bdd.apply_xor(x[0], x[1]).unwrap();
        let g = bdd.apply_and(x[2], x[3]).unwrap();
        let mut p = bdd.make_pair();
        // Simultaneous: x0 := x1, x1 := g
        p.set_var(Var::new(0), Var::new(1));
        p.set_func(Var::new(1), g);
        let res = bdd.vec_compose(f, &p).unwrap();
        let expected = bdd.apply_xor(x[1], g).unwrap();
        assert_eq!(res, expected);
    }

    #[test]
    fn test_replace() {
        let (bdd, x) = setup(4);
        let f = bdd.apply_and(x[0], x[1]).unwrap();
        let mut p = bdd.make_pair();
        p.set_vars(&[Var::new(0), Var::new(1)], &[Var::new(2), Var::new(3)]).unwrap();
        let res = bdd.replace(f, &p).unwrap();
        let expected = bdd.apply_and(x[2], x[3]).unwrap();
        assert_eq!(res, expected);
    }

    #[test]
    fn test_replace_swap() {
        let (bdd, x) = setup(2);
        // f = x0 & ~x1, swap x0 and x1
        let f = bdd.apply_and(x[0], -x[1]).unwrap();
        let mut p = bdd.make_pair();
        p.set_vars(&[Var::new(0), Var::new(1)], &[Var::new(1), Var::new(0)]).unwrap();
        let res = bdd.replace(f, &p).unwrap();
        let expected = bdd.apply_and(x[1], -x[0]).unwrap();
        assert_eq!(res, expected);
    }

    #[test]
    fn test_replace_onto_used_variable() {
        let (bdd, x) = setup(3);
        let f = bdd.apply_and(x[0], x[1]).unwrap();
        let mut p = bdd.make_pair();
        p.set_var(Var::new(0), Var::new(1));
        assert_eq!(bdd.replace(f, &p).unwrap_err().kind(), ErrorKind::OrderViolation);
    }

    #[test]
    fn test_replace_rejects_functions() {
        let (bdd, x) = setup(3);
        let mut p = bdd.make_pair();
        p.set_func(Var::new(0), x[2]);
        assert_eq!(bdd.replace(x[0], &p).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_replace_with() {
        let (bdd, x) = setup(3);
        let mut f = bdd.add_ref(bdd.apply_or(x[0], x[1]).unwrap()).unwrap();
        let mut p = bdd.make_pair();
        p.set_var(Var::new(1), Var::new(2));
        bdd.replace_with(&mut f, &p).unwrap();
        assert_eq!(f, bdd.apply_or(x[0], x[2]).unwrap());
        assert_eq!(bdd.ref_count(f).unwrap(), 1);
    }
}
