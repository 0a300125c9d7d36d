//! Satisfying assignments and model counting.
//!
//! Whenever a choice exists, the low (false) branch is preferred: `sat_one`
//! returns the lexicographically smallest path when variables are read in
//! level order with `false < true`.

use std::collections::HashMap;

use log::debug;
use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::error::Result;
use crate::reference::Ref;
use crate::types::{Level, NodeId};

impl Bdd {
    /// Builds the cube of `lits`, which must be sorted by level.
    pub(crate) fn cube_at_levels(&self, lits: &[(Level, bool)]) -> Result<Ref> {
        let mut res = Ref::ONE;
        for &(level, value) in lits.iter().rev() {
            res = if value {
                self.mk_at(level, Ref::ZERO, res)?
            } else {
                self.mk_at(level, res, Ref::ZERO)?
            };
        }
        Ok(res)
    }

    /// One satisfying path of `f` as a cube; `0` if `f` is unsatisfiable.
    ///
    /// Variables not on the path are left out.
    pub fn sat_one(&self, f: Ref) -> Result<Ref> {
        debug!("sat_one(f = {})", f);
        self.run_op("sat_one", &[f], |bdd| {
            if f == Ref::ZERO {
                return Ok(Ref::ZERO);
            }
            let mut path = Vec::new();
            let mut cur = f;
            while !cur.is_const() {
                let level = bdd.level_of(cur);
                let (low, high) = bdd.cofactors(cur);
                if low != Ref::ZERO {
                    path.push((level, false));
                    cur = low;
                } else {
                    path.push((level, true));
                    cur = high;
                }
            }
            bdd.cube_at_levels(&path)
        })
    }

    /// One satisfying total assignment of `f` as a cube over all variables.
    ///
    /// Variables not on the chosen path are set to false.
    pub fn full_sat_one(&self, f: Ref) -> Result<Ref> {
        debug!("full_sat_one(f = {})", f);
        self.run_op("full_sat_one", &[f], |bdd| {
            if f == Ref::ZERO {
                return Ok(Ref::ZERO);
            }
            let mut values = vec![false; bdd.var_num()];
            let mut cur = f;
            while !cur.is_const() {
                let level = bdd.level_of(cur);
                let (low, high) = bdd.cofactors(cur);
                if low != Ref::ZERO {
                    cur = low;
                } else {
                    values[level.index()] = true;
                    cur = high;
                }
            }
            let lits: Vec<_> = values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Level::new(i as u32), v))
                .collect();
            bdd.cube_at_levels(&lits)
        })
    }

    /// One satisfying path of `f`, extended to mention every variable of `vars`.
    ///
    /// Variables of `vars` that are not on the path get the polarity `pol`:
    /// negative for `0`, positive otherwise.
    pub fn sat_one_set(&self, f: Ref, vars: Ref, pol: Ref) -> Result<Ref> {
        debug!("sat_one_set(f = {}, vars = {}, pol = {})", f, vars, pol);
        self.run_op("sat_one_set", &[f, vars, pol], |bdd| {
            let set = bdd.cube_levels(vars, true)?;
            if f == Ref::ZERO {
                return Ok(Ref::ZERO);
            }
            let fill = pol != Ref::ZERO;
            let mut values: Vec<Option<bool>> = (0..bdd.var_num())
                .map(|i| set.contains(Level::new(i as u32)).then_some(fill))
                .collect();
            let mut cur = f;
            while !cur.is_const() {
                let level = bdd.level_of(cur);
                let (low, high) = bdd.cofactors(cur);
                if low != Ref::ZERO {
                    values[level.index()] = Some(false);
                    cur = low;
                } else {
                    values[level.index()] = Some(true);
                    cur = high;
                }
            }
            let lits: Vec<_> = values
                .into_iter()
                .enumerate()
                .filter_map(|(i, v)| v.map(|v| (Level::new(i as u32), v)))
                .collect();
            bdd.cube_at_levels(&lits)
        })
    }

    /// Satisfying and falsifying assignment counts of `f`, over the counted
    /// variables at or below the level of `f`.
    ///
    /// `ranks[i]` is the number of counted variables strictly above level `i`,
    /// with `ranks[n]` covering all of them. Counts flow up from the terminals
    /// and are scaled by the number of counted variables each edge skips, so
    /// nothing is ever subtracted.
    fn weigh<W: Weight>(&self, f: Ref, ranks: &[usize], memo: &mut HashMap<NodeId, (W, W)>) -> (W, W) {
        let (sat, unsat) = if f.is_const() {
            (W::ONE, W::ZERO)
        } else if let Some(&counts) = memo.get(&f.id()) {
            counts
        } else {
            let n = ranks.len() - 1;
            let rank = ranks[self.level_index(f, n)] as i64;
            let (low, high) = self.cofactors(f.regular());
            let (l1, l0) = self.weigh(low, ranks, memo);
            let (h1, h0) = self.weigh(high, ranks, memo);
            let gap_low = ranks[self.level_index(low, n)] as i64 - rank - 1;
            let gap_high = ranks[self.level_index(high, n)] as i64 - rank - 1;
            let counts = (
                l1.scale(gap_low).add(h1.scale(gap_high)),
                l0.scale(gap_low).add(h0.scale(gap_high)),
            );
            memo.insert(f.id(), counts);
            counts
        };
        if f.is_negated() {
            (unsat, sat)
        } else {
            (sat, unsat)
        }
    }

    /// Number of satisfying assignments of `f` over the counted variables.
    fn count_in<W: Weight>(&self, f: Ref, ranks: &[usize]) -> W {
        let (sat, _) = self.weigh::<W>(f, ranks, &mut HashMap::new());
        let n = ranks.len() - 1;
        sat.scale(ranks[self.level_index(f, n)] as i64)
    }

    /// Ranks for counting over every declared variable.
    fn all_ranks(&self) -> Vec<usize> {
        (0..=self.var_num()).collect()
    }

    /// Number of satisfying assignments over all declared variables.
    ///
    /// Overflows to infinity only when the count itself exceeds the `f64` range.
    ///
    /// ```
    /// use robdd::bdd::Bdd;
    /// use robdd::types::Var;
    ///
    /// let bdd = Bdd::default();
    /// bdd.set_var_num(3).unwrap();
    /// let x = bdd.ith_var(Var::new(0)).unwrap();
    /// assert_eq!(bdd.sat_count(x).unwrap(), 4.0);
    /// assert_eq!(bdd.sat_count(bdd.one()).unwrap(), 8.0);
    /// ```
    pub fn sat_count(&self, f: Ref) -> Result<f64> {
        self.check_live()?;
        self.check_ref(f)?;
        Ok(self.count_in::<f64>(f, &self.all_ranks()))
    }

    /// Number of satisfying assignments over the variables of `vars` only.
    ///
    /// `f` is expected to depend on variables of `vars` only.
    pub fn sat_count_set(&self, f: Ref, vars: Ref) -> Result<f64> {
        self.check_live()?;
        self.check_ref(f)?;
        self.check_ref(vars)?;
        let set = self.cube_levels(vars, true)?;
        Ok(self.count_in::<f64>(f, set.ranks()))
    }

    /// Base-2 logarithm of [`sat_count`][Bdd::sat_count], usable beyond the `f64` range.
    ///
    /// Computed in log space throughout; `-inf` only for the false function.
    pub fn log_sat_count(&self, f: Ref) -> Result<f64> {
        self.check_live()?;
        self.check_ref(f)?;
        Ok(self.count_in::<Log2>(f, &self.all_ranks()).0)
    }

    /// Base-2 logarithm of [`sat_count_set`][Bdd::sat_count_set].
    pub fn log_sat_count_set(&self, f: Ref, vars: Ref) -> Result<f64> {
        self.check_live()?;
        self.check_ref(f)?;
        self.check_ref(vars)?;
        let set = self.cube_levels(vars, true)?;
        Ok(self.count_in::<Log2>(f, set.ranks()).0)
    }

    /// Exact number of satisfying assignments over all declared variables.
    pub fn sat_count_exact(&self, f: Ref) -> Result<BigUint> {
        self.check_live()?;
        self.check_ref(f)?;
        let n = self.var_num();
        let mut memo = HashMap::new();
        let count = self.count_below(f, n, &mut memo);
        Ok(count << self.level_index(f, n))
    }

    fn level_index(&self, f: Ref, n: usize) -> usize {
        if f.is_const() {
            n
        } else {
            self.level_of(f).index()
        }
    }

    /// Satisfying assignments of the variables at levels `level(f)..n`.
    fn count_below(&self, f: Ref, n: usize, memo: &mut HashMap<NodeId, BigUint>) -> BigUint {
        if f.is_const() {
            return BigUint::from((f == Ref::ONE) as u32);
        }
        let level = self.level_of(f).index();
        let count = match memo.get(&f.id()) {
            Some(count) => count.clone(),
            None => {
                let (low, high) = self.cofactors(f.regular());
                let c0 = self.count_below(low, n, memo) << (self.level_index(low, n) - level - 1);
                let c1 = self.count_below(high, n, memo) << (self.level_index(high, n) - level - 1);
                let count = c0 + c1;
                memo.insert(f.id(), count.clone());
                count
            }
        };
        if f.is_negated() {
            (BigUint::from(1u32) << (n - level)) - count
        } else {
            count
        }
    }

    /// Number of distinct paths from `f` to the true terminal.
    pub fn path_count(&self, f: Ref) -> Result<f64> {
        self.check_live()?;
        self.check_ref(f)?;
        Ok(self.paths_to(f, &mut HashMap::new()).0)
    }

    /// Paths to (true, false) from `f`.
    fn paths_to(&self, f: Ref, memo: &mut HashMap<NodeId, (f64, f64)>) -> (f64, f64) {
        let (ones, zeros) = if f.is_const() {
            (1.0, 0.0)
        } else if let Some(&counts) = memo.get(&f.id()) {
            counts
        } else {
            let (low, high) = self.cofactors(f.regular());
            let (l1, l0) = self.paths_to(low, memo);
            let (h1, h0) = self.paths_to(high, memo);
            let counts = (l1 + h1, l0 + h0);
            memo.insert(f.id(), counts);
            counts
        };
        if f.is_negated() {
            (zeros, ones)
        } else {
            (ones, zeros)
        }
    }
}

/// A number domain for model counts.
trait Weight: Copy {
    const ZERO: Self;
    const ONE: Self;

    fn add(self, other: Self) -> Self;

    /// Multiplies by `2^exp`.
    fn scale(self, exp: i64) -> Self;
}

impl Weight for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    fn add(self, other: Self) -> Self {
        self + other
    }

    fn scale(self, mut exp: i64) -> Self {
        // Steps keep `2^step` finite, so a zero count stays zero.
        const STEP: i64 = 1000;
        let mut x = self;
        while exp > STEP && x != 0.0 && x.is_finite() {
            x *= 2f64.powi(STEP as i32);
            exp -= STEP;
        }
        while exp < -STEP && x != 0.0 {
            x *= 2f64.powi(-STEP as i32);
            exp += STEP;
        }
        if x == 0.0 || x.is_infinite() {
            x
        } else {
            x * 2f64.powi(exp as i32)
        }
    }
}

/// A count stored as its base-2 logarithm; zero is `-inf`.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Log2(f64);

impl Weight for Log2 {
    const ZERO: Self = Log2(f64::NEG_INFINITY);
    const ONE: Self = Log2(0.0);

    /// `log2(2^a + 2^b)`, without leaving log space.
    fn add(self, other: Self) -> Self {
        let (hi, lo) = if self.0 >= other.0 { (self.0, other.0) } else { (other.0, self.0) };
        if lo == f64::NEG_INFINITY {
            return Log2(hi);
        }
        Log2(hi + (lo - hi).exp2().ln_1p() / std::f64::consts::LN_2)
    }

    fn scale(self, exp: i64) -> Self {
        Log2(self.0 + exp as f64)
    }
}
