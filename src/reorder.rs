//! Dynamic variable reordering.
//!
//! The size of a BDD is highly sensitive to the variable order: for
//! `(x₁ ∧ y₁) ∨ … ∨ (xₙ ∧ yₙ)` the interleaved order gives O(n) nodes while
//! `x₁ … xₙ y₁ … yₙ` gives O(2ⁿ). Finding the best order is NP-complete, so
//! the manager improves it heuristically by sequences of adjacent swaps.
//!
//! # Adjacent swap
//!
//! Swapping the variables `x` (at level `l`) and `y` (at `l + 1`) only
//! touches the `x`-nodes that have a `y`-child. Such a node `x ? f1 : f0`
//! is rewritten *in place* into `y ? (x ? f11 : f01) : (x ? f10 : f00)`,
//! keeping its index. Every handle held by a client therefore survives a
//! reorder and still denotes the same function. Nodes that lose their last
//! parent are freed on the spot.
//!
//! # Methods
//!
//! - **Sifting** (Rudell): each unit is moved through all positions and left
//!   where the table was smallest. Units with more nodes go first, and a move
//!   in one direction stops once the table grows past `sift_max_growth`
//!   times the best size seen.
//! - **Window permutation**: windows of 2 or 3 adjacent units are tried in
//!   all orders and the best one is kept.
//! - **Random**: random adjacent unit swaps.
//!
//! The `*Ite` variants repeat a pass until it no longer shrinks the table.
//!
//! Reordering works on the [block tree][crate::blocks]: the inside of every
//! non-fixed block is reordered first, then the units (child blocks and lone
//! variables) of its parent.
//!
//! # References
//!
//! - R. Rudell. "Dynamic variable ordering for ordered binary decision diagrams."
//!   ICCAD 1993. DOI: 10.1109/ICCAD.1993.580054
//! - C. Meinel & T. Theobald. "Algorithms and Data Structures in VLSI Design."
//!   Springer, 1998. Chapter 4.

use std::cmp::Reverse;
use std::fmt;
use std::ops::ControlFlow;
use std::str::FromStr;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::Rng;

use crate::bdd::Bdd;
use crate::blocks::{units, VarBlock};
use crate::error::{BddError, ErrorKind, Result};
use crate::hooks::{ReorderEvent, ReorderPhase};
use crate::node::Node;
use crate::reference::Ref;
use crate::table::NodeTable;
use crate::types::{Level, NodeId, Var};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ReorderMethod {
    None,
    Win2,
    Win2Ite,
    Win3,
    Win3Ite,
    Sift,
    SiftIte,
    Random,
}

impl ReorderMethod {
    pub const ALL: [ReorderMethod; 8] = [
        ReorderMethod::None,
        ReorderMethod::Win2,
        ReorderMethod::Win2Ite,
        ReorderMethod::Win3,
        ReorderMethod::Win3Ite,
        ReorderMethod::Sift,
        ReorderMethod::SiftIte,
        ReorderMethod::Random,
    ];
}

impl fmt::Display for ReorderMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReorderMethod::None => "none",
            ReorderMethod::Win2 => "win2",
            ReorderMethod::Win2Ite => "win2ite",
            ReorderMethod::Win3 => "win3",
            ReorderMethod::Win3Ite => "win3ite",
            ReorderMethod::Sift => "sift",
            ReorderMethod::SiftIte => "siftite",
            ReorderMethod::Random => "random",
        };
        f.write_str(name)
    }
}

impl FromStr for ReorderMethod {
    type Err = BddError;

    fn from_str(s: &str) -> Result<Self> {
        ReorderMethod::ALL
            .into_iter()
            .find(|m| m.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| BddError::invalid_argument(format!("unknown reorder method '{}'", s)))
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum ReorderStatus {
    Disabled,
    Idle,
    InProgress,
}

/// Outcome of one reordering.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderStats {
    pub method: ReorderMethod,
    /// Live nodes at the start, after the initial garbage collection.
    pub nodes_before: usize,
    pub nodes_after: usize,
    /// Adjacent level swaps performed.
    pub swaps: usize,
    /// Whether a reorder hook cut the run short.
    pub stopped: bool,
    pub elapsed: Duration,
}

impl ReorderStats {
    /// Node reduction in percent; negative if the table grew.
    pub fn gain(&self) -> i32 {
        if self.nodes_before == 0 {
            return 0;
        }
        let before = self.nodes_before as i64;
        let after = self.nodes_after as i64;
        (100 * (before - after) / before) as i32
    }
}

impl fmt::Display for ReorderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reorder ({}): {} -> {} nodes ({}%), {} swaps in {:?}",
            self.method,
            self.nodes_before,
            self.nodes_after,
            self.gain(),
            self.swaps,
            self.elapsed
        )
    }
}

#[derive(Debug)]
pub(crate) struct ReorderState {
    pub status: ReorderStatus,
    /// Method used by automatic reordering.
    pub method: ReorderMethod,
    /// Remaining automatic reorderings; `None` for unlimited.
    pub times: Option<usize>,
    pub verbose: u32,
    /// Live node count that triggers the next automatic reordering.
    pub trigger: usize,
    pub count: usize,
    pub last: Option<ReorderStats>,
    /// Live path iterators; the order stays put while any exists.
    pub frozen: usize,
}

impl ReorderState {
    pub fn new(threshold: usize) -> Self {
        Self {
            status: ReorderStatus::Disabled,
            method: ReorderMethod::None,
            times: None,
            verbose: 0,
            trigger: threshold,
            count: 0,
            last: None,
            frozen: 0,
        }
    }
}

fn inc(refs: &mut Vec<u32>, f: Ref) {
    if f.is_const() {
        return;
    }
    let i = f.id().index();
    if i >= refs.len() {
        refs.resize(i + 1, 0);
    }
    refs[i] += 1;
}

/// Drops one reference to `f`, freeing every node that becomes unreachable.
fn dec(table: &mut NodeTable, refs: &mut [u32], f: Ref) {
    let mut stack = vec![f];
    while let Some(f) = stack.pop() {
        if f.is_const() {
            continue;
        }
        let i = f.id().index();
        refs[i] -= 1;
        if refs[i] == 0 {
            let node = table.node(f.id());
            table.release(f.id());
            stack.push(node.low);
            stack.push(node.high);
        }
    }
}

/// Cofactors of `f` by `y`, which must be the top variable of `f` or absent from it.
fn split_by(table: &NodeTable, f: Ref, y: Var) -> (Ref, Ref) {
    if !f.is_const() && table.variable(f.id()) == y {
        table.cofactors(f)
    } else {
        (f, f)
    }
}

/// Like [`NodeTable::mk`], also counting the children of a newly created node.
fn mk_counted(table: &mut NodeTable, refs: &mut Vec<u32>, var: Var, low: Ref, high: Ref) -> Result<Ref> {
    if low == high {
        return Ok(low);
    }
    let neg = high.is_negated();
    let (low, high) = (low.negate_if(neg), high.negate_if(neg));
    let res = match table.subtable(var).find(low, high) {
        Some(id) => table.handle(id),
        None => {
            let res = table.mk(var, low, high)?;
            inc(refs, low);
            inc(refs, high);
            res
        }
    };
    Ok(res.negate_if(neg))
}

/// Movable units of one scope, laid out on consecutive levels from `base`.
struct Units {
    base: usize,
    vars: Vec<Vec<Var>>,
    /// Unit indices from top to bottom.
    seq: Vec<usize>,
}

impl Units {
    fn len(&self) -> usize {
        self.seq.len()
    }

    fn level_at(&self, pos: usize) -> usize {
        self.base + self.seq[..pos].iter().map(|&u| self.vars[u].len()).sum::<usize>()
    }
}

/// One reordering run: owns the internal reference counts for its duration.
struct Session<'a> {
    bdd: &'a Bdd,
    method: ReorderMethod,
    /// Parent edges plus one for every root, by node index.
    refs: Vec<u32>,
    swaps: usize,
    stopped: bool,
    max_growth: f64,
}

impl<'a> Session<'a> {
    fn start(bdd: &'a Bdd, method: ReorderMethod, protect: &[Ref]) -> Self {
        bdd.collect_garbage(protect);
        let refs = {
            let table = bdd.table.borrow();
            let mut refs = vec![0; table.slots()];
            for id in table.live_ids() {
                let node = table.node(id);
                inc(&mut refs, node.low);
                inc(&mut refs, node.high);
                if table.ref_count(id) > 0 {
                    refs[id.index()] += 1;
                }
            }
            for &f in protect {
                inc(&mut refs, f);
            }
            refs
        };
        let max_growth = bdd.config.borrow().sift_max_growth;
        Self {
            bdd,
            method,
            refs,
            swaps: 0,
            stopped: false,
            max_growth,
        }
    }

    fn nodes(&self) -> usize {
        self.bdd.table.borrow().live_count()
    }

    fn ensure_room(&self, needed: usize) -> bool {
        loop {
            if self.bdd.table.borrow().free_count() >= needed {
                return true;
            }
            if !self.bdd.grow() {
                return false;
            }
        }
    }

    /// Exchanges the variables at `level` and `level + 1`.
    fn swap_level(&mut self, level: Level) -> Result<()> {
        let bdd = self.bdd;
        let (x, y) = {
            let order = bdd.order.borrow();
            (order.var(level), order.var(level.next()))
        };
        let moved: Vec<NodeId> = {
            let table = bdd.table.borrow();
            let has_y = |f: Ref| !f.is_const() && table.variable(f.id()) == y;
            table
                .subtable(x)
                .ids()
                .filter(|&id| {
                    let node = table.node(id);
                    has_y(node.low) || has_y(node.high)
                })
                .collect()
        };
        // Each moved node needs at most two new x-nodes.
        if !self.ensure_room(2 * moved.len()) {
            return Err(BddError::exhausted(format!("no room to swap {} and {}", x, y)));
        }

        let mut table = bdd.table.borrow_mut();
        for &id in &moved {
            table.unlink(id);
        }
        bdd.order.borrow_mut().swap_adjacent(level);
        for id in moved {
            let node = table.node(id);
            let (f00, f01) = split_by(&table, node.low, y);
            let (f10, f11) = split_by(&table, node.high, y);
            let low = mk_counted(&mut table, &mut self.refs, x, f00, f10)?;
            // `f11` is regular, so is `high`.
            let high = mk_counted(&mut table, &mut self.refs, x, f01, f11)?;
            table.relink(id, Node::new(y, low, high));
            inc(&mut self.refs, low);
            inc(&mut self.refs, high);
            dec(&mut table, &mut self.refs, node.low);
            dec(&mut table, &mut self.refs, node.high);
        }
        self.swaps += 1;
        Ok(())
    }

    fn fire(&mut self, phase: ReorderPhase) {
        let event = ReorderEvent {
            phase,
            method: self.method,
            nodes: self.nodes(),
            swaps: self.swaps,
        };
        let hook = self.bdd.hooks.borrow_mut().reorder.take();
        if let Some(mut hook) = hook {
            if let ControlFlow::Break(()) = hook(&event) {
                debug!("reorder stopped by hook after {} swaps", self.swaps);
                self.stopped = true;
            }
            let mut hooks = self.bdd.hooks.borrow_mut();
            if hooks.reorder.is_none() {
                hooks.reorder = Some(hook);
            }
        }
    }

    /// Exchanges the units at `pos` and `pos + 1`.
    ///
    /// If the table cannot make room, the partial exchange is undone and
    /// the session stops.
    fn swap_units(&mut self, units: &mut Units, pos: usize) -> Result<()> {
        let start = units.level_at(pos);
        let a = units.vars[units.seq[pos]].len();
        let b = units.vars[units.seq[pos + 1]].len();
        let mut done = Vec::with_capacity(a * b);
        for j in 0..b {
            for k in (0..a).rev() {
                let level = Level::new((start + k + j) as u32);
                match self.swap_level(level) {
                    Ok(()) => done.push(level),
                    Err(e) if e.kind() == ErrorKind::ResourceExhausted => {
                        warn!("reorder: {}, stopping", e);
                        for &level in done.iter().rev() {
                            self.swap_level(level)?;
                        }
                        self.stopped = true;
                        return Ok(());
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        units.seq.swap(pos, pos + 1);
        self.fire(ReorderPhase::Progress);
        Ok(())
    }

    fn window2(&mut self, units: &mut Units) -> Result<()> {
        for pos in 0..units.len().saturating_sub(1) {
            if self.stopped {
                return Ok(());
            }
            let before = self.nodes();
            self.swap_units(units, pos)?;
            if !self.stopped && self.nodes() >= before {
                self.swap_units(units, pos)?;
            }
        }
        Ok(())
    }

    fn window3(&mut self, units: &mut Units) -> Result<()> {
        if units.len() < 3 {
            return self.window2(units);
        }
        for pos in 0..units.len() - 2 {
            if self.stopped {
                return Ok(());
            }
            // Alternating swaps at `pos` and `pos + 1` visit all 6 orders
            // of the window and come back to the start after 6 steps.
            let mut best = (self.nodes(), 0);
            let mut state = 0;
            for k in 0..5 {
                self.swap_units(units, pos + k % 2)?;
                state = k + 1;
                if self.stopped {
                    return Ok(());
                }
                let size = self.nodes();
                if size < best.0 {
                    best = (size, state);
                }
            }
            let mut k = 5;
            while state != best.1 {
                self.swap_units(units, pos + k % 2)?;
                state = (k + 1) % 6;
                k += 1;
                if self.stopped {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    fn sift(&mut self, units: &mut Units) -> Result<()> {
        if units.len() < 2 {
            return Ok(());
        }
        let sizes: Vec<usize> = {
            let table = self.bdd.table.borrow();
            units
                .vars
                .iter()
                .map(|vars| vars.iter().map(|&v| table.subtable(v).len()).sum())
                .collect()
        };
        let mut queue: Vec<usize> = (0..units.len()).collect();
        queue.sort_by_key(|&u| Reverse(sizes[u]));

        for u in queue {
            if self.stopped {
                return Ok(());
            }
            if let Some(pos) = units.seq.iter().position(|&x| x == u) {
                self.sift_unit(units, pos)?;
            }
        }
        Ok(())
    }

    fn sift_unit(&mut self, units: &mut Units, pos: usize) -> Result<()> {
        let n = units.len();
        let mut best = (self.nodes(), pos);
        let mut cur = pos;

        while cur > 0 && !self.stopped {
            self.swap_units(units, cur - 1)?;
            cur -= 1;
            let size = self.nodes();
            if size < best.0 {
                best = (size, cur);
            }
            if size as f64 > best.0 as f64 * self.max_growth {
                break;
            }
        }
        while cur + 1 < n && !self.stopped {
            self.swap_units(units, cur)?;
            cur += 1;
            let size = self.nodes();
            if size < best.0 {
                best = (size, cur);
            }
            if size as f64 > best.0 as f64 * self.max_growth {
                break;
            }
        }
        while cur > best.1 && !self.stopped {
            self.swap_units(units, cur - 1)?;
            cur -= 1;
        }
        while cur < best.1 && !self.stopped {
            self.swap_units(units, cur)?;
            cur += 1;
        }
        Ok(())
    }

    fn random(&mut self, units: &mut Units) -> Result<()> {
        let n = units.len();
        if n < 2 {
            return Ok(());
        }
        for _ in 0..n {
            if self.stopped {
                return Ok(());
            }
            let pos = self.bdd.rng.borrow_mut().random_range(0..n - 1);
            self.swap_units(units, pos)?;
        }
        Ok(())
    }

    fn repeat(&mut self, units: &mut Units, pass: fn(&mut Self, &mut Units) -> Result<()>) -> Result<()> {
        loop {
            let before = self.nodes();
            pass(self, units)?;
            if self.stopped || self.nodes() >= before {
                return Ok(());
            }
        }
    }

    fn run_method(&mut self, units: &mut Units) -> Result<()> {
        match self.method {
            ReorderMethod::None => Ok(()),
            ReorderMethod::Win2 => self.window2(units),
            ReorderMethod::Win2Ite => self.repeat(units, Self::window2),
            ReorderMethod::Win3 => self.window3(units),
            ReorderMethod::Win3Ite => self.repeat(units, Self::window3),
            ReorderMethod::Sift => self.sift(units),
            ReorderMethod::SiftIte => self.repeat(units, Self::sift),
            ReorderMethod::Random => self.random(units),
        }
    }

    /// Reorders the inside of every non-fixed child block, then the units of this scope.
    fn reorder_scope(&mut self, vars: &[Var], children: &[VarBlock]) -> Result<()> {
        for child in children {
            if self.stopped {
                return Ok(());
            }
            if !child.fixed {
                self.reorder_scope(&child.vars, &child.children)?;
            }
        }
        if self.stopped {
            return Ok(());
        }

        let mut items: Vec<(Level, Vec<Var>)> = {
            let order = self.bdd.order.borrow();
            units(vars, children)
                .into_iter()
                .filter_map(|unit| {
                    let top = unit.iter().map(|&v| order.level(v)).min()?;
                    Some((top, unit))
                })
                .collect()
        };
        if items.len() < 2 {
            return Ok(());
        }
        items.sort();
        let mut units = Units {
            base: items[0].0.index(),
            seq: (0..items.len()).collect(),
            vars: items.into_iter().map(|(_, vars)| vars).collect(),
        };
        self.run_method(&mut units)
    }
}

// Reordering entry points.
impl Bdd {
    /// Reorders the variables once with `method`.
    ///
    /// Only nodes reachable from referenced handles survive: reordering
    /// starts with a garbage collection.
    pub fn reorder(&self, method: ReorderMethod) -> Result<ReorderStats> {
        self.check_live()?;
        self.check_not_frozen()?;
        self.reorder_protecting(method, &[])
    }

    fn check_not_frozen(&self) -> Result<()> {
        match self.reorder.borrow().frozen {
            0 => Ok(()),
            n => Err(BddError::invalid_argument(format!(
                "cannot change the variable order while {} path iterator(s) are alive",
                n
            ))),
        }
    }

    fn reorder_protecting(&self, method: ReorderMethod, protect: &[Ref]) -> Result<ReorderStats> {
        let prev = std::mem::replace(&mut self.reorder.borrow_mut().status, ReorderStatus::InProgress);
        let result = self.run_reorder(method, protect);
        let mut state = self.reorder.borrow_mut();
        state.status = prev;
        let stats = result?;
        state.count += 1;
        state.last = Some(stats.clone());
        Ok(stats)
    }

    fn run_reorder(&self, method: ReorderMethod, protect: &[Ref]) -> Result<ReorderStats> {
        let start = Instant::now();
        let mut session = Session::start(self, method, protect);
        let before = session.nodes();
        debug!("reorder({}) on {} nodes", method, before);
        session.fire(ReorderPhase::Start);

        let tree = self.blocks.borrow().clone();
        let vars = self.order.borrow().vars().to_vec();
        let result = if session.stopped {
            Ok(())
        } else {
            session.reorder_scope(&vars, tree.roots())
        };
        self.cache.borrow_mut().clear();
        result?;
        session.fire(ReorderPhase::Done);

        let stats = ReorderStats {
            method,
            nodes_before: before,
            nodes_after: session.nodes(),
            swaps: session.swaps,
            stopped: session.stopped,
            elapsed: start.elapsed(),
        };
        if self.reorder.borrow().verbose > 0 {
            info!("{}", stats);
        } else {
            debug!("{}", stats);
        }
        Ok(stats)
    }

    /// Runs `f` with a bare swap session, no hooks involved.
    fn with_session<T>(&self, f: impl FnOnce(&mut Session<'_>) -> Result<T>) -> Result<T> {
        self.check_not_frozen()?;
        let mut session = Session::start(self, ReorderMethod::None, &[]);
        let result = f(&mut session);
        self.cache.borrow_mut().clear();
        result
    }

    /// Reorders automatically if enabled, armed, and the table has reached the trigger.
    pub(crate) fn maybe_auto_reorder(&self, operands: &[Ref]) -> Result<()> {
        let method = {
            let state = self.reorder.borrow();
            let due = state.status == ReorderStatus::Idle
                && state.method != ReorderMethod::None
                && state.times != Some(0)
                && state.frozen == 0
                && self.table.borrow().live_count() >= state.trigger;
            if !due {
                return Ok(());
            }
            state.method
        };
        let stats = self.reorder_protecting(method, operands)?;
        let threshold = self.config.borrow().reorder_threshold;
        let mut state = self.reorder.borrow_mut();
        // A run vetoed before its first swap does not count.
        if !(stats.stopped && stats.swaps == 0) {
            if let Some(times) = state.times.as_mut() {
                *times -= 1;
            }
        }
        state.trigger = threshold.max(2 * stats.nodes_after);
        debug!("auto reorder done, next trigger at {} nodes", state.trigger);
        Ok(())
    }

    /// Arms automatic reordering with `method`, at most `times` times (`None`: no limit).
    ///
    /// Automatic reordering only runs while reordering is enabled, see
    /// [`Bdd::enable_reorder`]. Returns the previous method.
    pub fn auto_reorder(&self, method: ReorderMethod, times: Option<usize>) -> ReorderMethod {
        let mut state = self.reorder.borrow_mut();
        state.times = times;
        std::mem::replace(&mut state.method, method)
    }

    pub fn get_reorder_method(&self) -> ReorderMethod {
        self.reorder.borrow().method
    }

    /// Remaining automatic reorderings; `None` for unlimited.
    pub fn get_reorder_times(&self) -> Option<usize> {
        self.reorder.borrow().times
    }

    pub fn enable_reorder(&self) {
        let mut state = self.reorder.borrow_mut();
        if state.status == ReorderStatus::Disabled {
            state.status = ReorderStatus::Idle;
        }
    }

    pub fn disable_reorder(&self) {
        self.reorder.borrow_mut().status = ReorderStatus::Disabled;
    }

    pub fn is_reorder_enabled(&self) -> bool {
        self.reorder.borrow().status != ReorderStatus::Disabled
    }

    /// Sets the verbosity of reorder logging. Returns the previous level.
    pub fn reorder_verbose(&self, level: u32) -> u32 {
        std::mem::replace(&mut self.reorder.borrow_mut().verbose, level)
    }

    /// Node reduction of the last reordering in percent, `0` if none ran yet.
    pub fn reorder_gain(&self) -> i32 {
        self.reorder.borrow().last.as_ref().map_or(0, |s| s.gain())
    }

    /// Sets the minimal live node count for automatic reordering. Returns the previous value.
    pub fn set_reorder_threshold(&self, threshold: usize) -> usize {
        self.reorder.borrow_mut().trigger = threshold;
        std::mem::replace(&mut self.config.borrow_mut().reorder_threshold, threshold)
    }

    /// Sets how far sifting lets the table grow before turning around. Returns the previous value.
    pub fn set_sift_max_growth(&self, growth: f64) -> f64 {
        std::mem::replace(&mut self.config.borrow_mut().sift_max_growth, growth)
    }

    fn check_no_blocks(&self, what: &str) -> Result<()> {
        if self.blocks.borrow().is_empty() {
            Ok(())
        } else {
            Err(BddError::invalid_argument(format!("{} is not allowed while variable blocks exist", what)))
        }
    }

    /// Exchanges the levels of `v1` and `v2`.
    pub fn swap_var(&self, v1: Var, v2: Var) -> Result<()> {
        debug!("swap_var({}, {})", v1, v2);
        self.check_live()?;
        self.check_var(v1)?;
        self.check_var(v2)?;
        self.check_no_blocks("swap_var")?;
        let (a, b) = {
            let order = self.order.borrow();
            let (a, b) = (order.level(v1).index(), order.level(v2).index());
            (a.min(b), a.max(b))
        };
        if a == b {
            return Ok(());
        }
        self.with_session(|s| {
            for l in a..b {
                s.swap_level(Level::new(l as u32))?;
            }
            for l in (a..b - 1).rev() {
                s.swap_level(Level::new(l as u32))?;
            }
            Ok(())
        })
    }

    /// Installs the order `perm`, where `perm[level]` is the variable at that level.
    pub fn set_var_order(&self, perm: &[Var]) -> Result<()> {
        debug!("set_var_order({:?})", perm);
        self.check_live()?;
        let n = self.var_num();
        if perm.len() != n {
            return Err(BddError::invalid_argument(format!(
                "order has {} variables, expected {}",
                perm.len(),
                n
            )));
        }
        let mut seen = vec![false; n];
        for &v in perm {
            self.check_var(v)?;
            if std::mem::replace(&mut seen[v.index()], true) {
                return Err(BddError::invalid_argument(format!("{} occurs twice in the order", v)));
            }
        }
        self.check_no_blocks("set_var_order")?;
        self.with_session(|s| {
            for (target, &v) in perm.iter().enumerate() {
                let cur = s.bdd.order.borrow().level(v).index();
                for l in (target..cur).rev() {
                    s.swap_level(Level::new(l as u32))?;
                }
            }
            Ok(())
        })
    }

    /// Declares a new variable placed directly below `v` in the order.
    pub fn duplicate_var(&self, v: Var) -> Result<Var> {
        debug!("duplicate_var({})", v);
        self.check_live()?;
        self.check_var(v)?;
        self.check_no_blocks("duplicate_var")?;
        self.check_not_frozen()?;
        let new = Var::new(self.ext_var_num(1)? as u32);
        let target = self.order.borrow().level(v).index() + 1;
        self.with_session(|s| {
            let cur = s.bdd.order.borrow().level(new).index();
            for l in (target..cur).rev() {
                s.swap_level(Level::new(l as u32))?;
            }
            Ok(())
        })?;
        Ok(new)
    }

    /// Groups `vars` into a block that reordering moves as a whole.
    ///
    /// The variables must occupy consecutive levels. A `fixed` block also
    /// keeps its internal order.
    pub fn add_var_block(&self, vars: &[Var], fixed: bool) -> Result<()> {
        debug!("add_var_block({:?}, fixed = {})", vars, fixed);
        self.check_live()?;
        let mut levels = Vec::with_capacity(vars.len());
        for &v in vars {
            self.check_var(v)?;
            levels.push(self.order.borrow().level(v).index());
        }
        levels.sort_unstable();
        levels.dedup();
        if let (Some(&first), Some(&last)) = (levels.first(), levels.last()) {
            if last - first + 1 != levels.len() {
                return Err(BddError::invalid_argument(format!(
                    "block {:?} does not occupy consecutive levels",
                    vars
                )));
            }
        }
        self.blocks.borrow_mut().insert(VarBlock::new(vars.to_vec(), fixed))
    }

    /// Puts every variable in its own fixed block.
    pub fn var_block_all(&self) -> Result<()> {
        for i in 0..self.var_num() {
            self.add_var_block(&[Var::new(i as u32)], true)?;
        }
        Ok(())
    }

    pub fn clear_var_blocks(&self) {
        self.blocks.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use test_log::test;

    use super::*;

    fn setup(n: usize) -> (Bdd, Vec<Ref>) {
        let bdd = Bdd::default();
        bdd.set_var_num(n).unwrap();
        let vars = (0..n as u32).map(|i| bdd.ith_var(Var::new(i)).unwrap()).collect();
        (bdd, vars)
    }

    /// (x0 & x3) | (x1 & x4) | (x2 & x5): exponential in the order x0..x5.
    fn pairs(bdd: &Bdd, x: &[Ref]) -> Ref {
        let n = x.len() / 2;
        let terms: Vec<Ref> = (0..n).map(|i| bdd.apply_and(x[i], x[i + n]).unwrap()).collect();
        let f = bdd.apply_or_many(terms).unwrap();
        bdd.add_ref(f).unwrap()
    }

    fn truth_table(bdd: &Bdd, f: Ref, n: usize) -> Vec<bool> {
        (0..1u32 << n)
            .map(|m| {
                let a: Vec<bool> = (0..n).map(|i| m >> i & 1 == 1).collect();
                bdd.eval(f, &a).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_method_names() {
        for m in ReorderMethod::ALL {
            assert_eq!(m.to_string().parse::<ReorderMethod>().unwrap(), m);
        }
        assert!("bogus".parse::<ReorderMethod>().is_err());
    }

    #[test]
    fn test_swap_var_preserves_function() {
        let (bdd, x) = setup(3);
        let a = bdd.apply_and(x[0], -x[1]).unwrap();
        let f = bdd.add_ref(bdd.apply_or(a, x[2]).unwrap()).unwrap();
        let before = truth_table(&bdd, f, 3);

        bdd.swap_var(Var::new(0), Var::new(2)).unwrap();
        assert_eq!(bdd.var2level(Var::new(0)).unwrap(), Level::new(2));
        assert_eq!(bdd.var2level(Var::new(2)).unwrap(), Level::new(0));
        assert_eq!(bdd.var2level(Var::new(1)).unwrap(), Level::new(1));
        assert_eq!(truth_table(&bdd, f, 3), before);

        // Variable handles survive.
        assert_eq!(bdd.var(x[0]).unwrap(), Var::new(0));
        let g = bdd.apply_or(bdd.apply_and(x[0], -x[1]).unwrap(), x[2]).unwrap();
        assert_eq!(g, f);
    }

    #[test]
    fn test_set_var_order() {
        let (bdd, x) = setup(6);
        let f = pairs(&bdd, &x);
        let before = truth_table(&bdd, f, 6);
        let size_before = bdd.node_count(f).unwrap();

        let perm: Vec<Var> = [0, 3, 1, 4, 2, 5].iter().map(|&i| Var::new(i)).collect();
        bdd.set_var_order(&perm).unwrap();
        let order = bdd.print_order().unwrap();
        assert!(order.starts_with("0: x0\n1: x3\n2: x1\n"));
        assert_eq!(truth_table(&bdd, f, 6), before);
        assert!(bdd.node_count(f).unwrap() < size_before);
        assert_eq!(bdd.node_count(f).unwrap(), 6);

        let err = bdd.set_var_order(&perm[..3]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_sift_shrinks() {
        let (bdd, x) = setup(6);
        let f = pairs(&bdd, &x);
        let before = truth_table(&bdd, f, 6);
        let size_before = bdd.node_count(f).unwrap();

        let stats = bdd.reorder(ReorderMethod::Sift).unwrap();
        assert!(stats.nodes_after < stats.nodes_before);
        assert!(bdd.node_count(f).unwrap() < size_before);
        assert!(bdd.reorder_gain() > 0);
        assert_eq!(truth_table(&bdd, f, 6), before);
    }

    #[test]
    fn test_all_methods_preserve_semantics() {
        for method in ReorderMethod::ALL {
            let (bdd, x) = setup(6);
            let f = pairs(&bdd, &x);
            let g = bdd.add_ref(bdd.apply_xor(x[1], x[5]).unwrap()).unwrap();
            let tf = truth_table(&bdd, f, 6);
            let tg = truth_table(&bdd, g, 6);
            let count = bdd.sat_count(f).unwrap();

            bdd.reorder(method).unwrap();
            assert_eq!(truth_table(&bdd, f, 6), tf, "{}", method);
            assert_eq!(truth_table(&bdd, g, 6), tg, "{}", method);
            assert_eq!(bdd.sat_count(f).unwrap(), count, "{}", method);
        }
    }

    #[test]
    fn test_blocks_move_together() {
        let (bdd, x) = setup(6);
        let f = pairs(&bdd, &x);
        bdd.add_var_block(&[Var::new(0), Var::new(1)], true).unwrap();
        bdd.add_var_block(&[Var::new(4), Var::new(5)], false).unwrap();
        let before = truth_table(&bdd, f, 6);

        bdd.reorder(ReorderMethod::Sift).unwrap();
        let l0 = bdd.var2level(Var::new(0)).unwrap().index();
        let l1 = bdd.var2level(Var::new(1)).unwrap().index();
        assert_eq!(l1, l0 + 1);
        let l4 = bdd.var2level(Var::new(4)).unwrap().index();
        let l5 = bdd.var2level(Var::new(5)).unwrap().index();
        assert_eq!(l4.abs_diff(l5), 1);
        assert_eq!(truth_table(&bdd, f, 6), before);

        assert_eq!(bdd.swap_var(Var::new(0), Var::new(2)).unwrap_err().kind(), ErrorKind::InvalidArgument);
        bdd.clear_var_blocks();
        bdd.swap_var(Var::new(0), Var::new(2)).unwrap();
    }

    #[test]
    fn test_block_must_be_consecutive() {
        let (bdd, _) = setup(4);
        let err = bdd.add_var_block(&[Var::new(0), Var::new(2)], false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        bdd.var_block_all().unwrap();
        bdd.add_var_block(&[Var::new(1), Var::new(2)], false).unwrap();
    }

    #[test]
    fn test_duplicate_var() {
        let (bdd, x) = setup(3);
        let f = bdd.add_ref(bdd.apply_and(x[0], x[2]).unwrap()).unwrap();
        let v = bdd.duplicate_var(Var::new(0)).unwrap();
        assert_eq!(v, Var::new(3));
        assert_eq!(bdd.var2level(v).unwrap(), Level::new(1));
        assert_eq!(bdd.var2level(Var::new(1)).unwrap(), Level::new(2));
        assert!(bdd.eval(f, &[true, false, true, false]).unwrap());
        assert!(!bdd.eval(f, &[true, false, false, true]).unwrap());
    }

    #[test]
    fn test_hook_can_stop() {
        let (bdd, x) = setup(6);
        let f = pairs(&bdd, &x);
        let before = truth_table(&bdd, f, 6);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        bdd.set_reorder_hook(Some(Box::new(move |e: &ReorderEvent| {
            sink.borrow_mut().push(e.phase);
            if e.phase == ReorderPhase::Progress {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })));

        bdd.reorder(ReorderMethod::Sift).unwrap();
        let events = events.borrow();
        assert_eq!(events[0], ReorderPhase::Start);
        assert_eq!(events.iter().filter(|&&p| p == ReorderPhase::Progress).count(), 1);
        assert_eq!(*events.last().unwrap(), ReorderPhase::Done);
        assert_eq!(truth_table(&bdd, f, 6), before);
    }

    #[test]
    fn test_auto_reorder() {
        let (bdd, x) = setup(8);
        bdd.set_reorder_threshold(10);
        assert_eq!(bdd.auto_reorder(ReorderMethod::Sift, Some(1)), ReorderMethod::None);
        assert_eq!(bdd.get_reorder_method(), ReorderMethod::Sift);
        assert!(!bdd.is_reorder_enabled());

        // Disabled: nothing happens.
        let f = pairs(&bdd, &x);
        assert_eq!(bdd.stats().reorders, 0);

        bdd.enable_reorder();
        let g = bdd.apply_and(f, x[0]).unwrap();
        assert_eq!(bdd.stats().reorders, 1);
        assert_eq!(bdd.get_reorder_times(), Some(0));
        // The operands survived the reordering.
        let expected = bdd.apply_and(x[0], f).unwrap();
        assert_eq!(g, expected);

        // Exhausted: no more automatic reorderings.
        bdd.apply_or(f, x[1]).unwrap();
        assert_eq!(bdd.stats().reorders, 1);

        bdd.disable_reorder();
        assert!(!bdd.is_reorder_enabled());
    }

    #[test]
    fn test_vetoed_auto_reorder_keeps_budget() {
        let (bdd, x) = setup(8);
        let f = pairs(&bdd, &x);
        bdd.set_reorder_threshold(10);
        bdd.auto_reorder(ReorderMethod::Sift, Some(1));
        bdd.enable_reorder();
        let veto = Rc::new(Cell::new(true));
        let flag = veto.clone();
        bdd.set_reorder_hook(Some(Box::new(move |e: &ReorderEvent| {
            if e.phase == ReorderPhase::Start && flag.get() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })));

        bdd.apply_and(f, x[0]).unwrap();
        let last = bdd.reorder.borrow().last.clone().map(|s| (s.stopped, s.swaps));
        assert_eq!(last, Some((true, 0)));
        assert_eq!(bdd.get_reorder_times(), Some(1));

        veto.set(false);
        bdd.set_reorder_threshold(10);
        bdd.apply_and(f, x[1]).unwrap();
        assert_eq!(bdd.get_reorder_times(), Some(0));
    }

    #[test]
    fn test_reorder_settings() {
        let bdd = Bdd::default();
        assert_eq!(bdd.reorder_verbose(2), 0);
        assert_eq!(bdd.reorder_verbose(0), 2);
        assert_eq!(bdd.reorder_gain(), 0);
        assert_eq!(bdd.set_sift_max_growth(1.5), 1.2);
        assert_eq!(bdd.set_reorder_threshold(5), 10_000);
    }
}
