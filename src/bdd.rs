//! The BDD manager.
//!
//! A [`Bdd`] owns every piece of shared state: the node table with its
//! per-variable unique subtables, the operation cache, the variable order,
//! variable blocks, reordering settings and user hooks. Handles ([`Ref`])
//! are plain copyable values that only make sense together with the manager
//! that produced them.
//!
//! # Memory management
//!
//! Nodes are kept alive by explicit external reference counts
//! ([`Bdd::add_ref`] / [`Bdd::del_ref`]) and by being reachable from a
//! referenced node. Garbage collection never interrupts a running
//! operation: when the table fills up, the operation is abandoned, the
//! manager collects garbage (keeping the operation's operands alive), grows
//! the table if needed, and starts the operation again. A handle that is
//! neither referenced nor reachable from a referenced node may therefore be
//! reclaimed by *any* later operation that is not given it as an operand.
//!
//! # Example
//!
//! ```
//! use robdd::bdd::Bdd;
//! use robdd::types::Var;
//!
//! let bdd = Bdd::new(1000, 1000);
//! bdd.set_var_num(3).unwrap();
//! let x0 = bdd.ith_var(Var::new(0)).unwrap();
//! let x1 = bdd.ith_var(Var::new(1)).unwrap();
//! let f = bdd.apply_and(x0, x1).unwrap();
//! assert_eq!(bdd.sat_count(f).unwrap(), 2.0);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;

use log::{debug, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::blocks::BlockTree;
use crate::cache::{bits_for, OpCache};
use crate::config::BddConfig;
use crate::error::{BddError, ErrorKind, Result};
use crate::hooks::{GcHook, Hooks, ReorderHook, ResizeHook};
use crate::order::VarOrder;
use crate::reference::Ref;
use crate::reorder::ReorderState;
use crate::table::{NodeTable, PINNED};
use crate::types::{Level, Var};

/// Largest number of variables a manager accepts.
pub const MAX_VARS: usize = 0x1F_FFFF;

pub struct Bdd {
    pub(crate) config: RefCell<BddConfig>,
    pub(crate) table: RefCell<NodeTable>,
    pub(crate) cache: RefCell<OpCache>,
    pub(crate) order: RefCell<VarOrder>,
    pub(crate) blocks: RefCell<BlockTree>,
    /// Positive literal node of every variable, by variable id.
    pub(crate) vars: RefCell<Vec<Ref>>,
    pub(crate) reorder: RefCell<ReorderState>,
    pub(crate) rng: RefCell<ChaCha8Rng>,
    pub(crate) hooks: RefCell<Hooks>,
    pub(crate) gc_count: Cell<usize>,
    initialized: Cell<bool>,
}

impl Bdd {
    /// Creates a manager with room for `nodes` nodes and `cache` cache entries.
    pub fn new(nodes: usize, cache: usize) -> Self {
        Self::with_config(BddConfig::new(nodes, cache))
    }

    pub fn with_config(config: BddConfig) -> Self {
        debug!(
            "new manager: {} nodes, {} cache entries",
            config.node_table_size, config.cache_size
        );
        let cache_entries = config.cache_entries_for(config.node_table_size);
        Self {
            table: RefCell::new(NodeTable::new(config.node_table_size)),
            cache: RefCell::new(OpCache::with_entries(cache_entries)),
            order: RefCell::new(VarOrder::new()),
            blocks: RefCell::new(BlockTree::new()),
            vars: RefCell::new(Vec::new()),
            reorder: RefCell::new(ReorderState::new(config.reorder_threshold)),
            rng: RefCell::new(ChaCha8Rng::seed_from_u64(config.random_seed)),
            hooks: RefCell::new(Hooks::default()),
            gc_count: Cell::new(0),
            initialized: Cell::new(true),
            config: RefCell::new(config),
        }
    }

    /// Re-initializes a manager that was torn down with [`Bdd::done`].
    ///
    /// Fails with `InvalidArgument` if the manager is still live.
    pub fn initialize(&mut self, nodes: usize, cache: usize) -> Result<()> {
        if self.initialized.get() {
            return Err(BddError::invalid_argument("manager is already initialized"));
        }
        let mut config = self.config.borrow().clone();
        config.node_table_size = nodes;
        config.cache_size = cache;
        let hooks = std::mem::take(&mut *self.hooks.borrow_mut());
        *self = Self::with_config(config);
        *self.hooks.borrow_mut() = hooks;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// Tears the manager down, releasing every node.
    ///
    /// Returns the number of nodes that still held external references,
    /// i.e. handles the caller forgot to release. Afterwards every operation
    /// fails with `InternalInvariant` until [`Bdd::initialize`] is called.
    pub fn done(&mut self) -> usize {
        if !self.initialized.get() {
            return 0;
        }
        let leaked = {
            let table = self.table.borrow();
            table
                .referenced_ids()
                .filter(|&id| table.ref_count(id) != PINNED)
                .count()
        };
        if leaked > 0 {
            warn!("done: {} nodes still referenced", leaked);
        } else {
            debug!("done: all references released");
        }
        *self.table.get_mut() = NodeTable::new(2);
        self.cache.get_mut().resize(0);
        self.order.get_mut().clear();
        self.blocks.get_mut().clear();
        self.vars.get_mut().clear();
        self.initialized.set(false);
        leaked
    }

    pub(crate) fn check_live(&self) -> Result<()> {
        if self.initialized.get() {
            Ok(())
        } else {
            Err(BddError::internal("manager is not initialized"))
        }
    }

    /// Checks that `f` points at a live node.
    pub(crate) fn check_ref(&self, f: Ref) -> Result<()> {
        if f.is_const() || self.table.borrow().is_current(f) {
            Ok(())
        } else {
            Err(BddError::invalid_reference(format!("{} does not point to a live node", f)))
        }
    }

    pub(crate) fn check_var(&self, v: Var) -> Result<()> {
        let n = self.var_num();
        if v.index() < n {
            Ok(())
        } else {
            Err(BddError::invalid_argument(format!("unknown variable {} ({} declared)", v, n)))
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::with_config(BddConfig::default())
    }
}

impl fmt::Debug for Bdd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.borrow();
        f.debug_struct("Bdd")
            .field("initialized", &self.initialized.get())
            .field("capacity", &table.capacity())
            .field("live", &table.live_count())
            .field("vars", &table.num_vars())
            .finish()
    }
}

// Capacity tuning. Every setter returns the previous value.
impl Bdd {
    pub fn config(&self) -> BddConfig {
        self.config.borrow().clone()
    }

    pub fn set_max_node_num(&self, max: usize) -> usize {
        std::mem::replace(&mut self.config.borrow_mut().max_node_num, max)
    }

    pub fn set_min_free_nodes(&self, percent: usize) -> usize {
        std::mem::replace(&mut self.config.borrow_mut().min_free_nodes, percent.min(100))
    }

    pub fn set_max_increase(&self, increase: usize) -> usize {
        std::mem::replace(&mut self.config.borrow_mut().max_increase, increase)
    }

    pub fn set_increase_factor(&self, factor: f64) -> f64 {
        std::mem::replace(&mut self.config.borrow_mut().increase_factor, factor)
    }

    /// Sets the cache to `table size / ratio` entries; `0` keeps a fixed cache size.
    pub fn set_cache_ratio(&self, ratio: usize) -> usize {
        let old = std::mem::replace(&mut self.config.borrow_mut().cache_ratio, ratio);
        if ratio > 0 {
            let capacity = self.table.borrow().capacity();
            self.resize_cache(capacity);
        }
        old
    }

    pub fn set_cache_size(&self, entries: usize) -> usize {
        let old = std::mem::replace(&mut self.config.borrow_mut().cache_size, entries);
        let capacity = self.table.borrow().capacity();
        self.resize_cache(capacity);
        old
    }

    /// Grows the node table to `size` slots. Returns the previous capacity.
    ///
    /// The table never shrinks below its current capacity.
    pub fn set_node_table_size(&self, size: usize) -> Result<usize> {
        self.check_live()?;
        let old = self.table.borrow().capacity();
        self.config.borrow_mut().node_table_size = size;
        if size > old {
            self.resize_table(size);
        }
        Ok(old)
    }

    pub fn set_gc_hook(&self, hook: Option<GcHook>) -> Option<GcHook> {
        std::mem::replace(&mut self.hooks.borrow_mut().gc, hook)
    }

    pub fn set_resize_hook(&self, hook: Option<ResizeHook>) -> Option<ResizeHook> {
        std::mem::replace(&mut self.hooks.borrow_mut().resize, hook)
    }

    pub fn set_reorder_hook(&self, hook: Option<ReorderHook>) -> Option<ReorderHook> {
        std::mem::replace(&mut self.hooks.borrow_mut().reorder, hook)
    }

    fn resize_cache(&self, table_size: usize) {
        let entries = self.config.borrow().cache_entries_for(table_size);
        let bits = bits_for(entries);
        let mut cache = self.cache.borrow_mut();
        if cache.capacity() != 1 << bits {
            cache.resize(bits);
        }
    }

    fn resize_table(&self, new_size: usize) {
        let old = {
            let mut table = self.table.borrow_mut();
            let old = table.capacity();
            table.resize(new_size);
            old
        };
        debug!("node table resized: {} -> {}", old, new_size);
        self.resize_cache(new_size);

        let hook = self.hooks.borrow_mut().resize.take();
        if let Some(mut hook) = hook {
            hook(old, new_size);
            let mut hooks = self.hooks.borrow_mut();
            if hooks.resize.is_none() {
                hooks.resize = Some(hook);
            }
        }
    }

    /// Grows the table by one step. Returns `false` if limits forbid it.
    pub(crate) fn grow(&self) -> bool {
        let current = self.table.borrow().capacity();
        let next = self.config.borrow().next_table_size(current);
        match next {
            Some(size) => {
                self.resize_table(size);
                true
            }
            None => false,
        }
    }
}

// Variable universe.
impl Bdd {
    pub fn var_num(&self) -> usize {
        self.vars.borrow().len()
    }

    /// Declares variables up to `n`. Returns the previous count.
    ///
    /// The count cannot decrease.
    pub fn set_var_num(&self, n: usize) -> Result<usize> {
        self.check_live()?;
        let old = self.var_num();
        if n < old {
            return Err(BddError::invalid_argument(format!(
                "cannot decrease the number of variables from {} to {}",
                old, n
            )));
        }
        if n > MAX_VARS {
            return Err(BddError::invalid_argument(format!("too many variables: {}", n)));
        }
        while self.var_num() < n {
            self.new_var()?;
        }
        debug!("set_var_num: {} -> {}", old, n);
        Ok(old)
    }

    /// Declares `delta` more variables. Returns the previous count.
    pub fn ext_var_num(&self, delta: usize) -> Result<usize> {
        self.check_live()?;
        let n = self.var_num();
        self.set_var_num(n + delta)
    }

    /// Adds one variable at the bottom of the order and builds its pinned literal node.
    fn new_var(&self) -> Result<Var> {
        let v = {
            let mut table = self.table.borrow_mut();
            let v = table.add_var();
            self.order.borrow_mut().push(v);
            v
        };
        let x = self.with_retry("new_var", &[], |bdd| bdd.mk(v, Ref::ZERO, Ref::ONE))?;
        self.table.borrow_mut().pin(x.id());
        self.vars.borrow_mut().push(x);
        Ok(v)
    }

    /// The function `v`.
    pub fn ith_var(&self, v: Var) -> Result<Ref> {
        self.check_live()?;
        self.check_var(v)?;
        Ok(self.vars.borrow()[v.index()])
    }

    /// The function `¬v`.
    pub fn nith_var(&self, v: Var) -> Result<Ref> {
        self.ith_var(v).map(|x| -x)
    }

    pub fn var2level(&self, v: Var) -> Result<Level> {
        self.check_live()?;
        self.check_var(v)?;
        Ok(self.order.borrow().level(v))
    }

    pub fn level2var(&self, level: Level) -> Result<Var> {
        self.check_live()?;
        if level.index() >= self.var_num() {
            return Err(BddError::invalid_argument(format!("level {} out of range", level)));
        }
        Ok(self.order.borrow().var(level))
    }
}

// Nodes and handles.
impl Bdd {
    pub fn zero(&self) -> Ref {
        Ref::ZERO
    }

    pub fn one(&self) -> Ref {
        Ref::ONE
    }

    pub fn is_zero(&self, f: Ref) -> bool {
        f == Ref::ZERO
    }

    pub fn is_one(&self, f: Ref) -> bool {
        f == Ref::ONE
    }

    pub fn is_const(&self, f: Ref) -> bool {
        f.is_const()
    }

    /// Level of the top variable of `f`, [`Level::TERMINAL`] for constants.
    #[inline]
    pub(crate) fn level_of(&self, f: Ref) -> Level {
        if f.is_const() {
            Level::TERMINAL
        } else {
            let v = self.table.borrow().variable(f.id());
            self.order.borrow().level(v)
        }
    }

    /// Low and high children of a non-constant `f`, complement applied.
    #[inline]
    pub(crate) fn cofactors(&self, f: Ref) -> (Ref, Ref) {
        self.table.borrow().cofactors(f)
    }

    /// Cofactors of `f` with respect to the variable at `level`.
    #[inline]
    pub(crate) fn cofactors_at(&self, f: Ref, level: Level) -> (Ref, Ref) {
        if self.level_of(f) == level {
            self.cofactors(f)
        } else {
            (f, f)
        }
    }

    #[inline]
    pub(crate) fn mk(&self, v: Var, low: Ref, high: Ref) -> Result<Ref> {
        self.table.borrow_mut().mk(v, low, high)
    }

    #[inline]
    pub(crate) fn mk_at(&self, level: Level, low: Ref, high: Ref) -> Result<Ref> {
        let v = self.order.borrow().var(level);
        self.mk(v, low, high)
    }

    /// Finds or creates the node `v ? high : low`.
    ///
    /// Fails with `OrderViolation` unless `v` lies strictly above both children.
    pub fn mk_node(&self, v: Var, low: Ref, high: Ref) -> Result<Ref> {
        self.check_live()?;
        self.check_var(v)?;
        self.check_ref(low)?;
        self.check_ref(high)?;
        let level = self.order.borrow().level(v);
        if level >= self.level_of(low) || level >= self.level_of(high) {
            return Err(BddError::order_violation(format!(
                "{} at {} is not above its children ({} / {})",
                v,
                level,
                self.level_of(low),
                self.level_of(high)
            )));
        }
        self.with_retry("mk_node", &[low, high], |bdd| bdd.mk(v, low, high))
    }

    /// Top variable of `f`.
    pub fn var(&self, f: Ref) -> Result<Var> {
        self.check_live()?;
        self.check_ref(f)?;
        if f.is_const() {
            return Err(BddError::invalid_argument("constant has no variable"));
        }
        Ok(self.table.borrow().variable(f.id()))
    }

    /// The `v = false` branch of `f`.
    pub fn low(&self, f: Ref) -> Result<Ref> {
        self.var(f)?;
        Ok(self.cofactors(f).0)
    }

    /// The `v = true` branch of `f`.
    pub fn high(&self, f: Ref) -> Result<Ref> {
        self.var(f)?;
        Ok(self.cofactors(f).1)
    }

    /// Increments the external reference count of `f` and returns `f`.
    pub fn add_ref(&self, f: Ref) -> Result<Ref> {
        self.check_live()?;
        self.check_ref(f)?;
        if !f.is_const() {
            self.table.borrow_mut().inc_ref(f.id());
        }
        Ok(f)
    }

    /// Decrements the external reference count of `f` and returns `f`.
    ///
    /// Fails with `InvalidReference` if the count is already zero.
    pub fn del_ref(&self, f: Ref) -> Result<Ref> {
        self.check_live()?;
        self.check_ref(f)?;
        if !f.is_const() && !self.table.borrow_mut().dec_ref(f.id()) {
            return Err(BddError::invalid_reference(format!("{} released more often than referenced", f)));
        }
        Ok(f)
    }

    /// External reference count of `f`; `u32::MAX` means pinned.
    pub fn ref_count(&self, f: Ref) -> Result<u32> {
        self.check_live()?;
        self.check_ref(f)?;
        Ok(self.table.borrow().ref_count(f.id()))
    }

    /// Evaluates `f` under a total assignment indexed by variable id.
    pub fn eval(&self, f: Ref, assignment: &[bool]) -> Result<bool> {
        self.check_live()?;
        self.check_ref(f)?;
        if assignment.len() < self.var_num() {
            return Err(BddError::invalid_argument(format!(
                "assignment has {} values for {} variables",
                assignment.len(),
                self.var_num()
            )));
        }
        let table = self.table.borrow();
        let mut cur = f;
        while !cur.is_const() {
            let v = table.variable(cur.id());
            let (low, high) = table.cofactors(cur);
            cur = if assignment[v.index()] { high } else { low };
        }
        Ok(cur == Ref::ONE)
    }
}

// Operation driver.
impl Bdd {
    /// Runs a node-building operation.
    ///
    /// Validates the operands, gives automatic reordering a chance to run,
    /// then executes `op`, restarting it after garbage collection and table
    /// growth whenever the node table fills up.
    pub(crate) fn run_op<T>(&self, name: &str, operands: &[Ref], op: impl FnMut(&Bdd) -> Result<T>) -> Result<T> {
        self.check_live()?;
        for &f in operands {
            self.check_ref(f)?;
        }
        self.maybe_auto_reorder(operands)?;
        self.with_retry(name, operands, op)
    }

    pub(crate) fn with_retry<T>(
        &self,
        name: &str,
        protect: &[Ref],
        mut op: impl FnMut(&Bdd) -> Result<T>,
    ) -> Result<T> {
        let mut attempt = 0;
        loop {
            match op(self) {
                Err(e) if e.kind() == ErrorKind::ResourceExhausted => {
                    debug!("{}: {}, attempt {}", name, e, attempt + 1);
                    self.make_room(protect, attempt > 0)?;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Collects garbage and grows the table if it is too crowded.
    ///
    /// With `force_grow`, the table must grow: the previous attempt already
    /// failed with everything collectable collected.
    fn make_room(&self, protect: &[Ref], force_grow: bool) -> Result<()> {
        self.collect_garbage(protect);
        let (free, capacity) = {
            let table = self.table.borrow();
            (table.free_count(), table.capacity())
        };
        let min_free = self.config.borrow().min_free_nodes;
        if force_grow || free * 100 < min_free * capacity {
            let grown = self.grow();
            if !grown && (force_grow || free == 0) {
                return Err(BddError::exhausted(format!(
                    "node table cannot grow beyond {} nodes",
                    capacity
                )));
            }
        }
        Ok(())
    }
}
