//! Building cubes and sets, structural queries and textual diagnostics.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::fmt::Write;

use log::debug;

use crate::bdd::Bdd;
use crate::error::{BddError, Result};
use crate::reference::Ref;
use crate::types::{Level, Lit, NodeId, Var};

/// Snapshot of the manager's counters, see [`Bdd::stats`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BddStats {
    pub vars: usize,
    /// Live nodes, the terminal included.
    pub nodes: usize,
    pub capacity: usize,
    pub free: usize,
    pub gc_count: usize,
    pub cache_entries: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub reorders: usize,
}

impl fmt::Display for BddStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Variables      : {}", self.vars)?;
        writeln!(f, "Live nodes     : {}", self.nodes)?;
        writeln!(f, "Table capacity : {}", self.capacity)?;
        writeln!(f, "Free nodes     : {}", self.free)?;
        writeln!(f, "Collections    : {}", self.gc_count)?;
        writeln!(f, "Reorderings    : {}", self.reorders)?;
        writeln!(f, "Cache entries  : {}", self.cache_entries)?;
        writeln!(f, "Cache hits     : {}", self.cache_hits)?;
        write!(f, "Cache misses   : {}", self.cache_misses)
    }
}

impl Bdd {
    /// Sorts literals by level; `None` if some variable occurs with both signs.
    fn levels_of_lits(&self, lits: &[Lit]) -> Result<Option<Vec<(Level, bool)>>> {
        let order = self.order.borrow();
        let mut levels = Vec::with_capacity(lits.len());
        for &lit in lits {
            self.check_var(lit.var())?;
            levels.push((order.level(lit.var()), lit.value()));
        }
        levels.sort();
        levels.dedup();
        if levels.windows(2).any(|w| w[0].0 == w[1].0) {
            return Ok(None);
        }
        Ok(Some(levels))
    }

    /// Conjunction of the positive literals of `vars`, used as a variable set.
    pub fn make_set(&self, vars: &[Var]) -> Result<Ref> {
        debug!("make_set(vars = {:?})", vars);
        let lits: Vec<Lit> = vars.iter().map(|&v| Lit::pos(v)).collect();
        self.mk_cube(lits)
    }

    /// Cube over `vars` whose polarities are the bits of `value`.
    ///
    /// The least significant bit goes to the last variable of `vars`.
    pub fn build_cube(&self, value: u64, vars: &[Var]) -> Result<Ref> {
        if vars.len() > 64 {
            return Err(BddError::invalid_argument(format!(
                "cannot take {} bits from a 64-bit value",
                vars.len()
            )));
        }
        let n = vars.len();
        let lits: Vec<Lit> = vars
            .iter()
            .enumerate()
            .map(|(i, &v)| Lit::new(v, (value >> (n - 1 - i)) & 1 == 0))
            .collect();
        self.mk_cube(lits)
    }

    /// Conjunction of `lits`; `0` if it mentions a variable with both signs.
    pub fn mk_cube(&self, lits: impl IntoIterator<Item = Lit>) -> Result<Ref> {
        let lits: Vec<Lit> = lits.into_iter().collect();
        self.run_op("mk_cube", &[], |bdd| match bdd.levels_of_lits(&lits)? {
            Some(levels) => bdd.cube_at_levels(&levels),
            None => Ok(Ref::ZERO),
        })
    }

    /// Disjunction of `lits`; `1` if it mentions a variable with both signs.
    pub fn mk_clause(&self, lits: impl IntoIterator<Item = Lit>) -> Result<Ref> {
        self.mk_cube(lits.into_iter().map(|lit| -lit)).map(|c| -c)
    }

    /// Ids of all decision nodes reachable from `roots`.
    pub(crate) fn descendants(&self, roots: &[Ref]) -> Vec<NodeId> {
        let table = self.table.borrow();
        let mut visited = HashSet::new();
        let mut result = Vec::new();
        let mut queue: VecDeque<Ref> = roots.iter().copied().collect();
        while let Some(f) = queue.pop_front() {
            if f.is_const() || !visited.insert(f.id()) {
                continue;
            }
            result.push(f.id());
            let node = table.node(f.id());
            queue.push_back(node.low);
            queue.push_back(node.high);
        }
        result
    }

    /// The set of variables `f` depends on, as a positive cube.
    pub fn support(&self, f: Ref) -> Result<Ref> {
        debug!("support(f = {})", f);
        self.run_op("support", &[f], |bdd| {
            let mut levels: Vec<(Level, bool)> = bdd
                .descendants(&[f])
                .into_iter()
                .map(|id| (bdd.level_of(Ref::positive(id)), true))
                .collect();
            levels.sort();
            levels.dedup();
            bdd.cube_at_levels(&levels)
        })
    }

    /// Number of decision nodes in `f`; terminals are not counted.
    pub fn node_count(&self, f: Ref) -> Result<usize> {
        self.node_count_many(&[f])
    }

    /// Number of decision nodes shared by all `roots`.
    pub fn node_count_many(&self, roots: &[Ref]) -> Result<usize> {
        self.check_live()?;
        for &f in roots {
            self.check_ref(f)?;
        }
        Ok(self.descendants(roots).len())
    }

    /// Number of nodes of `f` labelled with each variable, by variable id.
    pub fn var_profile(&self, f: Ref) -> Result<Vec<usize>> {
        self.check_live()?;
        self.check_ref(f)?;
        let mut profile = vec![0; self.var_num()];
        let table = self.table.borrow();
        for id in self.descendants(&[f]) {
            profile[table.variable(id).index()] += 1;
        }
        Ok(profile)
    }

    /// Current order, one `level: variable` pair per line.
    pub fn print_order(&self) -> Result<String> {
        self.check_live()?;
        let mut out = String::new();
        for (level, var) in self.order.borrow().vars().iter().enumerate() {
            let _ = writeln!(out, "{}: {}", level, var);
        }
        Ok(out)
    }

    fn print_nodes(&self, ids: impl IntoIterator<Item = NodeId>) -> String {
        let table = self.table.borrow();
        let order = self.order.borrow();
        let mut out = String::new();
        for id in ids {
            let node = table.node(id);
            let _ = writeln!(
                out,
                "[{:>5}] {:>4} (level {:>3}): {} {} (refs {})",
                id,
                node.variable,
                order.level(node.variable),
                node.low,
                node.high,
                table.ref_count(id)
            );
        }
        out
    }

    /// Every live decision node.
    pub fn print_all(&self) -> Result<String> {
        self.check_live()?;
        let ids: Vec<_> = self.table.borrow().live_ids().collect();
        Ok(self.print_nodes(ids))
    }

    /// Every decision node of `f`, sorted by id.
    pub fn print_table(&self, f: Ref) -> Result<String> {
        self.check_live()?;
        self.check_ref(f)?;
        let mut ids = self.descendants(&[f]);
        ids.sort();
        let mut out = format!("root {}\n", f);
        out.push_str(&self.print_nodes(ids));
        Ok(out)
    }

    /// Satisfying paths of `f`, as in `<x0:1, x2:0><x0:0>`.
    pub fn print_set(&self, f: Ref) -> Result<String> {
        let mut out = String::new();
        for path in self.all_sat(f)? {
            out.push('<');
            let lits: Vec<String> = path
                .iter()
                .enumerate()
                .filter_map(|(i, v)| v.map(|v| format!("{}:{}", Var::new(i as u32), v as u8)))
                .collect();
            out.push_str(&lits.join(", "));
            out.push('>');
        }
        Ok(out)
    }

    pub fn stats(&self) -> BddStats {
        let table = self.table.borrow();
        let cache = self.cache.borrow();
        BddStats {
            vars: self.var_num(),
            nodes: table.live_count(),
            capacity: table.capacity(),
            free: table.free_count(),
            gc_count: self.gc_count.get(),
            cache_entries: cache.capacity(),
            cache_hits: cache.hits(),
            cache_misses: cache.misses(),
            reorders: self.reorder.borrow().count,
        }
    }
}
