//! Node arena with hash-consing, external reference counts and a free list.
//!
//! Slot 0 holds the terminal node. Every other live slot holds a decision
//! node that is also filed in the [`Subtable`] of its variable, so that
//! structurally equal nodes are never stored twice.
//!
//! The table has a logical `capacity`: allocation fails once that many slots
//! are live, and the manager decides whether to collect garbage, grow the
//! table, or give up.

use crate::error::{BddError, Result};
use crate::node::Node;
use crate::reference::Ref;
use crate::subtable::Subtable;
use crate::types::{NodeId, Var};

/// Reference count value that marks a node as pinned.
pub const PINNED: u32 = u32::MAX;

#[derive(Debug)]
pub struct NodeTable {
    nodes: Vec<Node>,
    refs: Vec<u32>,
    alive: Vec<bool>,
    /// Slot generations, bumped every time a slot is released.
    tags: Vec<u32>,
    free: Vec<NodeId>,
    capacity: usize,
    subtables: Vec<Subtable>,
}

impl NodeTable {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        let mut nodes = Vec::with_capacity(capacity);
        nodes.push(Node::TERMINAL);
        Self {
            nodes,
            refs: vec![PINNED],
            alive: vec![true],
            tags: vec![0],
            free: Vec::new(),
            capacity,
            subtables: Vec::new(),
        }
    }

    /// Number of slots the table may hold before it has to grow.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots ever touched, live or free.
    pub fn slots(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live nodes, the terminal included.
    pub fn live_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Number of nodes that can still be allocated without growing.
    pub fn free_count(&self) -> usize {
        self.capacity - self.live_count()
    }

    pub fn resize(&mut self, capacity: usize) {
        debug_assert!(capacity >= self.live_count());
        self.capacity = capacity;
        self.nodes.reserve(capacity.saturating_sub(self.nodes.len()));
    }

    pub fn num_vars(&self) -> usize {
        self.subtables.len()
    }

    /// Registers a subtable for the next variable.
    pub fn add_var(&mut self) -> Var {
        let v = Var::new(self.subtables.len() as u32);
        self.subtables.push(Subtable::new(v));
        v
    }

    pub fn subtable(&self, var: Var) -> &Subtable {
        &self.subtables[var.index()]
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.alive.get(id.index()).copied().unwrap_or(false)
    }

    /// Whether `f` still names the node it was handed out for.
    pub fn is_current(&self, f: Ref) -> bool {
        self.is_alive(f.id()) && self.tags[f.id().index()] == f.tag()
    }

    /// The regular reference to the live node in slot `id`.
    #[inline]
    pub fn handle(&self, id: NodeId) -> Ref {
        Ref::positive(id).with_tag(self.tags[id.index()])
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Node {
        self.nodes[id.index()]
    }

    #[inline]
    pub fn variable(&self, id: NodeId) -> Var {
        self.nodes[id.index()].variable
    }

    /// Children of `f`, with the complement bit of `f` pushed down.
    #[inline]
    pub fn cofactors(&self, f: Ref) -> (Ref, Ref) {
        let node = self.nodes[f.id().index()];
        (node.low.negate_if(f.is_negated()), node.high.negate_if(f.is_negated()))
    }

    pub fn ref_count(&self, id: NodeId) -> u32 {
        self.refs[id.index()]
    }

    pub fn inc_ref(&mut self, id: NodeId) {
        let rc = &mut self.refs[id.index()];
        if *rc != PINNED {
            *rc += 1;
        }
    }

    /// Decrements the external count. Returns `false` if it was already zero.
    pub fn dec_ref(&mut self, id: NodeId) -> bool {
        let rc = &mut self.refs[id.index()];
        match *rc {
            0 => false,
            PINNED => true,
            _ => {
                *rc -= 1;
                true
            }
        }
    }

    pub fn pin(&mut self, id: NodeId) {
        self.refs[id.index()] = PINNED;
    }

    /// Finds or creates the canonical node `var ? high : low`.
    ///
    /// Children must lie strictly below `var`; the caller checks that.
    pub fn mk(&mut self, var: Var, low: Ref, high: Ref) -> Result<Ref> {
        if low == high {
            return Ok(low);
        }
        if high.is_negated() {
            return self.mk(var, -low, -high).map(|r| -r);
        }

        if let Some(id) = self.subtables[var.index()].find(low, high) {
            return Ok(self.handle(id));
        }

        let id = self
            .alloc(Node::new(var, low, high))
            .ok_or_else(|| BddError::exhausted(format!("node table full ({} nodes)", self.capacity)))?;
        self.subtables[var.index()].insert(low, high, id);
        Ok(self.handle(id))
    }

    fn alloc(&mut self, node: Node) -> Option<NodeId> {
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = node;
            self.refs[id.index()] = 0;
            self.alive[id.index()] = true;
            return Some(id);
        }
        if self.nodes.len() >= self.capacity || self.nodes.len() > NodeId::MAX as usize {
            return None;
        }
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(node);
        self.refs.push(0);
        self.alive.push(true);
        self.tags.push(0);
        Some(id)
    }

    /// Removes a node from its subtable and returns the slot to the free list.
    pub fn release(&mut self, id: NodeId) {
        debug_assert!(!id.is_terminal());
        let node = self.nodes[id.index()];
        self.subtables[node.variable.index()].remove(node.low, node.high);
        self.alive[id.index()] = false;
        self.refs[id.index()] = 0;
        self.tags[id.index()] = self.tags[id.index()].wrapping_add(1);
        self.free.push(id);
    }

    /// Detaches a node from its subtable without freeing it.
    pub fn unlink(&mut self, id: NodeId) {
        let node = self.nodes[id.index()];
        self.subtables[node.variable.index()].remove(node.low, node.high);
    }

    /// Stores new contents for a live, unlinked node and files it under its new variable.
    pub fn relink(&mut self, id: NodeId, node: Node) {
        self.nodes[id.index()] = node;
        self.subtables[node.variable.index()].insert(node.low, node.high, id);
    }

    /// Ids of all live decision nodes.
    pub fn live_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.alive
            .iter()
            .enumerate()
            .skip(1)
            .filter(|&(_, &a)| a)
            .map(|(i, _)| NodeId::new(i as u32))
    }

    /// Ids of nodes with a non-zero external reference count.
    pub fn referenced_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.live_ids().filter(|id| self.refs[id.index()] > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_vars(capacity: usize, n: usize) -> NodeTable {
        let mut table = NodeTable::new(capacity);
        for _ in 0..n {
            table.add_var();
        }
        table
    }

    #[test]
    fn test_mk_hash_consing() {
        let mut table = table_with_vars(16, 2);
        let x = table.mk(Var::new(1), Ref::ZERO, Ref::ONE).unwrap();
        let x_again = table.mk(Var::new(1), Ref::ZERO, Ref::ONE).unwrap();
        assert_eq!(x, x_again);
        assert_eq!(table.live_count(), 2);
    }

    #[test]
    fn test_mk_reduction() {
        let mut table = table_with_vars(16, 2);
        let x = table.mk(Var::new(1), Ref::ZERO, Ref::ONE).unwrap();
        assert_eq!(table.mk(Var::new(0), x, x).unwrap(), x);
        assert_eq!(table.live_count(), 2);
    }

    #[test]
    fn test_mk_keeps_high_regular() {
        let mut table = table_with_vars(16, 1);
        let x = table.mk(Var::new(0), Ref::ZERO, Ref::ONE).unwrap();
        let not_x = table.mk(Var::new(0), Ref::ONE, Ref::ZERO).unwrap();
        assert_eq!(not_x, -x);
        assert!(!table.node(x.id()).high.is_negated());
    }

    #[test]
    fn test_full_table() {
        let mut table = table_with_vars(3, 2);
        table.mk(Var::new(0), Ref::ZERO, Ref::ONE).unwrap();
        table.mk(Var::new(1), Ref::ZERO, Ref::ONE).unwrap();
        assert_eq!(table.free_count(), 0);
        let x = Ref::positive(NodeId::new(2));
        let err = table.mk(Var::new(0), Ref::ZERO, x).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ResourceExhausted);
    }

    #[test]
    fn test_release_reuses_slot() {
        let mut table = table_with_vars(4, 2);
        let x = table.mk(Var::new(0), Ref::ZERO, Ref::ONE).unwrap();
        table.release(x.id());
        assert!(!table.is_alive(x.id()));
        assert_eq!(table.live_count(), 1);
        let y = table.mk(Var::new(1), Ref::ZERO, Ref::ONE).unwrap();
        assert_eq!(y.id(), x.id());
        assert_ne!(y.tag(), x.tag());
        assert!(table.is_current(y));
        assert!(!table.is_current(x));
        // The old node is gone from its subtable.
        assert!(table.subtable(Var::new(0)).is_empty());
    }

    #[test]
    fn test_ref_counts() {
        let mut table = table_with_vars(4, 1);
        let x = table.mk(Var::new(0), Ref::ZERO, Ref::ONE).unwrap();
        assert_eq!(table.ref_count(x.id()), 0);
        assert!(!table.dec_ref(x.id()));
        table.inc_ref(x.id());
        assert_eq!(table.referenced_ids().count(), 1);
        assert!(table.dec_ref(x.id()));
        table.pin(x.id());
        table.inc_ref(x.id());
        assert!(table.dec_ref(x.id()));
        assert_eq!(table.ref_count(x.id()), PINNED);
    }
}
