//! Per-variable unique subtables.
//!
//! The manager keeps one subtable per variable. Each subtable maps the
//! `(low, high)` children of a node to its slot in the node table; the
//! variable is implicit. Because nodes are filed by variable rather than by
//! level, swapping two adjacent levels only touches the two subtables of the
//! variables involved.

use std::collections::HashMap;

use crate::reference::Ref;
use crate::types::{NodeId, Var};

/// Unique table for the nodes labelled with a single variable.
#[derive(Debug, Clone)]
pub struct Subtable {
    pub variable: Var,
    nodes: HashMap<(Ref, Ref), NodeId>,
}

impl Subtable {
    pub fn new(variable: Var) -> Self {
        Self {
            variable,
            nodes: HashMap::new(),
        }
    }

    /// Look up a node by its children.
    pub fn find(&self, low: Ref, high: Ref) -> Option<NodeId> {
        self.nodes.get(&(low, high)).copied()
    }

    pub fn insert(&mut self, low: Ref, high: Ref, id: NodeId) {
        self.nodes.insert((low, high), id);
    }

    pub fn remove(&mut self, low: Ref, high: Ref) -> Option<NodeId> {
        self.nodes.remove(&(low, high))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids in this subtable, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.values().copied()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtable_basic() {
        let mut st = Subtable::new(Var::new(1));

        let low = Ref::ZERO;
        let high = Ref::ONE;

        assert!(st.find(low, high).is_none());

        st.insert(low, high, NodeId::new(42));
        assert_eq!(st.find(low, high), Some(NodeId::new(42)));
        assert_eq!(st.len(), 1);

        st.remove(low, high);
        assert!(st.find(low, high).is_none());
        assert!(st.is_empty());
    }

    #[test]
    fn test_subtable_multiple_nodes() {
        let mut st = Subtable::new(Var::new(1));
        let a = Ref::positive(NodeId::new(2));
        let b = Ref::positive(NodeId::new(3));

        st.insert(Ref::ZERO, Ref::ONE, NodeId::new(10));
        st.insert(a, b, NodeId::new(20));
        st.insert(-a, b, NodeId::new(30));

        assert_eq!(st.len(), 3);
        assert_eq!(st.find(a, b), Some(NodeId::new(20)));
        assert_eq!(st.find(-a, b), Some(NodeId::new(30)));
        let mut ids: Vec<_> = st.ids().map(NodeId::raw).collect();
        ids.sort();
        assert_eq!(ids, vec![10, 20, 30]);
    }
}
