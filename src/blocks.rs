//! Variable blocks: groups of variables that reordering moves as a unit.
//!
//! Blocks form a forest. A block either contains another block completely
//! or is disjoint from it; partial overlaps are rejected. A block marked as
//! fixed keeps its internal order, but still moves as a whole among its
//! siblings.

use crate::error::{BddError, Result};
use crate::types::Var;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBlock {
    /// Variables of the block, sorted by id.
    pub vars: Vec<Var>,
    pub fixed: bool,
    pub children: Vec<VarBlock>,
}

impl VarBlock {
    pub fn new(mut vars: Vec<Var>, fixed: bool) -> Self {
        vars.sort();
        vars.dedup();
        Self {
            vars,
            fixed,
            children: Vec::new(),
        }
    }

    fn contains(&self, var: Var) -> bool {
        self.vars.binary_search(&var).is_ok()
    }

    fn is_subset_of(&self, other: &VarBlock) -> bool {
        self.vars.iter().all(|&v| other.contains(v))
    }

    fn intersects(&self, other: &VarBlock) -> bool {
        self.vars.iter().any(|&v| other.contains(v))
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlockTree {
    roots: Vec<VarBlock>,
}

impl BlockTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn roots(&self) -> &[VarBlock] {
        &self.roots
    }

    pub fn clear(&mut self) {
        self.roots.clear();
    }

    /// Inserts a block, nesting it inside or around existing blocks.
    pub fn insert(&mut self, block: VarBlock) -> Result<()> {
        if block.vars.is_empty() {
            return Err(BddError::invalid_argument("empty variable block"));
        }
        insert_into(&mut self.roots, block)
    }
}

fn insert_into(siblings: &mut Vec<VarBlock>, mut block: VarBlock) -> Result<()> {
    if let Some(pos) = siblings.iter().position(|s| block.is_subset_of(s)) {
        let parent = &mut siblings[pos];
        if parent.vars == block.vars {
            return Ok(());
        }
        return insert_into(&mut parent.children, block);
    }

    if siblings.iter().any(|s| s.intersects(&block) && !s.is_subset_of(&block)) {
        return Err(BddError::invalid_argument(format!(
            "variable block {:?} partially overlaps an existing block",
            block.vars
        )));
    }

    let (inner, outer): (Vec<_>, Vec<_>) = siblings.drain(..).partition(|s| s.is_subset_of(&block));
    block.children.extend(inner);
    *siblings = outer;
    siblings.push(block);
    Ok(())
}

/// Splits `vars` into the units reordering moves: one per child block, then
/// one per variable outside every child.
pub fn units(vars: &[Var], children: &[VarBlock]) -> Vec<Vec<Var>> {
    let mut result: Vec<Vec<Var>> = children.iter().map(|c| c.vars.clone()).collect();
    for &v in vars {
        if !children.iter().any(|c| c.contains(v)) {
            result.push(vec![v]);
        }
    }
    result
}
