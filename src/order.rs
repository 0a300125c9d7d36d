//! Variable order: the permutation between variables and levels.

use crate::types::{Level, Var};

#[derive(Debug, Clone, Default)]
pub struct VarOrder {
    var2level: Vec<Level>,
    level2var: Vec<Var>,
}

impl VarOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.level2var.len()
    }

    pub fn is_empty(&self) -> bool {
        self.level2var.is_empty()
    }

    /// Appends a new variable at the bottom of the order.
    pub fn push(&mut self, var: Var) {
        debug_assert_eq!(var.index(), self.var2level.len());
        self.var2level.push(Level::new(self.level2var.len() as u32));
        self.level2var.push(var);
    }

    #[inline]
    pub fn level(&self, var: Var) -> Level {
        if var.is_terminal() {
            Level::TERMINAL
        } else {
            self.var2level[var.index()]
        }
    }

    #[inline]
    pub fn var(&self, level: Level) -> Var {
        self.level2var[level.index()]
    }

    /// Exchanges the variables at `level` and `level + 1`.
    pub fn swap_adjacent(&mut self, level: Level) {
        let (l, n) = (level.index(), level.index() + 1);
        self.level2var.swap(l, n);
        self.var2level[self.level2var[l].index()] = Level::new(l as u32);
        self.var2level[self.level2var[n].index()] = Level::new(n as u32);
    }

    /// Variables from the top level down.
    pub fn vars(&self) -> &[Var] {
        &self.level2var
    }

    pub fn clear(&mut self) {
        self.var2level.clear();
        self.level2var.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_swap() {
        let mut order = VarOrder::new();
        for i in 0..3 {
            order.push(Var::new(i));
        }
        assert_eq!(order.level(Var::new(2)), Level::new(2));

        order.swap_adjacent(Level::new(1));
        assert_eq!(order.vars(), &[Var::new(0), Var::new(2), Var::new(1)]);
        assert_eq!(order.level(Var::new(2)), Level::new(1));
        assert_eq!(order.level(Var::new(1)), Level::new(2));
        assert_eq!(order.var(Level::new(2)), Var::new(1));
    }

    #[test]
    fn test_terminal_level() {
        let order = VarOrder::new();
        assert_eq!(order.level(Var::TERMINAL), Level::TERMINAL);
    }
}
