use crate::reference::Ref;
use crate::types::Var;
use crate::utils::{pairing3, MyHash};

/// A decision node: `variable ? high : low`.
///
/// The stored `high` edge is always regular; negation lives on incoming edges.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Node {
    pub variable: Var,
    pub low: Ref,
    pub high: Ref,
}

impl Node {
    pub const fn new(variable: Var, low: Ref, high: Ref) -> Self {
        Self { variable, low, high }
    }

    /// The node stored in slot 0.
    pub const TERMINAL: Node = Node {
        variable: Var::TERMINAL,
        low: Ref::ONE,
        high: Ref::ONE,
    };

    pub const fn is_terminal(&self) -> bool {
        self.variable.is_terminal()
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::TERMINAL
    }
}

impl MyHash for Node {
    fn hash(&self) -> u64 {
        pairing3(self.variable.id() as u64, self.low.raw() as u64, self.high.raw() as u64)
    }
}
