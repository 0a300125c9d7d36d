//! Type-safe wrappers for BDD variables, levels, node indices and literals.
//!
//! Variables and levels are both plain integers underneath, but they mean
//! very different things: a variable is a stable name, a level is its current
//! position in the order. Keeping them apart in the type system rules out the
//! classic bug of comparing a variable id where a level was meant.
use std::fmt;
use std::ops::Neg;

/// A variable identifier (0-indexed).
///
/// Variable ids are stable for the lifetime of the manager, reordering only
/// changes their [`Level`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// Marker stored in the terminal node.
    pub(crate) const TERMINAL: Var = Var(u32::MAX);

    /// Creates a new variable with the given id.
    pub const fn new(id: u32) -> Self {
        Var(id)
    }

    /// Returns the raw variable id.
    pub const fn id(self) -> u32 {
        self.0
    }

    /// Returns the raw variable id as an index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn is_terminal(self) -> bool {
        self.0 == u32::MAX
    }

    /// Positive literal of this variable.
    pub const fn pos(self) -> Lit {
        Lit::new(self, false)
    }

    /// Negative literal of this variable.
    pub const fn neg(self) -> Lit {
        Lit::new(self, true)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<u32> for Var {
    fn from(id: u32) -> Self {
        Var(id)
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

/// A level in the variable ordering (0-indexed).
///
/// # Invariants
///
/// - Level 0 is the topmost level (closest to root)
/// - Levels increase downward toward terminals
/// - The terminal node sits below every variable, at [`Level::TERMINAL`]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Level(u32);

impl Level {
    /// Pseudo-level of the terminal node.
    pub const TERMINAL: Level = Level(u32::MAX);

    /// Creates a new level with the given index.
    pub const fn new(index: u32) -> Self {
        Level(index)
    }

    /// Returns the raw level index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw level value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the next level down (index + 1).
    pub const fn next(self) -> Self {
        Level(self.0 + 1)
    }

    /// Returns the previous level up (index - 1), or None if at level 0.
    pub fn prev(self) -> Option<Self> {
        if self.0 > 0 {
            Some(Level(self.0 - 1))
        } else {
            None
        }
    }

    /// Checks if this is the terminal pseudo-level.
    pub const fn is_terminal(self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_terminal() {
            write!(f, "L⊥")
        } else {
            write!(f, "L{}", self.0)
        }
    }
}

impl From<usize> for Level {
    fn from(index: usize) -> Self {
        Level(index as u32)
    }
}

/// Index of a slot in the node table.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// The single terminal node.
    pub const TERMINAL: NodeId = NodeId(0);

    /// Largest index representable inside a [`Ref`][crate::reference::Ref].
    pub const MAX: u32 = 0x7FFF_FFFE;

    /// Creates a node id.
    ///
    /// # Panics
    ///
    /// Panics if `raw` exceeds [`NodeId::MAX`].
    pub const fn new(raw: u32) -> Self {
        assert!(raw <= Self::MAX, "NodeId out of range");
        NodeId(raw)
    }

    /// Creates a node id without the range check.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `raw <= NodeId::MAX`.
    pub const unsafe fn from_raw_unchecked(raw: u32) -> Self {
        NodeId(raw)
    }

    /// Returns the raw index.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the index as `usize`.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Checks if this is the terminal node.
    pub const fn is_terminal(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(raw: u32) -> Self {
        NodeId::new(raw)
    }
}

/// A literal: a variable together with a polarity.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Lit {
    var: Var,
    negated: bool,
}

impl Lit {
    pub const fn new(var: Var, negated: bool) -> Self {
        Self { var, negated }
    }

    pub const fn pos(var: Var) -> Self {
        Self::new(var, false)
    }

    pub const fn neg(var: Var) -> Self {
        Self::new(var, true)
    }

    pub const fn var(self) -> Var {
        self.var
    }

    pub const fn is_negated(self) -> bool {
        self.negated
    }

    pub const fn is_positive(self) -> bool {
        !self.negated
    }

    /// The value the variable takes under this literal.
    pub const fn value(self) -> bool {
        !self.negated
    }
}

impl Neg for Lit {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(self.var, !self.negated)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "~{}", self.var)
        } else {
            write!(f, "{}", self.var)
        }
    }
}
