//! Observers for garbage collection, table resizing and reordering.
//!
//! Hooks are plain closures installed on the manager. They only receive
//! event data, never the manager itself, and the manager holds no internal
//! borrow while calling them.

use std::fmt;
use std::ops::ControlFlow;
use std::time::Duration;

use crate::reorder::ReorderMethod;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GcPhase {
    Before,
    After,
}

/// Figures reported to the GC hook.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct GcStats {
    /// Live nodes before the collection.
    pub nodes_before: usize,
    /// Live nodes after the collection; equal to `nodes_before` in the `Before` phase.
    pub nodes_after: usize,
    /// Table capacity at the time of the collection.
    pub capacity: usize,
    /// Time spent collecting; zero in the `Before` phase.
    pub elapsed: Duration,
    /// Number of collections so far, this one included.
    pub collections: usize,
}

impl GcStats {
    pub fn freed(&self) -> usize {
        self.nodes_before.saturating_sub(self.nodes_after)
    }
}

impl fmt::Display for GcStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gc #{}: {} -> {} nodes ({} freed, capacity {}) in {:?}",
            self.collections,
            self.nodes_before,
            self.nodes_after,
            self.freed(),
            self.capacity,
            self.elapsed
        )
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ReorderPhase {
    Start,
    /// After each block swap.
    Progress,
    Done,
}

/// Event passed to the reorder hook.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ReorderEvent {
    pub phase: ReorderPhase,
    pub method: ReorderMethod,
    /// Live nodes at this point.
    pub nodes: usize,
    /// Adjacent level swaps performed so far.
    pub swaps: usize,
}

pub type GcHook = Box<dyn FnMut(GcPhase, &GcStats)>;
/// Called with the old and the new table capacity.
pub type ResizeHook = Box<dyn FnMut(usize, usize)>;
/// Returning `Break` stops reordering after the current swap.
pub type ReorderHook = Box<dyn FnMut(&ReorderEvent) -> ControlFlow<()>>;

#[derive(Default)]
pub(crate) struct Hooks {
    pub gc: Option<GcHook>,
    pub resize: Option<ResizeHook>,
    pub reorder: Option<ReorderHook>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("gc", &self.gc.is_some())
            .field("resize", &self.resize.is_some())
            .field("reorder", &self.reorder.is_some())
            .finish()
    }
}
