//! Mark & sweep garbage collection.
//!
//! Roots are all nodes with a non-zero external reference count (pinned
//! variable nodes included) plus any extra handles an operation asks to
//! protect. Everything not reachable from a root is returned to the free
//! list and the operation cache is invalidated.

use std::time::Instant;

use log::debug;

use crate::bdd::Bdd;
use crate::error::Result;
use crate::hooks::{GcPhase, GcStats};
use crate::reference::Ref;

impl Bdd {
    /// Runs a garbage collection. Returns the number of nodes reclaimed.
    pub fn gc(&self) -> Result<usize> {
        self.check_live()?;
        Ok(self.collect_garbage(&[]))
    }

    /// Number of collections performed so far.
    pub fn gc_count(&self) -> usize {
        self.gc_count.get()
    }

    pub(crate) fn collect_garbage(&self, protect: &[Ref]) -> usize {
        let (before, capacity) = {
            let table = self.table.borrow();
            (table.live_count(), table.capacity())
        };
        let collections = self.gc_count.get() + 1;
        self.gc_count.set(collections);

        let mut stats = GcStats {
            nodes_before: before,
            nodes_after: before,
            capacity,
            elapsed: Default::default(),
            collections,
        };
        self.fire_gc_hook(GcPhase::Before, &stats);

        let start = Instant::now();
        {
            let mut table = self.table.borrow_mut();
            let mut marked = vec![false; table.slots()];
            marked[0] = true;

            let mut stack: Vec<Ref> = table.referenced_ids().map(|id| table.handle(id)).collect();
            stack.extend(protect.iter().copied());
            while let Some(f) = stack.pop() {
                let i = f.id().index();
                if marked[i] {
                    continue;
                }
                marked[i] = true;
                let node = table.node(f.id());
                stack.push(node.low);
                stack.push(node.high);
            }

            let dead: Vec<_> = table.live_ids().filter(|id| !marked[id.index()]).collect();
            for id in dead {
                table.release(id);
            }
            stats.nodes_after = table.live_count();
        }
        self.cache.borrow_mut().clear();
        stats.elapsed = start.elapsed();

        debug!("{}", stats);
        self.fire_gc_hook(GcPhase::After, &stats);
        stats.freed()
    }

    fn fire_gc_hook(&self, phase: GcPhase, stats: &GcStats) {
        let hook = self.hooks.borrow_mut().gc.take();
        if let Some(mut hook) = hook {
            hook(phase, stats);
            let mut hooks = self.hooks.borrow_mut();
            if hooks.gc.is_none() {
                hooks.gc = Some(hook);
            }
        }
    }
}
