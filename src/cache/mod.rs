//! Operation cache (computed table).
//!
//! Recursive algorithms memoize intermediate results under an [`OpKey`]
//! naming the operation and its operands. The cache is lossy: colliding
//! entries simply overwrite each other, and the whole cache is invalidated
//! after every garbage collection and every reordering.

mod direct_mapped;

pub use direct_mapped::{bits_for, DirectMappedCache};

use crate::apply::BddOp;
use crate::quant::Quant;
use crate::reference::Ref;
use crate::types::Var;
use crate::utils::{mix64, pairing2, pairing3, pairing4, MyHash};

/// Key of a memoized operation.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum OpKey {
    #[default]
    Empty,
    And(Ref, Ref),
    Xor(Ref, Ref),
    Ite(Ref, Ref, Ref),
    /// Quantification of `f` over the variable set `cube`.
    Quant(Quant, Ref, Ref),
    /// Fused `quant(cube, op(f, g))`.
    AppQuant(BddOp, Quant, Ref, Ref, Ref),
    Restrict(Ref, Ref),
    Constrain(Ref, Ref),
    Simplify(Ref, Ref),
    Compose(Ref, Ref, Var),
    /// Pairing-driven substitutions, keyed by the pairing's version.
    Replace(Ref, u64),
    VecCompose(Ref, u64),
}

#[inline]
fn r(x: Ref) -> u64 {
    x.raw() as u64
}

impl MyHash for OpKey {
    fn hash(&self) -> u64 {
        let h = match *self {
            OpKey::Empty => 0,
            OpKey::And(f, g) => pairing3(1, r(f), r(g)),
            OpKey::Xor(f, g) => pairing3(2, r(f), r(g)),
            OpKey::Ite(f, g, h) => pairing4(3, r(f), r(g), r(h)),
            OpKey::Quant(q, f, c) => pairing4(4, q as u64, r(f), r(c)),
            OpKey::AppQuant(op, q, f, g, c) => {
                pairing2(pairing3(5, op as u64, q as u64), pairing3(r(f), r(g), r(c)))
            }
            OpKey::Restrict(f, c) => pairing3(6, r(f), r(c)),
            OpKey::Constrain(f, c) => pairing3(7, r(f), r(c)),
            OpKey::Simplify(f, d) => pairing3(8, r(f), r(d)),
            OpKey::Compose(f, g, v) => pairing4(9, r(f), r(g), v.id() as u64),
            OpKey::Replace(f, id) => pairing3(10, r(f), id),
            OpKey::VecCompose(f, id) => pairing3(11, r(f), id),
        };
        mix64(h)
    }
}

/// The operation cache used by the manager.
pub type OpCache = DirectMappedCache<OpKey, Ref>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;

    #[test]
    fn test_op_cache_distinguishes_operations() {
        let mut cache = OpCache::new(8);
        let f = Ref::positive(NodeId::new(3));
        let g = Ref::positive(NodeId::new(4));

        cache.insert(OpKey::And(f, g), Ref::ONE);
        assert_eq!(cache.get(&OpKey::And(f, g)), Some(Ref::ONE));
        assert_eq!(cache.get(&OpKey::Xor(f, g)), None);
        assert_eq!(cache.get(&OpKey::And(g, f)), None);
    }

    #[test]
    fn test_op_cache_generation() {
        let mut cache = OpCache::with_entries(100);
        let f = Ref::positive(NodeId::new(7));
        cache.insert(OpKey::Ite(f, Ref::ONE, Ref::ZERO), f);
        cache.clear();
        assert_eq!(cache.get(&OpKey::Ite(f, Ref::ONE, Ref::ZERO)), None);
    }
}
