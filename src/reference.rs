use std::fmt::{Display, Formatter};
use std::ops::Neg;

use crate::types::NodeId;

/// A reference to a BDD node, potentially negated.
///
/// The low word packs the node ID and the negation flag (least significant
/// bit). The terminal node has ID 0, so [`Ref::ONE`] is the regular reference
/// to it and [`Ref::ZERO`] the negated one.
///
/// The high word is the generation of the node's slot at the time the
/// reference was handed out. A slot's generation changes whenever its node
/// is reclaimed, so a stale handle never matches a node built later in the
/// same slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Ref {
    raw: u32,
    tag: u32,
}

impl Ref {
    /// The constant true function.
    pub const ONE: Self = Self { raw: 0, tag: 0 };
    /// The constant false function.
    pub const ZERO: Self = Self { raw: 1, tag: 0 };

    /// Creates a new reference with the given node ID and negation flag.
    pub const fn new(id: NodeId, negated: bool) -> Self {
        Self {
            raw: (id.raw() << 1) | (negated as u32),
            tag: 0,
        }
    }

    /// Creates a positive (non-negated) reference.
    pub const fn positive(id: NodeId) -> Self {
        Self::new(id, false)
    }

    /// Creates a negative (negated) reference.
    pub const fn negative(id: NodeId) -> Self {
        Self::new(id, true)
    }

    /// The same reference, stamped with slot generation `tag`.
    pub(crate) const fn with_tag(self, tag: u32) -> Self {
        Self { raw: self.raw, tag }
    }

    /// Returns the node ID this reference points to.
    #[inline]
    pub const fn id(self) -> NodeId {
        // SAFETY: `self.raw >> 1` is at most `u32::MAX >> 1`, and every `Ref` is built from a valid `NodeId`.
        unsafe { NodeId::from_raw_unchecked(self.raw >> 1) }
    }

    /// Generation of the slot this reference was handed out for.
    #[inline]
    pub const fn tag(self) -> u32 {
        self.tag
    }

    /// Returns true if this reference is negated.
    #[inline]
    pub const fn is_negated(self) -> bool {
        (self.raw & 1) != 0
    }

    /// Returns the regular (non-negated) version of this reference.
    #[inline]
    pub const fn regular(self) -> Self {
        Self {
            raw: self.raw & !1,
            tag: self.tag,
        }
    }

    /// Returns true if this reference points to the terminal node.
    #[inline]
    pub const fn is_const(self) -> bool {
        (self.raw >> 1) == 0
    }

    /// Negates the reference if `cond` holds.
    #[inline]
    pub const fn negate_if(self, cond: bool) -> Self {
        Self {
            raw: self.raw ^ (cond as u32),
            tag: self.tag,
        }
    }

    /// Returns the node ID and negation flag packed into one word.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.raw
    }
}

impl Default for Ref {
    fn default() -> Self {
        Ref::ONE
    }
}

// -Ref
impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate_if(true)
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Ref::ONE => write!(f, "1"),
            Ref::ZERO => write!(f, "0"),
            r if r.is_negated() => write!(f, "~{}", r.id()),
            r => write!(f, "{}", r.id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_positive_negative() {
        let id = NodeId::new(42);

        let pos = Ref::positive(id);
        assert_eq!(pos.id(), id);
        assert!(!pos.is_negated());

        let neg = Ref::negative(id);
        assert_eq!(neg.id(), id);
        assert!(neg.is_negated());

        assert_eq!(pos.id(), neg.id());
        assert_ne!(pos, neg);
        assert_eq!(neg.regular(), pos);
    }

    #[test]
    fn test_ref_negation() {
        let pos = Ref::positive(NodeId::new(5));
        let neg = Ref::negative(NodeId::new(5));

        assert_eq!(-pos, neg);
        assert_eq!(-neg, pos);
        assert_eq!(-(-pos), pos);
        assert_eq!(pos.negate_if(true), neg);
        assert_eq!(pos.negate_if(false), pos);
    }

    #[test]
    fn test_ref_constants() {
        assert_eq!(-Ref::ONE, Ref::ZERO);
        assert!(Ref::ONE.is_const());
        assert!(Ref::ZERO.is_const());
        assert!(!Ref::positive(NodeId::new(1)).is_const());
        assert_eq!(Ref::ONE.id(), NodeId::TERMINAL);
    }

    #[test]
    fn test_ref_raw() {
        let id = NodeId::new(100);
        assert_eq!(Ref::positive(id).raw(), 100 << 1);
        assert_eq!(Ref::negative(id).raw(), (100 << 1) | 1);
    }

    #[test]
    fn test_ref_tag() {
        let id = NodeId::new(7);
        let old = Ref::positive(id).with_tag(3);
        let new = Ref::positive(id).with_tag(4);
        assert_eq!(old.id(), new.id());
        assert_ne!(old, new);
        assert_eq!((-old).tag(), 3);
        assert_eq!((-old).regular(), old);
    }

    #[test]
    fn test_ref_display() {
        let id = NodeId::new(42);
        assert_eq!(format!("{}", Ref::positive(id)), "@42");
        assert_eq!(format!("{}", Ref::negative(id)), "~@42");
        assert_eq!(format!("{}", Ref::ONE), "1");
        assert_eq!(format!("{}", Ref::ZERO), "0");
    }
}
