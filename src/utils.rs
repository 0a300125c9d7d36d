//! Hashing helpers for the unique table and the operation cache.
//!
//! Cache keys are small tuples of node references. They are folded into a
//! single `u64` with the Szudzik pairing function, then masked down to a
//! cache slot. Arithmetic wraps: the result only has to spread keys over the
//! slots, it does not have to stay a bijection for huge inputs.

/// [Szudzik pairing function][szudzik-pairing].
///
/// ```text
/// (a, b) -> if (a<b) then (b^2 + a) else (a^2 + a + b)
/// ```
///
/// [szudzik-pairing]: http://szudzik.com/ElegantPairing.pdf
pub fn pairing_szudzik(a: u64, b: u64) -> u64 {
    if a < b {
        b.wrapping_mul(b).wrapping_add(a)
    } else {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    }
}

/// [Pairing function][pairing] for two `u64` values.
///
/// [pairing]: https://en.wikipedia.org/wiki/Pairing_function
pub fn pairing2(a: u64, b: u64) -> u64 {
    pairing_szudzik(a, b)
}

/// Pairing function for three `u64` values.
pub fn pairing3(a: u64, b: u64, c: u64) -> u64 {
    pairing2(pairing2(a, b), c)
}

/// Pairing function for four `u64` values.
pub fn pairing4(a: u64, b: u64, c: u64, d: u64) -> u64 {
    pairing2(pairing2(a, b), pairing2(c, d))
}

/// Final avalanche step, so that structured keys do not pile up in low slots.
pub fn mix64(mut x: u64) -> u64 {
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33;
    x = x.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    x ^= x >> 33;
    x
}

pub trait MyHash {
    /// Hash used to pick a cache slot.
    fn hash(&self) -> u64;
}

impl MyHash for (u64, u64) {
    fn hash(&self) -> u64 {
        pairing2(self.0, self.1)
    }
}

impl MyHash for (u64, u64, u64) {
    fn hash(&self) -> u64 {
        pairing3(self.0, self.1, self.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_szudzik() {
        // a\b  0  1  2  3  4
        // ------------------
        // 0    0  1  4  9 16
        // 1    2  3  5 10 17
        // 2    6  7  8 11 18
        // 3   12 13 14 15 19
        // 4   20 21 22 23 24
        assert_eq!(pairing_szudzik(0, 0), 0);
        assert_eq!(pairing_szudzik(0, 1), 1);
        assert_eq!(pairing_szudzik(1, 0), 2);
        assert_eq!(pairing_szudzik(1, 1), 3);
        assert_eq!(pairing_szudzik(0, 2), 4);
        assert_eq!(pairing_szudzik(1, 2), 5);
        assert_eq!(pairing_szudzik(2, 0), 6);
        assert_eq!(pairing_szudzik(2, 1), 7);
        assert_eq!(pairing_szudzik(2, 2), 8);
        assert_eq!(pairing_szudzik(0, 4), 16);
        assert_eq!(pairing_szudzik(4, 0), 20);
        assert_eq!(pairing_szudzik(4, 4), 24);
    }

    #[test]
    fn test_pairing_does_not_overflow() {
        let big = u64::MAX - 1;
        // Nested pairings of large values must not panic in debug builds.
        let _ = pairing3(big, big, big);
        let _ = pairing4(big, 1, big, 2);
    }

    #[test]
    fn test_pairing_tuples() {
        assert_eq!((3u64, 4u64).hash(), pairing2(3, 4));
        assert_eq!((1u64, 2u64, 3u64).hash(), pairing3(1, 2, 3));
        assert_ne!(pairing3(1, 2, 3), pairing3(3, 2, 1));
    }

    #[test]
    fn test_mix64_spreads_low_bits() {
        let slots: std::collections::HashSet<u64> = (0..64u64).map(|i| mix64(i << 20) & 0xff).collect();
        assert!(slots.len() > 32);
    }
}
