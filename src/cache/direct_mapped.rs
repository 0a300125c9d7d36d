//! Direct-mapped cache with generation-based O(1) clearing.
//!
//! Garbage collection and reordering both invalidate every memoized result.
//! Bumping the generation counter makes all stored entries stale at once,
//! instead of zeroing the whole table.

use std::cell::Cell;

use crate::utils::MyHash;

/// A single cache entry with generation stamp.
#[derive(Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
    generation: u64,
}

impl<K: Default, V: Default> Default for Entry<K, V> {
    fn default() -> Self {
        Self {
            key: K::default(),
            value: V::default(),
            generation: 0, // Invalid
        }
    }
}

/// A direct-mapped cache: each key hashes to exactly one slot, newer entries overwrite older ones.
pub struct DirectMappedCache<K, V> {
    entries: Vec<Entry<K, V>>,
    bitmask: u64,
    generation: u64,
    hits: Cell<usize>,
    misses: Cell<usize>,
    faults: Cell<usize>,
}

impl<K, V> DirectMappedCache<K, V>
where
    K: Default,
    V: Default,
{
    /// Creates a new cache with `2^bits` slots.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Cache bits must be in range 0..=31, got {}", bits);

        let size = 1usize << bits;
        Self {
            entries: (0..size).map(|_| Entry::default()).collect(),
            bitmask: (size - 1) as u64,
            generation: 1, // Start at 1 so default entries are invalid
            hits: Cell::new(0),
            misses: Cell::new(0),
            faults: Cell::new(0),
        }
    }

    /// Creates a cache with at least `entries` slots (rounded up to a power of two).
    pub fn with_entries(entries: usize) -> Self {
        Self::new(bits_for(entries))
    }

    /// Replaces the storage with `2^bits` empty slots, keeping the statistics.
    pub fn resize(&mut self, bits: usize) {
        let stats = (self.hits.get(), self.misses.get(), self.faults.get());
        *self = Self::new(bits);
        self.hits.set(stats.0);
        self.misses.set(stats.1);
        self.faults.set(stats.2);
    }
}

impl<K, V> DirectMappedCache<K, V> {
    /// Returns the number of slots in the cache.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn hits(&self) -> usize {
        self.hits.get()
    }

    pub fn misses(&self) -> usize {
        self.misses.get()
    }

    /// Misses caused by a slot holding a different key.
    pub fn faults(&self) -> usize {
        self.faults.get()
    }

    /// Makes every stored entry stale.
    pub fn clear(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            // Wrapped around: old stamps could become valid again.
            for entry in &mut self.entries {
                entry.generation = 0;
            }
            self.generation = 1;
        }
    }
}

impl<K, V> DirectMappedCache<K, V>
where
    K: MyHash + Eq,
    V: Copy,
{
    #[inline]
    fn index(&self, key: &K) -> usize {
        (key.hash() & self.bitmask) as usize
    }

    /// Looks up a key in the cache.
    #[inline]
    pub fn get(&self, key: &K) -> Option<V> {
        let entry = &self.entries[self.index(key)];

        if entry.generation != self.generation {
            self.misses.set(self.misses.get() + 1);
            return None;
        }

        if entry.key == *key {
            self.hits.set(self.hits.get() + 1);
            Some(entry.value)
        } else {
            self.misses.set(self.misses.get() + 1);
            self.faults.set(self.faults.get() + 1);
            None
        }
    }

    #[inline]
    pub fn insert(&mut self, key: K, value: V) {
        let idx = self.index(&key);
        self.entries[idx] = Entry {
            key,
            value,
            generation: self.generation,
        };
    }
}

/// Number of address bits needed for `entries` slots, clamped to a sane range.
pub fn bits_for(entries: usize) -> usize {
    let entries = entries.clamp(1, 1 << 26);
    entries.next_power_of_two().trailing_zeros() as usize
}
