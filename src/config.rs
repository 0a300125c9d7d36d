//! Capacity and tuning parameters of a [`Bdd`][crate::bdd::Bdd] manager.

/// Manager configuration.
///
/// All sizes count nodes (for the table) or entries (for the cache).
///
/// ```
/// use robdd::config::BddConfig;
///
/// let config = BddConfig::default()
///     .with_node_table_size(1 << 12)
///     .with_cache_size(1 << 10)
///     .with_min_free_nodes(30);
/// assert_eq!(config.min_free_nodes, 30);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BddConfig {
    /// Initial number of node slots.
    pub node_table_size: usize,
    /// Initial number of operation cache entries.
    pub cache_size: usize,
    /// Upper bound on node slots, `0` means unbounded.
    pub max_node_num: usize,
    /// Grow the table after a collection leaves less than this percentage free.
    pub min_free_nodes: usize,
    /// Largest number of slots added by a single resize, `0` means unbounded.
    pub max_increase: usize,
    /// Multiplier applied to the table size on each resize.
    pub increase_factor: f64,
    /// If non-zero, the cache is kept at `node_table_size / cache_ratio` entries.
    pub cache_ratio: usize,
    /// Live node count that first triggers automatic reordering.
    pub reorder_threshold: usize,
    /// Sifting stops moving a variable once the table grows past `best * sift_max_growth`.
    pub sift_max_growth: f64,
    /// Seed for the random reordering method.
    pub random_seed: u64,
}

impl Default for BddConfig {
    fn default() -> Self {
        Self {
            node_table_size: 10_000,
            cache_size: 10_000,
            max_node_num: 0,
            min_free_nodes: 20,
            max_increase: 50_000,
            increase_factor: 2.0,
            cache_ratio: 0,
            reorder_threshold: 10_000,
            sift_max_growth: 1.2,
            random_seed: 42,
        }
    }
}

impl BddConfig {
    pub fn new(node_table_size: usize, cache_size: usize) -> Self {
        Self {
            node_table_size,
            cache_size,
            ..Self::default()
        }
    }

    pub fn with_node_table_size(mut self, size: usize) -> Self {
        self.node_table_size = size;
        self
    }

    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }

    pub fn with_max_node_num(mut self, max: usize) -> Self {
        self.max_node_num = max;
        self
    }

    pub fn with_min_free_nodes(mut self, percent: usize) -> Self {
        self.min_free_nodes = percent;
        self
    }

    pub fn with_max_increase(mut self, increase: usize) -> Self {
        self.max_increase = increase;
        self
    }

    pub fn with_increase_factor(mut self, factor: f64) -> Self {
        self.increase_factor = factor;
        self
    }

    pub fn with_cache_ratio(mut self, ratio: usize) -> Self {
        self.cache_ratio = ratio;
        self
    }

    pub fn with_reorder_threshold(mut self, threshold: usize) -> Self {
        self.reorder_threshold = threshold;
        self
    }

    pub fn with_sift_max_growth(mut self, growth: f64) -> Self {
        self.sift_max_growth = growth;
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Number of slots after one resize step from `current`, or `None` if the table cannot grow.
    pub(crate) fn next_table_size(&self, current: usize) -> Option<usize> {
        let factor = if self.increase_factor > 1.0 { self.increase_factor } else { 2.0 };
        let mut new = ((current.max(1) as f64) * factor).ceil() as usize;
        if self.max_increase > 0 {
            new = new.min(current + self.max_increase);
        }
        if self.max_node_num > 0 {
            new = new.min(self.max_node_num);
        }
        (new > current).then_some(new)
    }

    /// Cache entries to use for a table of `table_size` slots.
    pub(crate) fn cache_entries_for(&self, table_size: usize) -> usize {
        if self.cache_ratio > 0 {
            (table_size / self.cache_ratio).max(1)
        } else {
            self.cache_size
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_table_size() {
        let config = BddConfig::default();
        assert_eq!(config.next_table_size(1000), Some(2000));
        // Bounded by `max_increase`:
        assert_eq!(config.next_table_size(100_000), Some(150_000));

        let bounded = BddConfig::default().with_max_node_num(1500);
        assert_eq!(bounded.next_table_size(1000), Some(1500));
        assert_eq!(bounded.next_table_size(1500), None);
    }

    #[test]
    fn test_cache_ratio() {
        let config = BddConfig::new(4096, 100);
        assert_eq!(config.cache_entries_for(4096), 100);
        let config = config.with_cache_ratio(4);
        assert_eq!(config.cache_entries_for(4096), 1024);
    }
}
