//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of lookups served from the cache
    pub hits: u64,
    /// Number of lookups that found no entry
    pub misses: u64,
    /// Number of entries evicted to make room for new stores
    pub evictions: u64,
    /// Current number of live entries
    pub entries: usize,
    /// Total payload bytes across all live entries
    pub used_bytes: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Eviction ==
    /// Increments the eviction counter.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}
