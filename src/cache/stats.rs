//! Cache Statistics Module
//!
//! Tracks memoization performance metrics: hits, misses, evictions,
//! expirations and coalesced in-flight joins.

use serde::Serialize;

// == Cache Stats ==
/// Counters describing how the cache has behaved since construction.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the store without invoking the computation
    pub hits: u64,
    /// Lookups that found no valid entry
    pub misses: u64,
    /// Entries evicted by the LRU policy
    pub evictions: u64,
    /// Entries removed because their TTL had elapsed
    pub expirations: u64,
    /// Callers that joined an already-running computation instead of
    /// starting their own (async memoizer only)
    pub coalesced: u64,
    /// Current number of entries in the store
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates stats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub fn record_coalesced(&mut self) {
        self.coalesced += 1;
    }

    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
