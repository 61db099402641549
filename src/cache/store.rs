//! Cache Store Module
//!
//! Main memoization engine combining HashMap storage with LRU tracking and
//! TTL expiration. The store itself is single-threaded; the memoizers in
//! [`crate::memo`] wrap it in a mutex for concurrent callers.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, EntryMeta, LruTracker};
use crate::key::CacheKey;

// == Cache Store ==
/// Keyed storage of memoized results with LRU eviction and TTL support.
///
/// For a fixed key at most one entry exists at any time. Expired entries are
/// logically absent: lookups remove them on contact, and the optional
/// background sweeper bounds how long they are physically retained.
#[derive(Debug)]
pub struct CacheStore<T> {
    /// Key-value storage
    entries: HashMap<CacheKey, CacheEntry<T>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed, None = unbounded
    max_entries: Option<usize>,
    /// Default TTL for new entries, None = never expire
    default_ttl: Option<Duration>,
}

impl<T: Clone> CacheStore<T> {
    // == Constructor ==
    /// Creates a store with the given capacity bound and default TTL.
    pub fn new(max_entries: Option<usize>, default_ttl: Option<Duration>) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries,
            default_ttl,
        }
    }

    // == Lookup ==
    /// Returns the memoized value for `key` if present and unexpired.
    ///
    /// A hit marks the entry most recently used. An expired entry is removed
    /// on contact and reported as a miss.
    pub fn lookup(&mut self, key: &CacheKey) -> Option<T> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.stats.record_miss();
                debug!(%key, "cache miss");
                return None;
            }
        };

        if expired {
            self.entries.remove(key);
            self.lru.remove(key);
            self.stats.record_expiration();
            self.stats.record_miss();
            self.stats.set_total_entries(self.entries.len());
            debug!(%key, "cache miss (entry expired)");
            return None;
        }

        let value = self.entries.get(key).map(|entry| entry.value.clone());
        if value.is_some() {
            self.stats.record_hit();
            self.lru.touch(key);
            debug!(%key, "cache hit");
        }
        value
    }

    /// Lookup variant for internal double-checks: no statistics, no recency
    /// update, no lazy purge.
    pub(crate) fn peek(&self, key: &CacheKey) -> Option<T> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
    }

    // == Insert ==
    /// Stores a result under `key` with the store's default TTL.
    ///
    /// Overwrites reset the entry's TTL without evicting. Inserting a new
    /// key at capacity evicts the least recently used entry first.
    pub fn insert(&mut self, key: CacheKey, value: T) {
        self.insert_with_ttl(key, value, self.default_ttl);
    }

    /// Stores a result with an explicit TTL (`None` = never expires),
    /// overriding the store default.
    pub fn insert_with_ttl(&mut self, key: CacheKey, value: T, ttl: Option<Duration>) {
        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite {
            if let Some(max) = self.max_entries {
                if self.entries.len() >= max {
                    if let Some(evicted) = self.lru.evict_oldest() {
                        self.entries.remove(&evicted);
                        self.stats.record_eviction();
                        debug!(key = %evicted, "evicted least recently used entry");
                    }
                }
            }
        }

        let entry = CacheEntry::new(value, ttl);
        self.entries.insert(key.clone(), entry);

        // touch on write: new and overwritten entries become most recent
        self.lru.touch(&key);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get Or Compute ==
    /// The memoization primitive: returns the cached value for `key`, or
    /// invokes `compute` exactly once and stores its result.
    ///
    /// On a hit `compute` is not invoked at all. A computation error
    /// propagates unchanged and leaves the store untouched, so the next call
    /// with the same key computes again.
    pub fn get_or_compute<E>(
        &mut self,
        key: &CacheKey,
        compute: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        let ttl = self.default_ttl;
        self.get_or_compute_with_ttl(key, compute, ttl)
    }

    /// [`Self::get_or_compute`] with an explicit TTL for the stored result.
    pub fn get_or_compute_with_ttl<E>(
        &mut self,
        key: &CacheKey,
        compute: impl FnOnce() -> Result<T, E>,
        ttl: Option<Duration>,
    ) -> Result<T, E> {
        if let Some(value) = self.lookup(key) {
            return Ok(value);
        }

        let value = compute()?;
        self.insert_with_ttl(key.clone(), value.clone(), ttl);
        Ok(value)
    }

    // == Remove ==
    /// Removes one entry. Returns whether it existed; absence is not an
    /// error.
    pub fn remove(&mut self, key: &CacheKey) -> bool {
        let existed = self.entries.remove(key).is_some();
        if existed {
            self.lru.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        existed
    }

    /// Removes every entry belonging to the named callable.
    ///
    /// Returns the number of entries removed.
    pub fn remove_callable(&mut self, callable: &str) -> usize {
        let doomed: Vec<CacheKey> = self
            .entries
            .keys()
            .filter(|key| key.callable() == callable)
            .cloned()
            .collect();

        for key in &doomed {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        self.stats.set_total_entries(self.entries.len());
        doomed.len()
    }

    // == Clear ==
    /// Empties the store. Subsequent lookups are unconditional misses until
    /// repopulated; cumulative counters are retained.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.stats.set_total_entries(0);
        debug!("cache cleared");
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            self.entries.remove(&key);
            self.lru.remove(&key);
            self.stats.record_expiration();
        }

        self.stats.set_total_entries(self.entries.len());
        count
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Counts a caller that joined an in-flight computation.
    pub(crate) fn record_coalesced(&mut self) {
        self.stats.record_coalesced();
    }

    // == Entry Metadata ==
    /// Diagnostic timestamps for an entry, if it is present and unexpired.
    pub fn entry_meta(&self, key: &CacheKey) -> Option<EntryMeta> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(CacheEntry::meta)
    }

    // == Length ==
    /// Returns the current number of entries, expired ones included until
    /// they are purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
