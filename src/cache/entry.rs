//! Cache Entry Module
//!
//! Defines the structure for individual memoized results with TTL support.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

// == Cache Entry ==
/// A single memoized result with its expiry metadata.
///
/// Recency is tracked outside the entry by the store's LRU tracker.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The memoized value
    pub value: T,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new entry, stamping `expires_at` from the optional TTL.
    pub fn new(value: T, ttl: Option<Duration>) -> Self {
        let now = current_timestamp_ms();
        let expires_at = ttl.map(|ttl| now + ttl.as_millis() as u64);

        Self {
            value,
            created_at: now,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once the current time is
    /// greater than or equal to the expiration time, so a lookup exactly at
    /// the TTL boundary is a miss.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining lifetime in milliseconds, or None if the entry
    /// never expires. Expired entries report zero.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at.map(|expires| {
            let now = current_timestamp_ms();
            expires.saturating_sub(now)
        })
    }

    /// Diagnostic view of the entry's timestamps.
    pub fn meta(&self) -> EntryMeta {
        EntryMeta {
            created_at: timestamp_to_utc(self.created_at),
            expires_at: self.expires_at.map(timestamp_to_utc),
        }
    }
}

// == Entry Metadata ==
/// Wall-clock timestamps of an entry, for inspection and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntryMeta {
    /// When the entry was created
    pub created_at: DateTime<Utc>,
    /// When the entry expires, if it does
    pub expires_at: Option<DateTime<Utc>>,
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub(crate) fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}

fn timestamp_to_utc(ms: u64) -> DateTime<Utc> {
    // in range for any reachable SystemTime
    Utc.timestamp_millis_opt(ms as i64)
        .single()
        .expect("timestamp out of range")
}
