//! Configuration Module
//!
//! Options controlling expiration, capacity and key derivation for a
//! memoizer, validated at construction time.

use std::env;
use std::time::Duration;

use crate::error::ConfigError;
use crate::key::ReceiverPolicy;

// == Documented Defaults ==
/// TTL used by [`MemoOptions::with_default_ttl`], matching the one-hour
/// window expensive API responses are typically safe to replay within.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Capacity used by [`MemoOptions::with_default_capacity`].
pub const DEFAULT_MAX_ENTRIES: usize = 128;

/// Memoizer options.
///
/// The zero-argument default is an unbounded store with no expiration: every
/// result is cached until explicitly cleared. Both bounds are opt-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoOptions {
    /// Entry lifetime; `None` means entries never expire
    pub ttl: Option<Duration>,
    /// Maximum number of entries before LRU eviction; `None` means unbounded
    pub max_entries: Option<usize>,
    /// How a bound receiver participates in key derivation
    pub receiver_policy: ReceiverPolicy,
}

impl MemoOptions {
    /// Creates options with no expiration, no size bound and the default
    /// receiver policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the entry lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Sets the one-hour default expiration window.
    pub fn with_default_ttl(self) -> Self {
        self.with_ttl(Duration::from_secs(DEFAULT_TTL_SECS))
    }

    /// Sets the maximum entry count; the least recently used entry is
    /// evicted when an insert would exceed it.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Sets the 128-entry default capacity.
    pub fn with_default_capacity(self) -> Self {
        self.with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    /// Sets the receiver policy applied by [`crate::memo::Memoizer::key_for`].
    pub fn with_receiver_policy(mut self, policy: ReceiverPolicy) -> Self {
        self.receiver_policy = policy;
        self
    }

    /// Loads options from environment variables.
    ///
    /// # Environment Variables
    /// - `MEMO_TTL_SECS` - Entry lifetime in seconds (default: no expiration)
    /// - `MEMO_MAX_ENTRIES` - Maximum entry count (default: unbounded)
    pub fn from_env() -> Self {
        let ttl = env::var("MEMO_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs);
        let max_entries = env::var("MEMO_MAX_ENTRIES")
            .ok()
            .and_then(|v| v.parse().ok());

        Self {
            ttl,
            max_entries,
            receiver_policy: ReceiverPolicy::default(),
        }
    }

    /// Checks the options for values that can never be valid.
    ///
    /// Called by the memoizer constructors so that misconfiguration surfaces
    /// when the cache is built, not on the first call through it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entries == Some(0) {
            return Err(ConfigError::ZeroMaxEntries);
        }
        if self.ttl == Some(Duration::ZERO) {
            return Err(ConfigError::ZeroTtl);
        }
        Ok(())
    }
}

impl Default for MemoOptions {
    fn default() -> Self {
        Self {
            ttl: None,
            max_entries: None,
            receiver_policy: ReceiverPolicy::default(),
        }
    }
}
