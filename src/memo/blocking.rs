//! Blocking Memoizer
//!
//! Thread-safe memoization for synchronous callables. The store sits behind
//! a mutex shared by every clone of the memoizer, so construct one at
//! startup and hand clones to the subsystems that need it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::cache::{CacheStats, CacheStore, EntryMeta};
use crate::config::MemoOptions;
use crate::error::{ConfigError, MemoError};
use crate::key::{CacheKey, KeyBuilder, ReceiverPolicy};

// == Memoizer ==
/// Memoizes synchronous computations by derived key.
///
/// Computations run OUTSIDE the store lock so a slow call never blocks hits
/// on other keys. The trade-off is a known race: two threads that miss the
/// same cold key concurrently will both run the computation, and the later
/// insert overwrites the earlier one. Memoized callables are deterministic,
/// so callers cannot observe a difference beyond the duplicate work; use
/// [`crate::memo::AsyncMemoizer`] where single-flight execution matters.
pub struct Memoizer<T> {
    /// Thread-safe result store
    store: Arc<Mutex<CacheStore<T>>>,
    /// Default receiver policy for keys built via [`Self::key_for`]
    receiver_policy: ReceiverPolicy,
}

impl<T: Clone> Memoizer<T> {
    // == Constructors ==
    /// Creates a memoizer from validated options.
    ///
    /// Invalid options (zero capacity, zero TTL) fail here, at wrap time,
    /// never on the first call.
    pub fn new(options: MemoOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self {
            store: Arc::new(Mutex::new(CacheStore::new(options.max_entries, options.ttl))),
            receiver_policy: options.receiver_policy,
        })
    }

    /// Creates an unbounded memoizer with no expiration.
    pub fn with_defaults() -> Self {
        Self {
            store: Arc::new(Mutex::new(CacheStore::new(None, None))),
            receiver_policy: ReceiverPolicy::default(),
        }
    }

    fn lock_store(&self) -> MutexGuard<'_, CacheStore<T>> {
        // a panicked holder cannot leave the map structurally broken, so
        // recover the guard rather than poisoning every later call
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Key Derivation ==
    /// Starts a key for the named callable, seeded with this memoizer's
    /// receiver policy.
    pub fn key_for(&self, callable: impl Into<String>) -> KeyBuilder {
        KeyBuilder::new(callable).with_policy(self.receiver_policy)
    }

    // == Get Or Compute ==
    /// Returns the memoized result for `key`, or runs `compute` and caches
    /// its value.
    ///
    /// On a hit `compute` is not invoked. A computation failure propagates
    /// unchanged as [`MemoError::Compute`] and is never cached.
    pub fn get_or_compute<E>(
        &self,
        key: &CacheKey,
        compute: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, MemoError<E>> {
        if let Some(value) = self.lock_store().lookup(key) {
            return Ok(value);
        }

        // run outside the lock; see the type docs for the race this admits
        let value = compute().map_err(MemoError::Compute)?;
        self.lock_store().insert(key.clone(), value.clone());
        Ok(value)
    }

    // == Wrap ==
    /// Wraps a single-argument callable into an equivalent memoized one.
    ///
    /// The argument is captured structurally for the key, so any
    /// [`Serialize`] type works. Callables with several arguments build
    /// their key through [`Self::key_for`] and call
    /// [`Self::get_or_compute`] directly.
    ///
    /// # Example
    /// ```
    /// use memo_cache::memo::Memoizer;
    ///
    /// let memo = Memoizer::with_defaults();
    /// let increment = memo.wrap("increment", |x: &i64| Ok::<_, std::convert::Infallible>(x + 1));
    ///
    /// assert_eq!(increment(&5).unwrap(), 6);
    /// assert_eq!(increment(&5).unwrap(), 6); // served from cache
    /// ```
    pub fn wrap<'m, A, E, F>(
        &'m self,
        callable: impl Into<String>,
        f: F,
    ) -> impl Fn(&A) -> Result<T, MemoError<E>> + 'm
    where
        A: Serialize,
        F: Fn(&A) -> Result<T, E> + 'm,
    {
        let callable = callable.into();
        move |arg: &A| {
            let key = self.key_for(callable.as_str()).arg(arg)?.build()?;
            self.get_or_compute(&key, || f(arg))
        }
    }

    // == Administration ==
    /// Atomically empties the store.
    pub fn clear_all(&self) {
        self.lock_store().clear();
    }

    /// Removes one entry; absence is not an error.
    pub fn clear_entry(&self, key: &CacheKey) -> bool {
        self.lock_store().remove(key)
    }

    /// Removes every entry of the named wrapped callable. Returns the
    /// number of entries removed.
    pub fn clear_callable(&self, callable: &str) -> usize {
        self.lock_store().remove_callable(callable)
    }

    /// Eagerly purges expired entries. Returns the number removed.
    pub fn cleanup_expired(&self) -> usize {
        self.lock_store().cleanup_expired()
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.lock_store().stats()
    }

    /// Diagnostic timestamps for a live entry.
    pub fn entry_meta(&self, key: &CacheKey) -> Option<EntryMeta> {
        self.lock_store().entry_meta(key)
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.lock_store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_store().is_empty()
    }

    /// Shared handle to the underlying store, for
    /// [`crate::tasks::spawn_sweeper`].
    pub fn shared_store(&self) -> Arc<Mutex<CacheStore<T>>> {
        Arc::clone(&self.store)
    }
}

impl<T> Clone for Memoizer<T> {
    /// Clones share the same underlying store.
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            receiver_policy: self.receiver_policy,
        }
    }
}
