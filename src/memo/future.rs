//! Async Memoizer
//!
//! Memoization for asynchronous callables with in-flight call coalescing:
//! the suspended computation itself is registered under its key at the
//! moment a miss is detected, so concurrent identical calls await the same
//! pending computation instead of starting duplicates.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::cache::{CacheStats, CacheStore, EntryMeta};
use crate::config::MemoOptions;
use crate::error::{ConfigError, MemoError, SharedMemoError};
use crate::key::{CacheKey, KeyBuilder, ReceiverPolicy};

/// One pending computation, shared by every caller that raced on its key.
///
/// The error is `Arc`'d so a single failure can fan out to all waiters.
type Flight<T, E> = Shared<BoxFuture<'static, Result<T, Arc<E>>>>;

// == Async Memoizer ==
/// Memoizes asynchronous computations by derived key.
///
/// Guarantees beyond the blocking memoizer:
/// - Duplicate concurrent misses on one key run the computation ONCE; every
///   racer observes the same eventual result or the same eventual failure.
/// - The lookup/insert path never suspends; suspension happens only inside
///   the wrapped computation.
/// - A caller that abandons its future leaves other waiters unaffected: the
///   flight table keeps the computation alive for late joiners.
///
/// Failures are never cached. A failed flight removes itself, so the next
/// call with the same key computes again.
pub struct AsyncMemoizer<T, E> {
    /// Result store, guarded by a synchronous mutex: it is only ever held
    /// for map operations, never across an await
    store: Arc<Mutex<CacheStore<T>>>,
    /// In-flight computations by key
    flights: Arc<AsyncMutex<HashMap<CacheKey, Flight<T, E>>>>,
    /// Default receiver policy for keys built via [`Self::key_for`]
    receiver_policy: ReceiverPolicy,
}

impl<T, E> AsyncMemoizer<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a memoizer from validated options.
    pub fn new(options: MemoOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self {
            store: Arc::new(Mutex::new(CacheStore::new(options.max_entries, options.ttl))),
            flights: Arc::new(AsyncMutex::new(HashMap::new())),
            receiver_policy: options.receiver_policy,
        })
    }

    /// Creates an unbounded memoizer with no expiration.
    pub fn with_defaults() -> Self {
        Self {
            store: Arc::new(Mutex::new(CacheStore::new(None, None))),
            flights: Arc::new(AsyncMutex::new(HashMap::new())),
            receiver_policy: ReceiverPolicy::default(),
        }
    }

    fn lock_store(&self) -> MutexGuard<'_, CacheStore<T>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Key Derivation ==
    /// Starts a key for the named callable, seeded with this memoizer's
    /// receiver policy.
    pub fn key_for(&self, callable: impl Into<String>) -> KeyBuilder {
        KeyBuilder::new(callable).with_policy(self.receiver_policy)
    }

    // == Get Or Compute ==
    /// Returns the memoized result for `key`, joins the in-flight
    /// computation for it, or invokes `compute` and registers the resulting
    /// future as the key's flight.
    ///
    /// `compute` is only invoked when this caller actually starts the
    /// flight; on a hit or a join it is dropped unused.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &CacheKey,
        compute: F,
    ) -> Result<T, SharedMemoError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        if let Some(value) = self.lock_store().lookup(key) {
            return Ok(value);
        }

        let flight = {
            let mut flights = self.flights.lock().await;

            // a flight that completed between the store check above and this
            // lock has already inserted its value; re-check before creating
            // a duplicate computation
            if let Some(value) = self.lock_store().peek(key) {
                return Ok(value);
            }

            match flights.get(key) {
                Some(flight) => {
                    self.lock_store().record_coalesced();
                    debug!(%key, "joining in-flight computation");
                    flight.clone()
                }
                None => {
                    let store = Arc::clone(&self.store);
                    let flights_handle = Arc::clone(&self.flights);
                    let flight_key = key.clone();
                    let future = compute();

                    let flight: Flight<T, E> = async move {
                        let result = future.await.map_err(Arc::new);
                        if let Ok(value) = &result {
                            store
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .insert(flight_key.clone(), value.clone());
                        }
                        // finished either way; errors are never cached, so
                        // the next call computes again
                        flights_handle.lock().await.remove(&flight_key);
                        result
                    }
                    .boxed()
                    .shared();

                    flights.insert(key.clone(), flight.clone());
                    flight
                }
            }
        };

        flight.await.map_err(MemoError::Compute)
    }

    // == Wrap ==
    /// Wraps a single-argument async callable into an equivalent memoized
    /// one. Concurrent calls with the same argument share one execution.
    pub fn wrap<A, F, Fut>(
        &self,
        callable: impl Into<String>,
        f: F,
    ) -> impl Fn(A) -> BoxFuture<'static, Result<T, SharedMemoError<E>>>
    where
        A: Serialize + Send + 'static,
        F: Fn(A) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let this = self.clone();
        let callable = callable.into();
        move |arg: A| {
            let this = this.clone();
            let callable = callable.clone();
            let f = f.clone();
            async move {
                let key = this.key_for(callable.as_str()).arg(&arg)?.build()?;
                this.get_or_compute(&key, move || f(arg)).await
            }
            .boxed()
        }
    }

    // == Administration ==
    /// Atomically empties the store and detaches pending flights.
    ///
    /// Waiters already holding a detached flight still complete it and
    /// receive its result; a flight finishing after the clear stores a
    /// freshly computed value, not a stale one.
    pub async fn clear_all(&self) {
        self.lock_store().clear();
        self.flights.lock().await.clear();
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

impl<T, E> Clone for AsyncMemoizer<T, E> {
    /// Clones share the same store and flight table.
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            flights: Arc::clone(&self.flights),
            receiver_policy: self.receiver_policy,
        }
    }
}
