//! Error types for the memoization layer
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;

use thiserror::Error;

// == Key Error ==
/// Failure to derive a deterministic cache key from call arguments.
///
/// When key derivation fails the wrapped callable is NOT invoked: the failure
/// propagates to the caller and no cache entry is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// An argument could not be turned into a structural representation,
    /// and no string fallback was requested for it.
    #[error("argument `{argument}` cannot be serialized into a cache key: {reason}")]
    Unserializable {
        /// Positional index (`#0`, `#1`, ...) or keyword name of the argument
        argument: String,
        /// Underlying serializer message
        reason: String,
    },

    /// The callable name is empty, so no key namespace exists.
    #[error("callable name must not be empty")]
    EmptyCallableName,
}

// == Config Error ==
/// Invalid memoizer options, surfaced at construction time rather than at
/// call time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_entries` was set to zero
    #[error("max_entries must be greater than zero")]
    ZeroMaxEntries,

    /// `ttl` was set to a zero duration
    #[error("ttl must be greater than zero")]
    ZeroTtl,
}

// == Memo Error ==
/// Error returned by a memoized call.
///
/// `E` is the error type of the wrapped computation. Computation failures are
/// propagated unchanged and are never cached; the next call with the same key
/// invokes the computation again.
#[derive(Error, Debug)]
pub enum MemoError<E> {
    /// Key derivation failed; the computation was not invoked.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// The wrapped computation itself failed.
    #[error("memoized computation failed")]
    Compute(#[source] E),
}

impl<E> MemoError<E> {
    /// Returns the computation error, if that is what this is.
    pub fn into_compute(self) -> Option<E> {
        match self {
            MemoError::Compute(e) => Some(e),
            MemoError::Key(_) => None,
        }
    }
}

/// Error surface of the async memoizer.
///
/// Coalesced callers all await the same in-flight computation, so a single
/// failure has to reach every waiter; the `Arc` makes the payload shareable
/// without requiring `E: Clone`.
pub type SharedMemoError<E> = MemoError<Arc<E>>;
