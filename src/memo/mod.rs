//! Memoization Module
//!
//! The public wrapping surface over the cache store: a blocking,
//! thread-safe memoizer and an async memoizer that coalesces concurrent
//! identical calls onto one in-flight computation.

mod blocking;
mod future;

pub use blocking::Memoizer;
pub use future::AsyncMemoizer;
