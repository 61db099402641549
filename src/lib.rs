//! memo_cache - An in-memory memoization layer
//!
//! Avoids repeating expensive, deterministic calls (API requests, token
//! counting) by caching results under a key derived from the callable and
//! its arguments, with optional TTL expiration, LRU eviction and in-flight
//! call coalescing for async callables.
//!
//! # Example
//! ```
//! use memo_cache::{MemoOptions, Memoizer};
//! use std::time::Duration;
//!
//! let memo: Memoizer<i64> =
//!     Memoizer::new(MemoOptions::new().with_ttl(Duration::from_secs(3600)))?;
//! let increment = memo.wrap("increment", |x: &i64| Ok::<_, std::convert::Infallible>(x + 1));
//!
//! assert_eq!(increment(&5)?, 6);
//! assert_eq!(increment(&5)?, 6); // cache hit, the closure did not run again
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod key;
pub mod memo;
pub mod tasks;

pub use cache::{CacheStats, CacheStore, EntryMeta};
pub use config::MemoOptions;
pub use error::{ConfigError, KeyError, MemoError, SharedMemoError};
pub use key::{CacheKey, KeyBuilder, ReceiverPolicy};
pub use memo::{AsyncMemoizer, Memoizer};
pub use tasks::spawn_sweeper;
