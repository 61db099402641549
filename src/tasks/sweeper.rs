//! Expired-Entry Sweeper
//!
//! Background task that periodically removes expired memoized results.
//! Lazy removal at lookup time already keeps expired entries logically
//! absent; the sweeper only bounds how long they are physically retained.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically purges expired entries.
///
/// The task sleeps for the given interval between sweeps and holds the
/// store lock only for the duration of each purge. Abort the returned
/// handle during shutdown.
///
/// # Arguments
/// * `store` - Shared store handle, from
///   [`crate::memo::Memoizer::shared_store`] or
///   [`crate::memo::AsyncMemoizer::shared_store`]
/// * `sweep_interval_secs` - Seconds between sweeps
///
/// # Example
/// ```ignore
/// let memo: AsyncMemoizer<String, ApiError> = AsyncMemoizer::new(options)?;
/// let sweeper = spawn_sweeper(memo.shared_store(), 60);
/// // later, during shutdown:
/// sweeper.abort();
/// ```
pub fn spawn_sweeper<T>(
    store: Arc<Mutex<CacheStore<T>>>,
    sweep_interval_secs: u64,
) -> JoinHandle<()>
where
    T: Clone + Send + 'static,
{
    let interval = Duration::from_secs(sweep_interval_secs);

    tokio::spawn(async move {
        info!(
            "starting expired-entry sweeper with interval of {} seconds",
            sweep_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut store = store.lock().unwrap_or_else(PoisonError::into_inner);
                store.cleanup_expired()
            };

            if removed > 0 {
                info!("sweep removed {} expired entries", removed);
            } else {
                debug!("sweep found no expired entries");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    use crate::config::MemoOptions;
    use crate::memo::Memoizer;

    #[tokio::test]
    async fn test_sweeper_removes_expired_entries() {
        let memo: Memoizer<String> =
            Memoizer::new(MemoOptions::new().with_ttl(Duration::from_millis(200))).unwrap();
        let key = memo.key_for("f").arg(&1).unwrap().build().unwrap();
        memo.get_or_compute(&key, || Ok::<_, Infallible>("value".to_string()))
            .unwrap();
        assert_eq!(memo.len(), 1);

        let handle = spawn_sweeper(memo.shared_store(), 1);

        // wait past the TTL and one sweep
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(memo.len(), 0, "expired entry should have been swept");
        handle.abort();
    }

    #[tokio::test]
    async fn test_sweeper_preserves_valid_entries() {
        let memo: Memoizer<String> =
            Memoizer::new(MemoOptions::new().with_ttl(Duration::from_secs(3600))).unwrap();
        let key = memo.key_for("f").arg(&1).unwrap().build().unwrap();
        memo.get_or_compute(&key, || Ok::<_, Infallible>("value".to_string()))
            .unwrap();

        let handle = spawn_sweeper(memo.shared_store(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(memo.len(), 1, "valid entry should not be swept");
        handle.abort();
    }

    #[tokio::test]
    async fn test_sweeper_can_be_aborted() {
        let memo: Memoizer<String> = Memoizer::with_defaults();
        let handle = spawn_sweeper(memo.shared_store(), 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "task should be finished after abort");
    }
}
