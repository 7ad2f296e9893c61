//! Record cache with explicit invalidation
//!
//! Entries are populated lazily by the caller's loader and dropped on
//! `invalidate`. An optional TTL bounds how long an entry is served without
//! a mutation going through this process. Values are handed out as `Arc`s;
//! callers that need to change a value clone it first, so the cached copy is
//! never mutated.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Error type for cache invalidation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("invalidation of '{key}' failed: {message}")]
    Invalidation { key: String, message: String },
}

/// Something that holds data derived from the event tables
///
/// Mutations call `invalidate` after they commit. Failures are reported back
/// but never undo the mutation.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn invalidate(&self, key: &str) -> Result<(), CacheError>;
}

struct Entry<T> {
    value: Arc<T>,
    loaded_at: Instant,
}

/// Keyed cache of loaded values
pub struct RecordCache<T> {
    entries: RwLock<HashMap<String, Entry<T>>>,
    ttl: Option<Duration>,
    /// Bumped on every removal; a load that straddles one is not stored
    generation: AtomicU64,
}

impl<T: Send + Sync> RecordCache<T> {
    /// Create a cache; `ttl = None` keeps entries until invalidated
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            generation: AtomicU64::new(0),
        }
    }

    /// Fresh cached value, if any
    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if self.is_expired(entry) {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Cached value, or the loader's result which is then cached
    ///
    /// Loader errors are returned as-is and nothing is cached. Two concurrent
    /// misses may both run their loader; the later result wins. A result
    /// whose load overlapped an invalidation is returned but not cached.
    pub async fn get_or_populate<E, F, Fut>(&self, key: &str, loader: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key) {
            debug!(key, "cache hit");
            return Ok(value);
        }

        debug!(key, "cache miss");
        let generation = self.generation.load(Ordering::SeqCst);
        let value = Arc::new(loader().await?);

        let mut entries = self.entries.write();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(key, "invalidated during load, not caching");
            return Ok(value);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.clone(),
                loaded_at: Instant::now(),
            },
        );
        Ok(value)
    }

    /// Drop one entry
    pub fn remove(&self, key: &str) -> bool {
        let mut entries = self.entries.write();
        self.generation.fetch_add(1, Ordering::SeqCst);
        entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write();
        self.generation.fetch_add(1, Ordering::SeqCst);
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn is_expired(&self, entry: &Entry<T>) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.loaded_at.elapsed() >= ttl)
    }
}

impl<T> std::fmt::Debug for RecordCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCache")
            .field("entries", &self.entries.read().len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[async_trait]
impl<T: Send + Sync> CacheInvalidator for RecordCache<T> {
    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        if self.remove(key) {
            debug!(key, "cache entry invalidated");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn test_populates_once_until_invalidated() {
        let cache: RecordCache<Vec<u32>> = RecordCache::new(None);
        let counter = AtomicUsize::new(0);
        let loads = &counter;
        let load = || async move {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(vec![1, 2, 3])
        };

        let first = cache.get_or_populate("events", load).await.unwrap();
        let second = cache.get_or_populate("events", load).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        cache.invalidate("events").await.unwrap();
        cache.get_or_populate("events", load).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_loader_error_is_not_cached() {
        let cache: RecordCache<u32> = RecordCache::new(None);
        let err = cache
            .get_or_populate("k", || async { Err::<u32, _>("backend down") })
            .await
            .unwrap_err();
        assert_eq!(err, "backend down");
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache: RecordCache<u32> = RecordCache::new(Some(Duration::from_secs(60)));
        cache
            .get_or_populate("k", || async { Ok::<_, ()>(7) })
            .await
            .unwrap();
        assert!(cache.get("k").is_some());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get("k").is_none());
    }

    #[tokio::test]
    async fn test_load_overlapping_invalidation_is_not_cached() {
        let cache: RecordCache<u32> = RecordCache::new(None);
        let value = cache
            .get_or_populate("events", || async {
                // A mutation commits while the stale read is in flight
                cache.invalidate("events").await.unwrap();
                Ok::<_, ()>(1)
            })
            .await
            .unwrap();
        assert_eq!(*value, 1);
        assert!(cache.get("events").is_none());

        let value = cache
            .get_or_populate("events", || async { Ok::<_, ()>(2) })
            .await
            .unwrap();
        assert_eq!(*value, 2);
        assert!(cache.get("events").is_some());
    }

    #[tokio::test]
    async fn test_invalidating_missing_key_is_ok() {
        let cache: RecordCache<u32> = RecordCache::new(None);
        assert!(cache.invalidate("missing").await.is_ok());
    }
}
