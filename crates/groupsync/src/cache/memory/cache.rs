//! In-memory cache implementation with LRU eviction.
//!
//! Thread-safe cache with TTL support using tokio synchronization
//! primitives and LRU eviction. Mirrors the Redis backend's behavior:
//! free/busy keys are tracked per user so prefix deletion touches only
//! that user's entries.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;

use groupsync_core::cache::{extract_auth_sub_from_key, is_free_busy_key, Cache, Result};

/// A single cache entry with optional expiration.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|d| Instant::now() + d);
        Self { value, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() > exp)
    }
}

/// In-memory cache with LRU eviction.
///
/// TTLs expire lazily: an expired entry reads as a miss and is left for
/// LRU eviction to reclaim. Free/busy keys are tracked per auth subject
/// so `delete_prefix` never iterates the full store for user
/// invalidation.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    store: Arc<RwLock<LruCache<String, CacheEntry>>>,
    /// Maps auth_sub -> set of live free/busy keys.
    tracking: Arc<RwLock<HashMap<String, HashSet<String>>>>,
}

impl MemoryCache {
    /// Creates a new in-memory cache holding at most `max_entries` values.
    ///
    /// # Panics
    ///
    /// Panics if `max_entries` is 0.
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).expect("max_entries must be > 0");
        Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
            tracking: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut store = self.store.write().await;

        match store.get(key) {
            // Expired entries read as misses; reclamation is left to LRU
            // eviction.
            Some(entry) if entry.is_expired() => Ok(None),
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        {
            let mut store = self.store.write().await;
            store.put(key.to_string(), CacheEntry::new(value.to_vec(), ttl));
        }

        if is_free_busy_key(key) {
            if let Some(auth_sub) = extract_auth_sub_from_key(key) {
                let mut tracking = self.tracking.write().await;
                tracking
                    .entry(auth_sub.to_string())
                    .or_default()
                    .insert(key.to_string());
            }
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if is_free_busy_key(key) {
            if let Some(auth_sub) = extract_auth_sub_from_key(key) {
                let mut tracking = self.tracking.write().await;
                if let Some(keys) = tracking.get_mut(auth_sub) {
                    keys.remove(key);
                    if keys.is_empty() {
                        tracking.remove(auth_sub);
                    }
                }
            }
        }

        let mut store = self.store.write().await;
        store.pop(key);

        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        use groupsync_core::cache::extract_auth_sub_from_prefix;

        // User free/busy prefixes go through the tracking index; anything
        // else falls back to a full iteration.
        let Some(auth_sub) = extract_auth_sub_from_prefix(prefix) else {
            let mut store = self.store.write().await;
            let keys_to_delete: Vec<String> = store
                .iter()
                .filter(|(key, _)| key.starts_with(prefix))
                .map(|(key, _)| key.clone())
                .collect();
            for key in &keys_to_delete {
                store.pop(key);
            }
            return Ok(keys_to_delete.len());
        };

        let tracked_keys: Vec<String> = {
            let mut tracking = self.tracking.write().await;
            tracking
                .remove(auth_sub)
                .map(|keys| keys.into_iter().collect())
                .unwrap_or_default()
        };

        let mut removed = 0;
        if !tracked_keys.is_empty() {
            let mut store = self.store.write().await;
            for key in &tracked_keys {
                if store.pop(key).is_some() {
                    removed += 1;
                }
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groupsync_core::cache::{free_busy_key, free_busy_prefix};

    const TEST_MAX_ENTRIES: usize = 1000;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);

        cache.set("test:key", b"test value", None).await.unwrap();
        let result = cache.get("test:key").await.unwrap();

        assert_eq!(result, Some(b"test value".to_vec()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);
        assert_eq!(cache.get("nonexistent:key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);

        cache.set("test:delete", b"to be deleted", None).await.unwrap();
        assert!(cache.get("test:delete").await.unwrap().is_some());

        cache.delete("test:delete").await.unwrap();
        assert!(cache.get("test:delete").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);

        cache
            .set("test:ttl", b"short-lived", Some(Duration::from_millis(50)))
            .await
            .unwrap();
        assert!(cache.get("test:ttl").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(cache.get("test:ttl").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_no_ttl_never_expires() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);

        cache.set("test:no-ttl", b"persistent", None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(cache.get("test:no-ttl").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_prefix_only_hits_one_user() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);

        let key1 = free_busy_key("alice", "2024-01-01T00:00:00Z", "2024-01-08T00:00:00Z");
        let key2 = free_busy_key("alice", "2024-02-01T00:00:00Z", "2024-02-08T00:00:00Z");
        let key3 = free_busy_key("bob", "2024-01-01T00:00:00Z", "2024-01-08T00:00:00Z");

        cache.set(&key1, b"1", None).await.unwrap();
        cache.set(&key2, b"2", None).await.unwrap();
        cache.set(&key3, b"3", None).await.unwrap();
        cache.set("group:trip", b"4", None).await.unwrap();

        let removed = cache.delete_prefix(&free_busy_prefix("alice")).await.unwrap();
        assert_eq!(removed, 2);

        assert!(cache.get(&key1).await.unwrap().is_none());
        assert!(cache.get(&key2).await.unwrap().is_none());
        assert!(cache.get(&key3).await.unwrap().is_some());
        assert!(cache.get("group:trip").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_prefix_no_matches() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);

        cache.set("group:trip", b"value", None).await.unwrap();

        let removed = cache.delete_prefix(&free_busy_prefix("ghost")).await.unwrap();
        assert_eq!(removed, 0);
        assert!(cache.get("group:trip").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_prefix_non_free_busy_falls_back() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);

        cache.set("session:123:data", b"value1", None).await.unwrap();
        cache.set("session:123:meta", b"value2", None).await.unwrap();
        cache.set("session:456:data", b"value3", None).await.unwrap();

        let removed = cache.delete_prefix("session:123:").await.unwrap();
        assert_eq!(removed, 2);

        assert!(cache.get("session:123:data").await.unwrap().is_none());
        assert!(cache.get("session:456:data").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_removes_from_tracking() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);

        let key = free_busy_key("alice", "2024-01-01T00:00:00Z", "2024-01-08T00:00:00Z");
        cache.set(&key, b"data", None).await.unwrap();

        {
            let tracking = cache.tracking.read().await;
            assert!(tracking.get("alice").unwrap().contains(&key));
        }

        cache.delete(&key).await.unwrap();

        {
            let tracking = cache.tracking.read().await;
            assert!(tracking.get("alice").is_none());
        }
    }

    #[tokio::test]
    async fn test_overwrite_value() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);

        cache.set("test:overwrite", b"first", None).await.unwrap();
        cache.set("test:overwrite", b"second", None).await.unwrap();

        assert_eq!(
            cache.get("test:overwrite").await.unwrap(),
            Some(b"second".to_vec())
        );
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let cache = MemoryCache::new(3);

        cache.set("key1", b"value1", None).await.unwrap();
        cache.set("key2", b"value2", None).await.unwrap();
        cache.set("key3", b"value3", None).await.unwrap();

        // Touch key1 so key2 becomes least recently used.
        cache.get("key1").await.unwrap();
        cache.set("key4", b"value4", None).await.unwrap();

        assert!(cache.get("key1").await.unwrap().is_some());
        assert!(cache.get("key2").await.unwrap().is_none());
        assert!(cache.get("key3").await.unwrap().is_some());
        assert!(cache.get("key4").await.unwrap().is_some());
    }

    #[tokio::test]
    #[should_panic(expected = "max_entries must be > 0")]
    async fn test_zero_max_entries_panics() {
        let _ = MemoryCache::new(0);
    }
}
