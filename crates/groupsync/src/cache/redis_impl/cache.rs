//! Redis cache implementation.
//!
//! Uses set-based key tracking for prefix deletion without SCAN: each
//! user's live free/busy keys are tracked in a Redis Set keyed by auth
//! subject.
//!
//! # Fail-open policy
//!
//! The cache is disposable memoization, so availability beats freshness.
//! The first connection-class failure flips a process-lifetime kill
//! switch; from then on every operation short-circuits to a miss/no-op
//! without touching Redis. Reconnecting requires a process restart.
//! Non-connection failures (a `WRONGTYPE`, a bad payload) surface as
//! errors and leave the switch alone; callers treat those as misses too.
//!
//! # Non-atomicity safety
//!
//! `delete` and `delete_prefix` issue multiple commands without a
//! transaction. A crash between them leaves stale members in a tracking
//! set, which is harmless: SREM on an absent member and DEL on an absent
//! key are no-ops, so a later invalidation finishes the cleanup.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use groupsync_core::cache::{
    extract_auth_sub_from_key, extract_auth_sub_from_prefix, free_busy_tracking_key,
    is_free_busy_key, Cache, CacheError, Result,
};

use super::error::map_redis_error;

/// Redis cache backend using connection manager for pooling.
pub struct RedisCache {
    conn: redis::aio::ConnectionManager,
    /// Process-lifetime kill switch, tripped by the first
    /// connection-class failure.
    disabled: Arc<AtomicBool>,
}

impl RedisCache {
    /// Creates a new Redis cache connection.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ConnectionFailed` if the connection cannot be
    /// established.
    pub async fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;
        let conn = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(map_redis_error)?;
        Ok(Self {
            conn,
            disabled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Returns true once the kill switch has tripped.
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }

    /// Classifies an error and trips the kill switch on connection-class
    /// failures.
    fn check(&self, err: redis::RedisError) -> CacheError {
        let mapped = map_redis_error(err);
        if matches!(mapped, CacheError::ConnectionFailed(_))
            && !self.disabled.swap(true, Ordering::Relaxed)
        {
            tracing::warn!(error = %mapped, "redis unreachable, caching disabled for process lifetime");
        }
        mapped
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if self.is_disabled() {
            return Ok(None);
        }
        let mut conn = self.conn.clone();
        let result: Option<Vec<u8>> = conn.get(key).await.map_err(|e| self.check(e))?;
        Ok(result)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        if self.is_disabled() {
            return Ok(());
        }
        let mut conn = self.conn.clone();

        match ttl {
            Some(duration) => {
                let seconds = duration.as_secs().max(1);
                conn.set_ex::<_, _, ()>(key, value, seconds)
                    .await
                    .map_err(|e| self.check(e))?;
            }
            None => {
                conn.set::<_, _, ()>(key, value)
                    .await
                    .map_err(|e| self.check(e))?;
            }
        }

        // Track free/busy keys in the user's tracking set so prefix
        // invalidation can find them without SCAN.
        if is_free_busy_key(key) {
            if let Some(auth_sub) = extract_auth_sub_from_key(key) {
                let tracking_key = free_busy_tracking_key(auth_sub);
                conn.sadd::<_, _, ()>(&tracking_key, key)
                    .await
                    .map_err(|e| self.check(e))?;
            }
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.is_disabled() {
            return Ok(());
        }
        let mut conn = self.conn.clone();

        if is_free_busy_key(key) {
            if let Some(auth_sub) = extract_auth_sub_from_key(key) {
                let tracking_key = free_busy_tracking_key(auth_sub);
                conn.srem::<_, _, ()>(&tracking_key, key)
                    .await
                    .map_err(|e| self.check(e))?;
            }
        }

        conn.del::<_, ()>(key).await.map_err(|e| self.check(e))?;

        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        if self.is_disabled() {
            return Ok(0);
        }
        // Only user free/busy prefixes are tracked; anything else is a
        // no-op rather than a SCAN.
        let Some(auth_sub) = extract_auth_sub_from_prefix(prefix) else {
            return Ok(0);
        };

        let mut conn = self.conn.clone();
        let tracking_key = free_busy_tracking_key(auth_sub);

        let tracked_keys: Vec<String> = conn
            .smembers(&tracking_key)
            .await
            .map_err(|e| self.check(e))?;

        let keys_to_delete: Vec<&String> = tracked_keys
            .iter()
            .filter(|k| k.starts_with(prefix))
            .collect();

        let removed = keys_to_delete.len();
        if !keys_to_delete.is_empty() {
            conn.del::<_, ()>(&keys_to_delete)
                .await
                .map_err(|e| self.check(e))?;
        }

        conn.del::<_, ()>(&tracking_key)
            .await
            .map_err(|e| self.check(e))?;

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groupsync_core::cache::{free_busy_key, free_busy_prefix};

    /// Helper to get Redis URL from environment.
    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    /// Skip test if Redis not available.
    async fn get_test_cache() -> Option<RedisCache> {
        RedisCache::new(&redis_url()).await.ok()
    }

    /// Generate a unique test auth subject to avoid conflicts.
    fn test_sub(suffix: &str) -> String {
        format!(
            "test-sub-{}-{suffix}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        )
    }

    #[tokio::test]
    async fn test_redis_set_and_get() {
        let Some(cache) = get_test_cache().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let key = free_busy_key(&test_sub("set_get"), "start", "end");
        cache.set(&key, b"hello world", None).await.unwrap();

        let result = cache.get(&key).await.unwrap();
        assert_eq!(result, Some(b"hello world".to_vec()));

        cache.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_redis_get_nonexistent() {
        let Some(cache) = get_test_cache().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let key = free_busy_key(&test_sub("nonexistent"), "start", "end");
        assert_eq!(cache.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_redis_ttl() {
        let Some(cache) = get_test_cache().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let key = free_busy_key(&test_sub("ttl"), "start", "end");
        cache
            .set(&key, b"expiring value", Some(Duration::from_secs(1)))
            .await
            .unwrap();
        assert!(cache.get(&key).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(cache.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_redis_delete_prefix() {
        let Some(cache) = get_test_cache().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let sub = test_sub("delete_prefix");
        let other_sub = test_sub("delete_prefix_other");
        let key1 = free_busy_key(&sub, "2024-01-01T00:00:00Z", "2024-01-08T00:00:00Z");
        let key2 = free_busy_key(&sub, "2024-02-01T00:00:00Z", "2024-02-08T00:00:00Z");
        let key3 = free_busy_key(&other_sub, "2024-01-01T00:00:00Z", "2024-01-08T00:00:00Z");

        cache.set(&key1, b"value1", None).await.unwrap();
        cache.set(&key2, b"value2", None).await.unwrap();
        cache.set(&key3, b"value3", None).await.unwrap();

        let removed = cache.delete_prefix(&free_busy_prefix(&sub)).await.unwrap();
        assert_eq!(removed, 2);

        assert!(cache.get(&key1).await.unwrap().is_none());
        assert!(cache.get(&key2).await.unwrap().is_none());
        assert!(cache.get(&key3).await.unwrap().is_some());

        cache.delete(&key3).await.unwrap();
    }

    #[tokio::test]
    async fn test_redis_delete_removes_from_tracking() {
        let Some(cache) = get_test_cache().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let sub = test_sub("tracking");
        let key = free_busy_key(&sub, "start", "end");
        let tracking_key = free_busy_tracking_key(&sub);

        cache.set(&key, b"data", None).await.unwrap();

        let mut conn = cache.conn.clone();
        let tracked: Vec<String> = conn.smembers(&tracking_key).await.unwrap();
        assert!(tracked.contains(&key));

        cache.delete(&key).await.unwrap();

        let tracked_after: Vec<String> = conn.smembers(&tracking_key).await.unwrap();
        assert!(!tracked_after.contains(&key));

        conn.del::<_, ()>(&tracking_key).await.unwrap();
    }

    #[tokio::test]
    async fn test_redis_delete_prefix_unknown_prefix_is_noop() {
        let Some(cache) = get_test_cache().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let key = free_busy_key(&test_sub("noop"), "start", "end");
        cache.set(&key, b"value", None).await.unwrap();

        let removed = cache.delete_prefix("session:123:").await.unwrap();
        assert_eq!(removed, 0);
        assert!(cache.get(&key).await.unwrap().is_some());

        cache.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_disabled_cache_short_circuits() {
        let Some(cache) = get_test_cache().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        cache.disabled.store(true, Ordering::Relaxed);

        let key = free_busy_key(&test_sub("disabled"), "start", "end");
        cache.set(&key, b"value", None).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), None);
        assert_eq!(cache.delete_prefix(&free_busy_prefix("anyone")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_redis_binary_data() {
        let Some(cache) = get_test_cache().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let key = free_busy_key(&test_sub("binary"), "start", "end");
        let value: Vec<u8> = (0..=255).collect();

        cache.set(&key, &value, None).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), Some(value));

        cache.delete(&key).await.unwrap();
    }
}
