//! Profile lifecycle and credential management.
//!
//! Credential changes carry the cache invalidation contract: whenever the
//! set of linked calendar accounts changes, every cached free/busy entry
//! for that user is dropped by prefix, regardless of window. Deliberately
//! coarse — over-invalidation is always safe, under-invalidation never is.

use std::sync::Arc;

use crate::cache::{free_busy_prefix, Cache};
use crate::group::{CredentialKey, GroupError, Result, UserProfile};
use crate::store::{EntityStore, StoreError};

/// Profile operations, generic over the store and the cache.
pub struct ProfileService<S: EntityStore, C: Cache> {
    store: Arc<S>,
    cache: Arc<C>,
}

impl<S: EntityStore, C: Cache> ProfileService<S, C> {
    pub fn new(store: Arc<S>, cache: Arc<C>) -> Self {
        Self { store, cache }
    }

    /// Creates an empty profile at signup.
    pub async fn create_profile(&self, auth_sub: &str) -> Result<UserProfile> {
        require_non_empty(auth_sub)?;

        let profile = UserProfile::new(auth_sub);
        match self.store.put_profile(&profile).await {
            Ok(()) => {
                tracing::debug!(auth_sub = %auth_sub, "Profile created");
                Ok(profile)
            }
            Err(StoreError::AlreadyExists { .. }) => Err(GroupError::ProfileAlreadyExists {
                auth_sub: auth_sub.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Gets a profile by auth subject.
    pub async fn get_profile(&self, auth_sub: &str) -> Result<UserProfile> {
        require_non_empty(auth_sub)?;
        self.store
            .get_profile(auth_sub, false)
            .await?
            .ok_or_else(|| GroupError::UserNotFound {
                auth_sub: auth_sub.to_string(),
            })
    }

    /// Deletes a profile on account removal. Cascading group cleanup is
    /// the caller's responsibility.
    pub async fn delete_profile(&self, auth_sub: &str) -> Result<()> {
        require_non_empty(auth_sub)?;
        match self.store.delete_profile(auth_sub).await {
            Ok(()) => {
                tracing::debug!(auth_sub = %auth_sub, "Profile deleted");
                self.invalidate_free_busy(auth_sub).await;
                Ok(())
            }
            Err(StoreError::NotFound { .. }) => Err(GroupError::UserNotFound {
                auth_sub: auth_sub.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Links or replaces one external calendar credential, then drops all
    /// cached free/busy entries for this user.
    pub async fn upsert_credential(
        &self,
        auth_sub: &str,
        key: &CredentialKey,
        payload: &str,
    ) -> Result<()> {
        require_non_empty(auth_sub)?;

        match self
            .store
            .upsert_profile_credential(auth_sub, key, payload)
            .await
        {
            Ok(()) => {
                tracing::debug!(auth_sub = %auth_sub, account = %key, "Credential upserted");
                self.invalidate_free_busy(auth_sub).await;
                Ok(())
            }
            Err(StoreError::NotFound { .. }) => Err(GroupError::UserNotFound {
                auth_sub: auth_sub.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Unlinks one external calendar credential, then drops all cached
    /// free/busy entries for this user.
    pub async fn remove_credential(&self, auth_sub: &str, key: &CredentialKey) -> Result<()> {
        require_non_empty(auth_sub)?;

        match self.store.remove_profile_credential(auth_sub, key).await {
            Ok(()) => {
                tracing::debug!(auth_sub = %auth_sub, account = %key, "Credential removed");
                self.invalidate_free_busy(auth_sub).await;
                Ok(())
            }
            Err(StoreError::NotFound { .. }) => Err(GroupError::UserNotFound {
                auth_sub: auth_sub.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Prefix-deletes the user's free/busy cache entries. Cache failures
    /// are logged and swallowed: the entries still expire via TTL, and the
    /// store write already committed.
    async fn invalidate_free_busy(&self, auth_sub: &str) {
        let prefix = free_busy_prefix(auth_sub);
        match self.cache.delete_prefix(&prefix).await {
            Ok(count) => {
                tracing::trace!(auth_sub = %auth_sub, count, "Invalidated free/busy cache entries");
            }
            Err(err) => {
                tracing::warn!(
                    auth_sub = %auth_sub,
                    error = %err,
                    "Failed to invalidate free/busy cache entries"
                );
            }
        }
    }
}

fn require_non_empty(auth_sub: &str) -> Result<()> {
    if auth_sub.trim().is_empty() {
        return Err(GroupError::EmptyField { field: "auth_sub" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::RwLock;

    use crate::cache::{free_busy_key, CacheError, Result as CacheResult};
    use crate::group::Group;
    use crate::store::{Result as StoreResult, TransactOp};

    #[derive(Default)]
    struct MockStore {
        profiles: RwLock<HashMap<String, UserProfile>>,
    }

    #[async_trait]
    impl EntityStore for MockStore {
        async fn get_group(&self, _group_id: &str, _consistent: bool) -> StoreResult<Option<Group>> {
            Ok(None)
        }

        async fn get_group_by_invite_code(&self, _code: &str) -> StoreResult<Vec<Group>> {
            Ok(Vec::new())
        }

        async fn update_group_name(&self, group_id: &str, _name: &str) -> StoreResult<Group> {
            Err(StoreError::NotFound {
                entity_type: "Group",
                id: group_id.to_string(),
            })
        }

        async fn get_profile(
            &self,
            auth_sub: &str,
            _consistent: bool,
        ) -> StoreResult<Option<UserProfile>> {
            Ok(self.profiles.read().await.get(auth_sub).cloned())
        }

        async fn put_profile(&self, profile: &UserProfile) -> StoreResult<()> {
            let mut profiles = self.profiles.write().await;
            if profiles.contains_key(&profile.auth_sub) {
                return Err(StoreError::AlreadyExists {
                    entity_type: "UserProfile",
                    id: profile.auth_sub.clone(),
                });
            }
            profiles.insert(profile.auth_sub.clone(), profile.clone());
            Ok(())
        }

        async fn delete_profile(&self, auth_sub: &str) -> StoreResult<()> {
            self.profiles
                .write()
                .await
                .remove(auth_sub)
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound {
                    entity_type: "UserProfile",
                    id: auth_sub.to_string(),
                })
        }

        async fn upsert_profile_credential(
            &self,
            auth_sub: &str,
            key: &CredentialKey,
            payload: &str,
        ) -> StoreResult<()> {
            let mut profiles = self.profiles.write().await;
            let profile = profiles
                .get_mut(auth_sub)
                .ok_or_else(|| StoreError::NotFound {
                    entity_type: "UserProfile",
                    id: auth_sub.to_string(),
                })?;
            profile.credentials.insert(key.clone(), payload.to_string());
            Ok(())
        }

        async fn remove_profile_credential(
            &self,
            auth_sub: &str,
            key: &CredentialKey,
        ) -> StoreResult<()> {
            let mut profiles = self.profiles.write().await;
            let profile = profiles
                .get_mut(auth_sub)
                .ok_or_else(|| StoreError::NotFound {
                    entity_type: "UserProfile",
                    id: auth_sub.to_string(),
                })?;
            profile.credentials.remove(key);
            Ok(())
        }

        async fn transact(&self, _ops: Vec<TransactOp>) -> StoreResult<()> {
            Ok(())
        }
    }

    /// Cache that can be told to fail every operation.
    struct MockCache {
        store: RwLock<HashMap<String, Vec<u8>>>,
        failing: bool,
    }

    impl MockCache {
        fn new() -> Self {
            Self {
                store: RwLock::new(HashMap::new()),
                failing: false,
            }
        }

        fn failing() -> Self {
            Self {
                store: RwLock::new(HashMap::new()),
                failing: true,
            }
        }

        fn fail<T>(&self) -> CacheResult<T> {
            Err(CacheError::ConnectionFailed("down".to_string()))
        }
    }

    #[async_trait]
    impl Cache for MockCache {
        async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
            if self.failing {
                return self.fail();
            }
            Ok(self.store.read().await.get(key).cloned())
        }

        async fn set(&self, key: &str, value: &[u8], _ttl: Option<Duration>) -> CacheResult<()> {
            if self.failing {
                return self.fail();
            }
            self.store
                .write()
                .await
                .insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn delete(&self, key: &str) -> CacheResult<()> {
            if self.failing {
                return self.fail();
            }
            self.store.write().await.remove(key);
            Ok(())
        }

        async fn delete_prefix(&self, prefix: &str) -> CacheResult<usize> {
            if self.failing {
                return self.fail();
            }
            let mut store = self.store.write().await;
            let before = store.len();
            store.retain(|k, _| !k.starts_with(prefix));
            Ok(before - store.len())
        }
    }

    fn google_key() -> CredentialKey {
        CredentialKey::Google("a@b.c".to_string())
    }

    #[tokio::test]
    async fn test_create_and_get_profile() {
        let store = Arc::new(MockStore::default());
        let svc = ProfileService::new(store, Arc::new(MockCache::new()));

        let created = svc.create_profile("sub-1").await.unwrap();
        assert!(created.credentials.is_empty());

        let fetched = svc.get_profile("sub-1").await.unwrap();
        assert_eq!(fetched, created);

        assert_eq!(
            svc.create_profile("sub-1").await.unwrap_err(),
            GroupError::ProfileAlreadyExists {
                auth_sub: "sub-1".to_string()
            }
        );
        assert_eq!(
            svc.get_profile("nope").await.unwrap_err(),
            GroupError::UserNotFound {
                auth_sub: "nope".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_upsert_credential_invalidates_all_windows_for_user() {
        let store = Arc::new(MockStore::default());
        let cache = Arc::new(MockCache::new());
        let svc = ProfileService::new(store, cache.clone());
        svc.create_profile("sub-1").await.unwrap();

        // Two windows for sub-1, one for another user.
        cache
            .set(&free_busy_key("sub-1", "a", "b"), b"{}", None)
            .await
            .unwrap();
        cache
            .set(&free_busy_key("sub-1", "c", "d"), b"{}", None)
            .await
            .unwrap();
        cache
            .set(&free_busy_key("sub-2", "a", "b"), b"{}", None)
            .await
            .unwrap();

        svc.upsert_credential("sub-1", &google_key(), "token")
            .await
            .unwrap();

        let store = cache.store.read().await;
        assert!(!store.contains_key(&free_busy_key("sub-1", "a", "b")));
        assert!(!store.contains_key(&free_busy_key("sub-1", "c", "d")));
        assert!(store.contains_key(&free_busy_key("sub-2", "a", "b")));
    }

    #[tokio::test]
    async fn test_credential_ops_survive_cache_outage() {
        let store = Arc::new(MockStore::default());
        let svc = ProfileService::new(store.clone(), Arc::new(MockCache::failing()));
        svc.create_profile("sub-1").await.unwrap();

        // Cache is down; the store write must still succeed.
        svc.upsert_credential("sub-1", &google_key(), "token")
            .await
            .unwrap();
        let profile = store.get_profile("sub-1", false).await.unwrap().unwrap();
        assert_eq!(
            profile.credentials.get(&google_key()).map(String::as_str),
            Some("token")
        );

        svc.remove_credential("sub-1", &google_key()).await.unwrap();
        let profile = store.get_profile("sub-1", false).await.unwrap().unwrap();
        assert!(profile.credentials.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_credential_unknown_profile() {
        let store = Arc::new(MockStore::default());
        let svc = ProfileService::new(store, Arc::new(MockCache::new()));

        assert_eq!(
            svc.upsert_credential("ghost", &google_key(), "token")
                .await
                .unwrap_err(),
            GroupError::UserNotFound {
                auth_sub: "ghost".to_string()
            }
        );
    }
}
