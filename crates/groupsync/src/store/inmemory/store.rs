//! In-memory entity store for testing and local development.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use groupsync_core::group::{CredentialKey, Group, UserProfile};
use groupsync_core::store::{EntityStore, Result, StoreError, TransactOp};

/// In-memory storage backend.
///
/// Both entity maps live behind one lock so `transact` can check every
/// condition and apply every operation under a single critical section —
/// the transactions are genuinely atomic, matching the contract the
/// DynamoDB backend gets from `TransactWriteItems`. Data is not persisted.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

#[derive(Debug, Default)]
struct State {
    groups: HashMap<String, Group>,
    profiles: HashMap<String, UserProfile>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn get_group(&self, group_id: &str, _consistent: bool) -> Result<Option<Group>> {
        // Reads here are always consistent; the flag only matters for
        // backends with eventually-consistent replicas.
        Ok(self.state.read().await.groups.get(group_id).cloned())
    }

    async fn get_group_by_invite_code(&self, code: &str) -> Result<Vec<Group>> {
        Ok(self
            .state
            .read()
            .await
            .groups
            .values()
            .filter(|g| g.invite_code == code)
            .cloned()
            .collect())
    }

    async fn update_group_name(&self, group_id: &str, name: &str) -> Result<Group> {
        let mut state = self.state.write().await;
        let group = state
            .groups
            .get_mut(group_id)
            .ok_or_else(|| StoreError::NotFound {
                entity_type: "Group",
                id: group_id.to_string(),
            })?;
        group.name = name.to_string();
        Ok(group.clone())
    }

    async fn get_profile(&self, auth_sub: &str, _consistent: bool) -> Result<Option<UserProfile>> {
        Ok(self.state.read().await.profiles.get(auth_sub).cloned())
    }

    async fn put_profile(&self, profile: &UserProfile) -> Result<()> {
        let mut state = self.state.write().await;
        if state.profiles.contains_key(&profile.auth_sub) {
            return Err(StoreError::AlreadyExists {
                entity_type: "UserProfile",
                id: profile.auth_sub.clone(),
            });
        }
        state
            .profiles
            .insert(profile.auth_sub.clone(), profile.clone());
        Ok(())
    }

    async fn delete_profile(&self, auth_sub: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .profiles
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
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let profile = state
            .profiles
            .get_mut(auth_sub)
            .ok_or_else(|| StoreError::NotFound {
                entity_type: "UserProfile",
                id: auth_sub.to_string(),
            })?;
        profile.credentials.insert(key.clone(), payload.to_string());
        Ok(())
    }

    async fn remove_profile_credential(&self, auth_sub: &str, key: &CredentialKey) -> Result<()> {
        let mut state = self.state.write().await;
        let profile = state
            .profiles
            .get_mut(auth_sub)
            .ok_or_else(|| StoreError::NotFound {
                entity_type: "UserProfile",
                id: auth_sub.to_string(),
            })?;
        profile.credentials.remove(key);
        Ok(())
    }

    async fn transact(&self, ops: Vec<TransactOp>) -> Result<()> {
        let mut state = self.state.write().await;

        // Condition phase: nothing is applied unless every condition
        // holds.
        for (index, op) in ops.iter().enumerate() {
            let holds = match op {
                TransactOp::CreateGroup(group) => !state.groups.contains_key(&group.group_id),
                TransactOp::DeleteGroup { group_id }
                | TransactOp::AddGroupMember { group_id, .. }
                | TransactOp::RemoveGroupMember { group_id, .. } => {
                    state.groups.contains_key(group_id)
                }
                TransactOp::AddProfileMembership { auth_sub, .. }
                | TransactOp::RemoveProfileMembership { auth_sub, .. } => {
                    state.profiles.contains_key(auth_sub)
                }
            };
            if !holds {
                return Err(StoreError::TransactionCanceled { index: Some(index) });
            }
        }

        // Apply phase: conditions were verified above, lookups cannot
        // fail while we still hold the lock.
        for op in ops {
            match op {
                TransactOp::CreateGroup(group) => {
                    state.groups.insert(group.group_id.clone(), group);
                }
                TransactOp::DeleteGroup { group_id } => {
                    state.groups.remove(&group_id);
                }
                TransactOp::AddGroupMember { group_id, user_id } => {
                    if let Some(group) = state.groups.get_mut(&group_id) {
                        group.members.insert(user_id);
                    }
                }
                TransactOp::RemoveGroupMember { group_id, user_id } => {
                    if let Some(group) = state.groups.get_mut(&group_id) {
                        group.members.remove(&user_id);
                    }
                }
                TransactOp::AddProfileMembership {
                    auth_sub,
                    group_id,
                    owner,
                } => {
                    if let Some(profile) = state.profiles.get_mut(&auth_sub) {
                        profile.groups_member.insert(group_id.clone());
                        if owner {
                            profile.groups_owner.insert(group_id);
                        }
                    }
                }
                TransactOp::RemoveProfileMembership { auth_sub, group_id } => {
                    if let Some(profile) = state.profiles.get_mut(&auth_sub) {
                        profile.groups_member.remove(&group_id);
                        profile.groups_owner.remove(&group_id);
                    }
                }
            }
        }

        Ok(())
    }
}
