use async_trait::async_trait;

use crate::group::{CredentialKey, Group, UserProfile};

use super::Result;

/// One operation inside an atomic multi-key transaction.
///
/// This is the narrow vocabulary the membership service needs: conditional
/// puts/deletes of Group rows and set-valued updates on both entities.
/// Every variant carries an implicit condition; a condition that does not
/// hold aborts the whole transaction with
/// [`StoreError::TransactionCanceled`](super::StoreError::TransactionCanceled).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactOp {
    /// Insert a new Group row. Condition: no group with this id exists.
    CreateGroup(Group),
    /// Delete a Group row. Condition: the group exists.
    DeleteGroup { group_id: String },
    /// Add a user to a group's member set. Condition: the group exists.
    /// Adding an existing member is a set-union no-op.
    AddGroupMember { group_id: String, user_id: String },
    /// Remove a user from a group's member set. Condition: the group
    /// exists. Removing a non-member is a set-difference no-op.
    RemoveGroupMember { group_id: String, user_id: String },
    /// Add a group id to a profile's `groups_member` set (and to
    /// `groups_owner` when `owner` is true). Condition: the profile exists.
    AddProfileMembership {
        auth_sub: String,
        group_id: String,
        owner: bool,
    },
    /// Remove a group id from a profile's `groups_member` and
    /// `groups_owner` sets. Condition: the profile exists.
    RemoveProfileMembership { auth_sub: String, group_id: String },
}

/// Key-value entity store for groups and user profiles.
///
/// Single-key operations are conditional where noted; `transact` applies a
/// batch of [`TransactOp`]s all-or-nothing across both entity kinds. All
/// mutual exclusion the membership protocol needs is delegated to the
/// store's transaction isolation; implementations never require callers to
/// hold locks.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Gets a group by id. `consistent` requests a strongly-consistent
    /// read where the backend distinguishes one.
    async fn get_group(&self, group_id: &str, consistent: bool) -> Result<Option<Group>>;

    /// Queries groups by invite code via the secondary index. Returns every
    /// match; deciding what zero or multiple matches mean is the caller's
    /// job.
    async fn get_group_by_invite_code(&self, code: &str) -> Result<Vec<Group>>;

    /// Updates a group's display name, conditioned on the group existing.
    /// Returns the updated row.
    async fn update_group_name(&self, group_id: &str, name: &str) -> Result<Group>;

    /// Gets a profile by auth subject.
    async fn get_profile(&self, auth_sub: &str, consistent: bool) -> Result<Option<UserProfile>>;

    /// Inserts a new profile, conditioned on none existing for this
    /// subject.
    async fn put_profile(&self, profile: &UserProfile) -> Result<()>;

    /// Deletes a profile, conditioned on it existing.
    async fn delete_profile(&self, auth_sub: &str) -> Result<()>;

    /// Sets one credential payload on a profile, conditioned on the
    /// profile existing. Overwrites any previous payload under the key.
    async fn upsert_profile_credential(
        &self,
        auth_sub: &str,
        key: &CredentialKey,
        payload: &str,
    ) -> Result<()>;

    /// Removes one credential from a profile, conditioned on the profile
    /// existing. Removing an absent credential is a no-op.
    async fn remove_profile_credential(&self, auth_sub: &str, key: &CredentialKey) -> Result<()>;

    /// Applies all operations atomically: either every op commits or none
    /// does. A failed condition aborts with `TransactionCanceled`.
    async fn transact(&self, ops: Vec<TransactOp>) -> Result<()>;
}
