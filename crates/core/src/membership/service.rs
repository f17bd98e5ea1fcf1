//! Membership consistency engine.
//!
//! Owns the cross-entity invariant: a user U is a member of group G if and
//! only if U is in G's member set *and* G's id is in U's profile
//! `groups_member` set. Every mutation that touches both sides runs as one
//! atomic store transaction; if it cannot commit on both sides it commits
//! on neither.
//!
//! Precondition checks (capacity, already-a-member, owner) read the group
//! with strong consistency first and then transact. The read-then-transact
//! sequence is not itself atomic: a concurrent mutation landing between
//! the read and the commit is a known, accepted race window. The
//! transaction conditions still guarantee both-or-neither semantics; the
//! race can only turn a would-succeed call into a clean conditional abort
//! (or, for delete-group, miss a member added after the snapshot read).
//! No optimistic-concurrency versioning is layered on top.

use std::sync::Arc;

use crate::group::{
    generate_invite_code, GroupError, Group, Result, MAX_GROUP_SIZE,
};
use crate::store::{EntityStore, StoreError, TransactOp};

/// Group lifecycle and membership operations, generic over the entity
/// store. Holds no per-request state; clone the `Arc` handle freely.
pub struct MembershipService<S: EntityStore> {
    store: Arc<S>,
}

impl<S: EntityStore> MembershipService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Creates a group owned by `owner`, who joins it in the same
    /// transaction.
    ///
    /// Atomically inserts the Group row (condition: id free) and adds the
    /// group to the owner's profile membership/ownership sets (condition:
    /// profile exists). Fails with `GroupAlreadyExists` or
    /// `OwnerNotFound`; partial application is never observable.
    pub async fn create_group(
        &self,
        group_id: &str,
        owner: &str,
        name: &str,
    ) -> Result<Group> {
        require_non_empty(group_id, "group_id")?;
        require_non_empty(owner, "owner")?;

        let invite_code = generate_invite_code();
        let group = Group::new(group_id, owner, name, invite_code);

        let ops = vec![
            TransactOp::CreateGroup(group.clone()),
            TransactOp::AddProfileMembership {
                auth_sub: owner.to_string(),
                group_id: group_id.to_string(),
                owner: true,
            },
        ];

        match self.store.transact(ops).await {
            Ok(()) => {
                tracing::debug!(group_id = %group_id, owner = %owner, "Group created");
                Ok(group)
            }
            Err(StoreError::TransactionCanceled { index: Some(0) }) => {
                Err(GroupError::GroupAlreadyExists {
                    group_id: group_id.to_string(),
                })
            }
            Err(StoreError::TransactionCanceled { index: Some(1) }) => {
                Err(GroupError::OwnerNotFound {
                    auth_sub: owner.to_string(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Adds a user to a group.
    ///
    /// Unlike [`ensure_member`](Self::ensure_member), calling this for an
    /// existing member fails with `AlreadyMember` so callers can
    /// distinguish the two outcomes.
    pub async fn add_member(&self, group_id: &str, user_id: &str) -> Result<()> {
        self.join(group_id, user_id, false).await
    }

    /// Adds a user to a group with set-union idempotence: joining a group
    /// one is already in succeeds without touching anything. Used by
    /// invite redemption.
    pub async fn ensure_member(&self, group_id: &str, user_id: &str) -> Result<()> {
        self.join(group_id, user_id, true).await
    }

    async fn join(&self, group_id: &str, user_id: &str, idempotent: bool) -> Result<()> {
        require_non_empty(group_id, "group_id")?;
        require_non_empty(user_id, "user_id")?;

        let group = self.read_group(group_id, true).await?;
        if group.is_member(user_id) {
            if idempotent {
                return Ok(());
            }
            return Err(GroupError::AlreadyMember {
                group_id: group_id.to_string(),
                user_id: user_id.to_string(),
            });
        }
        if group.is_full() {
            return Err(GroupError::CapacityExceeded {
                group_id: group_id.to_string(),
                max: MAX_GROUP_SIZE,
            });
        }

        let ops = vec![
            TransactOp::AddGroupMember {
                group_id: group_id.to_string(),
                user_id: user_id.to_string(),
            },
            TransactOp::AddProfileMembership {
                auth_sub: user_id.to_string(),
                group_id: group_id.to_string(),
                owner: false,
            },
        ];

        match self.store.transact(ops).await {
            Ok(()) => {
                tracing::debug!(group_id = %group_id, user_id = %user_id, "Member added");
                Ok(())
            }
            // Group deleted between the read and the commit.
            Err(StoreError::TransactionCanceled { index: Some(0) }) => {
                Err(GroupError::GroupNotFound {
                    group_id: group_id.to_string(),
                })
            }
            Err(StoreError::TransactionCanceled { index: Some(1) }) => {
                Err(GroupError::UserNotFound {
                    auth_sub: user_id.to_string(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Redeems an invite code: looks up the group and joins it
    /// idempotently. Returns the group as read after the join.
    pub async fn redeem_invite(&self, code: &str, user_id: &str) -> Result<Group> {
        let group = self.get_group_by_invite_code(code).await?;
        self.ensure_member(&group.group_id, user_id).await?;
        self.get_group(&group.group_id, true).await
    }

    /// Removes a user from a group. The owner can never be removed;
    /// deleting the group is the only way to end the owner's membership.
    pub async fn remove_member(&self, group_id: &str, user_id: &str) -> Result<()> {
        require_non_empty(group_id, "group_id")?;
        require_non_empty(user_id, "user_id")?;

        let group = self.read_group(group_id, true).await?;
        if group.owner == user_id {
            return Err(GroupError::CannotRemoveOwner {
                group_id: group_id.to_string(),
                user_id: user_id.to_string(),
            });
        }

        let ops = vec![
            TransactOp::RemoveGroupMember {
                group_id: group_id.to_string(),
                user_id: user_id.to_string(),
            },
            TransactOp::RemoveProfileMembership {
                auth_sub: user_id.to_string(),
                group_id: group_id.to_string(),
            },
        ];

        match self.store.transact(ops).await {
            Ok(()) => {
                tracing::debug!(group_id = %group_id, user_id = %user_id, "Member removed");
                Ok(())
            }
            Err(StoreError::TransactionCanceled { index: Some(0) }) => {
                Err(GroupError::GroupNotFound {
                    group_id: group_id.to_string(),
                })
            }
            // Profile row gone: membership on the group side would be
            // orphaned; surface the abort rather than half-apply.
            Err(StoreError::TransactionCanceled { index: Some(1) }) => {
                Err(GroupError::UserNotFound {
                    auth_sub: user_id.to_string(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Deletes a group, cascading membership removal to every member
    /// captured by a strongly-consistent read immediately before the
    /// transaction.
    ///
    /// A member added between that read and the commit keeps a dangling
    /// profile reference: an accepted limitation of read-then-transact,
    /// not silently repaired here.
    pub async fn delete_group(&self, group_id: &str) -> Result<()> {
        require_non_empty(group_id, "group_id")?;

        let group = self.read_group(group_id, true).await?;

        let mut ops = Vec::with_capacity(group.members.len() + 1);
        ops.push(TransactOp::DeleteGroup {
            group_id: group_id.to_string(),
        });
        for member in &group.members {
            ops.push(TransactOp::RemoveProfileMembership {
                auth_sub: member.clone(),
                group_id: group_id.to_string(),
            });
        }

        match self.store.transact(ops).await {
            Ok(()) => {
                tracing::debug!(
                    group_id = %group_id,
                    members = group.members.len(),
                    "Group deleted with membership cascade"
                );
                Ok(())
            }
            Err(StoreError::TransactionCanceled { index: Some(0) }) => {
                Err(GroupError::GroupNotFound {
                    group_id: group_id.to_string(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Renames a group. Single-entity conditional update; no profile rows
    /// are involved.
    pub async fn rename_group(&self, group_id: &str, new_name: &str) -> Result<Group> {
        require_non_empty(group_id, "group_id")?;
        if new_name.trim().is_empty() {
            return Err(GroupError::NoFieldsToUpdate);
        }

        match self.store.update_group_name(group_id, new_name).await {
            Ok(group) => {
                tracing::debug!(group_id = %group_id, name = %new_name, "Group renamed");
                Ok(group)
            }
            Err(StoreError::NotFound { .. }) => Err(GroupError::GroupNotFound {
                group_id: group_id.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Gets a group by id.
    pub async fn get_group(&self, group_id: &str, consistent: bool) -> Result<Group> {
        require_non_empty(group_id, "group_id")?;
        self.read_group(group_id, consistent).await
    }

    /// Looks up a group by invite code.
    ///
    /// Invite codes are generated to be unique: zero matches is
    /// `InviteNotFound`, more than one is a data-integrity violation
    /// surfaced as `InviteCodeCollision`, never resolved by picking the
    /// first row.
    pub async fn get_group_by_invite_code(&self, code: &str) -> Result<Group> {
        require_non_empty(code, "invite_code")?;

        let mut matches = self.store.get_group_by_invite_code(code).await?;
        match matches.len() {
            0 => Err(GroupError::InviteNotFound {
                code: code.to_string(),
            }),
            1 => Ok(matches.remove(0)),
            n => {
                tracing::error!(code = %code, matches = n, "Invite code matches multiple groups");
                Err(GroupError::InviteCodeCollision {
                    code: code.to_string(),
                })
            }
        }
    }

    async fn read_group(&self, group_id: &str, consistent: bool) -> Result<Group> {
        self.store
            .get_group(group_id, consistent)
            .await?
            .ok_or_else(|| GroupError::GroupNotFound {
                group_id: group_id.to_string(),
            })
    }
}

fn require_non_empty(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GroupError::EmptyField { field });
    }
    Ok(())
}
