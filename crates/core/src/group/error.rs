use thiserror::Error;

use crate::store::StoreError;

/// Coarse classification of a [`GroupError`], used by the API layer to pick
/// a response family. Kind preservation through the stack is a hard
/// requirement: a missing group must stay distinguishable from an
/// unreachable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-fixable input problem. Never retried.
    Validation,
    /// Group, user, or invite code absent.
    NotFound,
    /// Duplicate creation, capacity, already-a-member, owner removal.
    Conflict,
    /// Data-integrity assertion failed (e.g. duplicate invite code).
    Internal,
    /// Store or upstream failure not attributable to a condition check.
    Unavailable,
}

/// Errors surfaced by the membership and profile services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GroupError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
    #[error("No fields to update")]
    NoFieldsToUpdate,
    #[error("Group not found: {group_id}")]
    GroupNotFound { group_id: String },
    #[error("User profile not found: {auth_sub}")]
    UserNotFound { auth_sub: String },
    #[error("Owner profile not found: {auth_sub}")]
    OwnerNotFound { auth_sub: String },
    #[error("No group matches invite code: {code}")]
    InviteNotFound { code: String },
    #[error("Group already exists: {group_id}")]
    GroupAlreadyExists { group_id: String },
    #[error("Profile already exists: {auth_sub}")]
    ProfileAlreadyExists { auth_sub: String },
    #[error("Group {group_id} is full ({max} members)")]
    CapacityExceeded { group_id: String, max: usize },
    #[error("User {user_id} is already a member of group {group_id}")]
    AlreadyMember { group_id: String, user_id: String },
    #[error("Cannot remove owner {user_id} from group {group_id}")]
    CannotRemoveOwner { group_id: String, user_id: String },
    #[error("Invite code {code} matches more than one group")]
    InviteCodeCollision { code: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GroupError {
    /// Classifies this error for the API layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GroupError::EmptyField { .. } | GroupError::NoFieldsToUpdate => ErrorKind::Validation,
            GroupError::GroupNotFound { .. }
            | GroupError::UserNotFound { .. }
            | GroupError::OwnerNotFound { .. }
            | GroupError::InviteNotFound { .. } => ErrorKind::NotFound,
            GroupError::GroupAlreadyExists { .. }
            | GroupError::ProfileAlreadyExists { .. }
            | GroupError::CapacityExceeded { .. }
            | GroupError::AlreadyMember { .. }
            | GroupError::CannotRemoveOwner { .. } => ErrorKind::Conflict,
            GroupError::InviteCodeCollision { .. } => ErrorKind::Internal,
            // Store errors that carry a precise meaning are mapped by the
            // services before they reach callers; anything left over is an
            // availability problem, except for the two entity-shaped kinds.
            GroupError::Store(StoreError::NotFound { .. }) => ErrorKind::NotFound,
            GroupError::Store(StoreError::AlreadyExists { .. }) => ErrorKind::Conflict,
            GroupError::Store(_) => ErrorKind::Unavailable,
        }
    }
}

/// Result type for membership and profile operations.
pub type Result<T> = std::result::Result<T, GroupError>;
