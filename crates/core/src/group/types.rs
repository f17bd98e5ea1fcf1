use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Maximum number of members a group may hold, owner included.
pub const MAX_GROUP_SIZE: usize = 20;

/// A shared-calendar group.
///
/// Invariants maintained by the membership service:
/// - `owner` is always contained in `members`.
/// - `members.len() <= MAX_GROUP_SIZE`.
/// - For every member U, `group_id` appears in U's profile `groups_member`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier and primary key.
    pub group_id: String,
    /// Unique secondary lookup key, generated at creation, immutable.
    pub invite_code: String,
    /// Opaque identifier of the owning user. Never transferred.
    pub owner: String,
    /// Mutable display name.
    pub name: String,
    /// Identifiers of all current members, owner included.
    pub members: BTreeSet<String>,
}

impl Group {
    /// Creates a group whose member set contains only the owner.
    pub fn new(
        group_id: impl Into<String>,
        owner: impl Into<String>,
        name: impl Into<String>,
        invite_code: impl Into<String>,
    ) -> Self {
        let owner = owner.into();
        let members = BTreeSet::from([owner.clone()]);
        Self {
            group_id: group_id.into(),
            invite_code: invite_code.into(),
            owner,
            name: name.into(),
            members,
        }
    }

    /// Returns true if the user is currently a member.
    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.contains(user_id)
    }

    /// Returns true if the group is at capacity.
    pub fn is_full(&self) -> bool {
        self.members.len() >= MAX_GROUP_SIZE
    }
}

/// Key identifying one linked external calendar account on a profile.
///
/// Profiles carry an open-ended set of these, one per linked account. The
/// string form (`google#…`, `ics#…`, `other#provider#…`) is the storage
/// representation and the account-scoping prefix of composite calendar ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CredentialKey {
    /// A Google Calendar account, identified by its account email/id.
    Google(String),
    /// A read-only ICS feed, identified by a caller-chosen name.
    IcsFeed(String),
    /// Any other provider, identified by provider tag plus account id.
    Other { provider: String, id: String },
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialKey::Google(id) => write!(f, "google#{id}"),
            CredentialKey::IcsFeed(name) => write!(f, "ics#{name}"),
            CredentialKey::Other { provider, id } => write!(f, "other#{provider}#{id}"),
        }
    }
}

impl FromStr for CredentialKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (tag, rest) = s
            .split_once('#')
            .ok_or_else(|| format!("credential key missing tag: {s}"))?;
        match tag {
            "google" => Ok(CredentialKey::Google(rest.to_string())),
            "ics" => Ok(CredentialKey::IcsFeed(rest.to_string())),
            "other" => {
                let (provider, id) = rest
                    .split_once('#')
                    .ok_or_else(|| format!("credential key missing provider id: {s}"))?;
                Ok(CredentialKey::Other {
                    provider: provider.to_string(),
                    id: id.to_string(),
                })
            }
            _ => Err(format!("unknown credential key tag: {tag}")),
        }
    }
}

impl From<CredentialKey> for String {
    fn from(key: CredentialKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for CredentialKey {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

/// A user profile, keyed by the stable external identity (`auth_sub`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Primary key, stable external identity.
    pub auth_sub: String,
    /// Ids of groups the user currently belongs to, owned groups included.
    pub groups_member: BTreeSet<String>,
    /// Ids of groups the user owns.
    pub groups_owner: BTreeSet<String>,
    /// Linked external calendar accounts. Payloads are opaque and must
    /// round-trip through storage unmodified.
    pub credentials: BTreeMap<CredentialKey, String>,
}

impl UserProfile {
    /// Creates an empty profile for a newly signed-up user.
    pub fn new(auth_sub: impl Into<String>) -> Self {
        Self {
            auth_sub: auth_sub.into(),
            groups_member: BTreeSet::new(),
            groups_owner: BTreeSet::new(),
            credentials: BTreeMap::new(),
        }
    }
}
