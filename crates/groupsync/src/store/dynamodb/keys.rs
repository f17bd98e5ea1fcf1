//! Attribute names for the groups and profiles tables.

/// Partition key of the groups table.
pub const GROUP_ID: &str = "group_id";
pub const INVITE_CODE: &str = "invite_code";
pub const OWNER: &str = "owner";
pub const NAME: &str = "name";
pub const MEMBERS: &str = "members";

/// Partition key of the profiles table.
pub const AUTH_SUB: &str = "auth_sub";
pub const GROUPS_MEMBER: &str = "groups_member";
pub const GROUPS_OWNER: &str = "groups_owner";
pub const CREDENTIALS: &str = "credentials";
