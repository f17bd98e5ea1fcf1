mod error;
mod http_mapping;
mod invite;
mod types;

pub use error::{ErrorKind, GroupError, Result};
pub use http_mapping::group_error_to_status_code;
pub use invite::{generate_invite_code, INVITE_CODE_LEN};
pub use types::{CredentialKey, Group, UserProfile, MAX_GROUP_SIZE};
