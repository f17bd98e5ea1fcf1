mod error;
mod keys;
mod serialization;
mod traits;

pub use error::{CacheError, Result};
pub use keys::{
    extract_auth_sub_from_key, extract_auth_sub_from_prefix, free_busy_key, free_busy_prefix,
    free_busy_tracking_key, is_free_busy_key,
};
pub use serialization::{deserialize_schedule, serialize_schedule, SerializationError};
pub use traits::Cache;
