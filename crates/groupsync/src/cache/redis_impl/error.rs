//! Redis error mapping to CacheError.

use groupsync_core::cache::CacheError;

/// Maps Redis errors to CacheError.
///
/// Connection-class errors get their own variant because they trip the
/// backend's kill switch; everything else is an operation failure.
pub fn map_redis_error(err: redis::RedisError) -> CacheError {
    if err.is_io_error()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_timeout()
    {
        CacheError::ConnectionFailed(err.to_string())
    } else {
        CacheError::OperationFailed(err.to_string())
    }
}
