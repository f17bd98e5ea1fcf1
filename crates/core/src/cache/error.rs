use thiserror::Error;

/// Errors that can occur during cache operations.
///
/// These exist so backends can classify failures internally (a connection
/// failure permanently disables a fail-open backend, other failures do
/// not); they are never propagated to engine callers — every caller treats
/// a cache error as a miss.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Cache operation failed: {0}")]
    OperationFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
