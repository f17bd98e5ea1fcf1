use thiserror::Error;

/// Errors that can occur during entity store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    /// A multi-key transaction was aborted by a failed condition. `index`
    /// identifies the failing operation within the submitted batch when the
    /// backend reports it, letting the caller map the abort to a precise
    /// domain error.
    #[error("Transaction canceled by a failed condition")]
    TransactionCanceled { index: Option<usize> },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type for entity store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
