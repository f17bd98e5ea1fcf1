use thiserror::Error;

/// Errors from an external calendar provider, scoped to one account.
///
/// These never fail the overall aggregation; the fan-out logs and skips
/// the account.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider does not serve account: {key}")]
    UnsupportedAccount { key: String },
    #[error("Upstream request failed: {0}")]
    RequestFailed(String),
    #[error("Upstream returned status {status}: {message}")]
    UpstreamStatus { status: u16, message: String },
    #[error("Upstream response malformed: {0}")]
    MalformedResponse(String),
}

/// Errors surfaced by the free/busy aggregation itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FreeBusyError {
    #[error("{field} must not be empty")]
    EmptyWindowBound { field: &'static str },
}
