use std::collections::HashMap;

use async_trait::async_trait;

use crate::group::CredentialKey;

use super::error::ProviderError;
use super::types::RawBusyInterval;

/// External calendar provider for one or more account kinds.
///
/// Credentials are opaque, account-scoped payloads; refresh is handled
/// out-of-band by the excluded OAuth flow. A provider may refuse an
/// account kind it does not serve with
/// [`ProviderError::UnsupportedAccount`]; the aggregation treats that as
/// a skipped account, not a failure of the whole query.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Lists the calendar ids visible to this account.
    async fn list_calendars(
        &self,
        key: &CredentialKey,
        credential: &str,
    ) -> Result<Vec<String>, ProviderError>;

    /// Queries busy intervals for all given calendars over the window in
    /// one batched upstream call. Window bounds are opaque strings passed
    /// through unmodified.
    async fn query_free_busy(
        &self,
        key: &CredentialKey,
        credential: &str,
        calendar_ids: &[String],
        window_start: &str,
        window_end: &str,
    ) -> Result<HashMap<String, Vec<RawBusyInterval>>, ProviderError>;
}
