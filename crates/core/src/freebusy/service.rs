//! Free/busy aggregation with read-through caching.
//!
//! The service fans out to every linked calendar account on a profile,
//! merges the per-account results into one account-scoped schedule, and
//! memoizes the merged result in the cache. Accounts are independent: a
//! slow or failing account is skipped and logged, never fatal to the
//! aggregation, since partial availability data is still useful.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future;

use crate::cache::{deserialize_schedule, free_busy_key, serialize_schedule, Cache};
use crate::group::{CredentialKey, UserProfile};

use super::error::{FreeBusyError, ProviderError};
use super::traits::CalendarProvider;
use super::types::{composite_calendar_id, BusyInterval, FreeBusySchedule, RawBusyInterval};

/// Default TTL for cached free/busy results: 24 hours.
pub const DEFAULT_FREE_BUSY_TTL: Duration = Duration::from_secs(86_400);

/// Free/busy aggregation service.
///
/// Generic over the provider and cache so tests can inject mocks and the
/// process wires concrete backends at startup. Holds no per-request state.
pub struct FreeBusyService<P, C>
where
    P: CalendarProvider,
    C: Cache,
{
    provider: Arc<P>,
    cache: Arc<C>,
    ttl: Duration,
}

impl<P, C> FreeBusyService<P, C>
where
    P: CalendarProvider,
    C: Cache,
{
    /// Creates a service with the default 24h TTL.
    pub fn new(provider: Arc<P>, cache: Arc<C>) -> Self {
        Self::with_ttl(provider, cache, DEFAULT_FREE_BUSY_TTL)
    }

    /// Creates a service with an explicit cache TTL.
    pub fn with_ttl(provider: Arc<P>, cache: Arc<C>, ttl: Duration) -> Self {
        Self {
            provider,
            cache,
            ttl,
        }
    }

    /// Returns the merged busy intervals for every calendar linked to the
    /// profile, keyed by account-scoped composite calendar id.
    ///
    /// Window bounds are opaque strings: they are validated for
    /// non-emptiness only and passed through to the provider unmodified.
    /// A cache hit is returned verbatim with no merge against fresh data.
    pub async fn get_free_busy(
        &self,
        profile: &UserProfile,
        window_start: &str,
        window_end: &str,
    ) -> Result<FreeBusySchedule, FreeBusyError> {
        if window_start.trim().is_empty() {
            return Err(FreeBusyError::EmptyWindowBound {
                field: "window_start",
            });
        }
        if window_end.trim().is_empty() {
            return Err(FreeBusyError::EmptyWindowBound {
                field: "window_end",
            });
        }

        let cache_key = free_busy_key(&profile.auth_sub, window_start, window_end);

        // Cache errors are treated as misses; correctness never depends on
        // the cache being available.
        if let Ok(Some(bytes)) = self.cache.get(&cache_key).await {
            match deserialize_schedule(&bytes) {
                Ok(schedule) => {
                    tracing::trace!(auth_sub = %profile.auth_sub, "Free/busy cache hit");
                    return Ok(schedule);
                }
                Err(err) => {
                    tracing::warn!(
                        auth_sub = %profile.auth_sub,
                        error = %err,
                        "Cached free/busy payload unreadable, refetching"
                    );
                }
            }
        }

        tracing::trace!(auth_sub = %profile.auth_sub, "Free/busy cache miss");

        let fetches = profile.credentials.iter().map(|(key, credential)| {
            self.fetch_account(key, credential, window_start, window_end)
        });
        let results = future::join_all(fetches).await;

        let mut schedule = FreeBusySchedule::new();
        for (key, result) in profile.credentials.keys().zip(results) {
            match result {
                Ok(per_calendar) => {
                    for (calendar_id, intervals) in per_calendar {
                        schedule.insert(composite_calendar_id(key, &calendar_id), intervals);
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        auth_sub = %profile.auth_sub,
                        account = %key,
                        error = %err,
                        "Skipping calendar account in free/busy aggregation"
                    );
                }
            }
        }

        match serialize_schedule(&schedule) {
            Ok(bytes) => {
                if let Err(err) = self.cache.set(&cache_key, &bytes, Some(self.ttl)).await {
                    tracing::warn!(
                        auth_sub = %profile.auth_sub,
                        error = %err,
                        "Failed to cache free/busy result"
                    );
                }
            }
            Err(err) => {
                tracing::warn!(auth_sub = %profile.auth_sub, error = %err, "Failed to serialize free/busy result");
            }
        }

        Ok(schedule)
    }

    /// Fetches and validates one account's busy intervals: calendar list
    /// first, then one batched free/busy query for all its calendars.
    /// Intervals missing a bound are discarded here.
    async fn fetch_account(
        &self,
        key: &CredentialKey,
        credential: &str,
        window_start: &str,
        window_end: &str,
    ) -> Result<Vec<(String, Vec<BusyInterval>)>, ProviderError> {
        let calendar_ids = self.provider.list_calendars(key, credential).await?;
        if calendar_ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw = self
            .provider
            .query_free_busy(key, credential, &calendar_ids, window_start, window_end)
            .await?;

        Ok(raw
            .into_iter()
            .map(|(calendar_id, intervals)| {
                let intervals = intervals
                    .into_iter()
                    .filter_map(RawBusyInterval::into_interval)
                    .collect();
                (calendar_id, intervals)
            })
            .collect())
    }
}
