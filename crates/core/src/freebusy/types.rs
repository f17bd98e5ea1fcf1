use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::group::CredentialKey;

/// Merged free/busy result: busy intervals per composite calendar id.
///
/// A `BTreeMap` keeps the mapping deterministically ordered, so a cached
/// result round-trips bit-identically.
pub type FreeBusySchedule = BTreeMap<String, Vec<BusyInterval>>;

/// One busy interval with both bounds present.
///
/// Bounds are opaque timestamp strings passed through from the upstream
/// provider unmodified; this service neither parses nor normalizes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: String,
    pub end: String,
}

/// A busy interval as reported by a provider, before validation.
/// Upstream data can be missing either bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBusyInterval {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl RawBusyInterval {
    /// Converts to a validated interval, discarding intervals that are
    /// missing a bound.
    pub fn into_interval(self) -> Option<BusyInterval> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(BusyInterval { start, end }),
            _ => None,
        }
    }
}

/// Builds the account-scoped composite id for one calendar. Scoping by the
/// credential key keeps identically-named calendars in different accounts
/// from colliding in the merged schedule.
pub fn composite_calendar_id(key: &CredentialKey, calendar_id: &str) -> String {
    format!("{key}/{calendar_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_interval_with_both_bounds() {
        let raw = RawBusyInterval {
            start: Some("2024-01-01T09:00:00Z".to_string()),
            end: Some("2024-01-01T10:00:00Z".to_string()),
        };
        let interval = raw.into_interval().unwrap();
        assert_eq!(interval.start, "2024-01-01T09:00:00Z");
        assert_eq!(interval.end, "2024-01-01T10:00:00Z");
    }

    #[test]
    fn test_raw_interval_missing_a_bound_is_discarded() {
        assert!(RawBusyInterval {
            start: Some("2024-01-01T09:00:00Z".to_string()),
            end: None,
        }
        .into_interval()
        .is_none());
        assert!(RawBusyInterval {
            start: None,
            end: Some("2024-01-01T10:00:00Z".to_string()),
        }
        .into_interval()
        .is_none());
        assert!(RawBusyInterval::default().into_interval().is_none());
    }

    #[test]
    fn test_composite_id_is_account_scoped() {
        let a = CredentialKey::Google("a@b.c".to_string());
        let b = CredentialKey::Google("x@y.z".to_string());
        assert_ne!(
            composite_calendar_id(&a, "primary"),
            composite_calendar_id(&b, "primary")
        );
        assert_eq!(composite_calendar_id(&a, "primary"), "google#a@b.c/primary");
    }
}
