//! External calendar provider implementations.
//!
//! Providers implement the `CalendarProvider` trait from
//! `groupsync_core::freebusy`. Each backend serves the account kinds it
//! knows and refuses the rest, which the aggregation treats as a skipped
//! account.

#[cfg(feature = "google")]
pub mod google;

#[cfg(feature = "google")]
pub use google::GoogleCalendarProvider;
