//! Core domain logic for groupsync.
//!
//! This crate is backend-agnostic: it defines the domain types, the
//! `EntityStore`/`Cache`/`CalendarProvider` traits, and the services that
//! implement the membership consistency protocol and the free/busy
//! aggregation on top of those traits. Concrete backends (DynamoDB, Redis,
//! Google Calendar) live in the `groupsync` crate.

pub mod cache;
pub mod freebusy;
pub mod group;
pub mod membership;
pub mod profile;
pub mod store;
