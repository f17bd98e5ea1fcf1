//! Backend implementations for groupsync.
//!
//! The domain logic lives in `groupsync_core`; this crate provides the
//! concrete entity stores, cache backends, and calendar providers behind
//! cargo features, plus process configuration. Clients are constructed
//! once at process start and injected into the core services — there is
//! no ambient global state.

pub mod cache;
pub mod config;
pub mod provider;
pub mod store;
