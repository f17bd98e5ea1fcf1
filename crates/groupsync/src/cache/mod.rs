//! Cache backend implementations.
//!
//! Backends implement the `Cache` trait from `groupsync_core::cache`. Both
//! track live free/busy keys per user so prefix invalidation never needs a
//! keyspace scan.

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "redis")]
pub mod redis_impl;

#[cfg(feature = "memory")]
pub use memory::MemoryCache;

#[cfg(feature = "redis")]
pub use redis_impl::RedisCache;
