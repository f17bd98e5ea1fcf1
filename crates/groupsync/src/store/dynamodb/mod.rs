//! DynamoDB entity store.
//!
//! Groups and profiles live in two tables; the invite-code lookup goes
//! through a GSI on the groups table. Multi-key atomicity comes from
//! `TransactWriteItems`, with every operation carrying an
//! `attribute_exists`/`attribute_not_exists` condition.

mod conversions;
mod error;
mod keys;
mod store;

pub use store::DynamoDbStore;
