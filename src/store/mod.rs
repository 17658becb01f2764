//! Snapshot storage
//!
//! Holds the latest known value for each topic and enforces the
//! push-over-stale-poll ordering rule.

mod snapshot_store;

pub use snapshot_store::{Origin, SnapshotStore};
