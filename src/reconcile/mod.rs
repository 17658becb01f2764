//! Update Reconciliation
//!
//! Merges poll results and push events into the snapshot store.
//!
//! ## Flow
//!
//! ```text
//! poll result / push event
//!   → decode against topic schema (drop + log on mismatch)
//!   → topic merge (articles: dedupe, newest first, cap)
//!   → SnapshotStore::write (staleness rule)
//!   → queue view refresh
//! ```

mod articles;
mod reconciler;

pub use articles::merge_articles;
pub use reconciler::{ReconcileOutcome, Reconciler, ReconcilerConfig};
