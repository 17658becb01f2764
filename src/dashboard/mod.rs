//! Dashboard Session
//!
//! Wires the synchronization core together around one ordered event queue.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   PollResolved    ┌───────────────────────────────┐
//! │ RefreshScheduler │──────────────────►│           Dashboard           │
//! └──────────────────┘                   │  Reconciler ─► SnapshotStore  │
//!          ▲  request_full_poll          │       │                       │
//!          └─────────────────────────────│       ▼                       │
//! ┌──────────────────┐   Push(..)        │  ViewProjector ─► Renderers   │
//! │  WsPushTransport │──────────────────►│  ChannelState ─► StatusSink   │
//! └──────────────────┘                   └───────────────────────────────┘
//! ```

mod session;
mod status;

pub use session::{Dashboard, DashboardConfig, DashboardHandle, Directive};
pub use status::{Severity, StatusNotice, StatusSink};
