//! # Pulsewatch
//!
//! Dashboard synchronization core for a social-media monitoring UI.
//! Reconciles live push events and periodic full-refresh polls into one
//! consistent per-topic view model, independent of any rendering toolkit.
//!
//! ## Features
//!
//! - **Staleness-aware merging**: a slow poll never overwrites a newer push
//! - **Derived merges**: recent articles are de-duplicated, ordered and capped
//! - **Redraw suppression**: render instructions are diffed by value
//! - **Resilient push channel**: WebSocket client with exponential backoff
//!   and an immediate backfill poll on every reconnect
//!
//! ## Modules
//!
//! - [`model`]: topics, snapshots and typed payloads
//! - [`store`]: the per-topic snapshot store
//! - [`reconcile`]: poll/push reconciliation and the articles merge
//! - [`scheduler`]: full-poll scheduling and push channel state
//! - [`projector`]: snapshot to render-instruction projection
//! - [`dashboard`]: the session event loop tying it together
//! - [`api`]: HTTP client for the data API
//! - [`push`]: push event decoding and the WebSocket transport
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pulsewatch::api::{ApiClientConfig, DashboardApiClient};
//! use pulsewatch::clock::SystemClock;
//! use pulsewatch::dashboard::{Dashboard, DashboardConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = Arc::new(DashboardApiClient::new(ApiClientConfig::default())?);
//!     let dashboard = Dashboard::new(DashboardConfig::default(), Arc::new(SystemClock));
//!
//!     // Polls every topic now and every 30 seconds after
//!     let handle = dashboard.launch(api);
//!
//!     tokio::signal::ctrl_c().await?;
//!     let dashboard = handle.teardown().await?;
//!     println!("Tracked {} topics", dashboard.store().len());
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod event;
pub mod model;
pub mod projector;
pub mod push;
pub mod reconcile;
pub mod scheduler;
pub mod store;

// Re-export top-level types for convenience
pub use model::{Article, Snapshot, Source, Topic, TopicPayload};

pub use store::{Origin, SnapshotStore};

pub use reconcile::{merge_articles, ReconcileOutcome, Reconciler, ReconcilerConfig};

pub use scheduler::{
    ChannelState, ChannelTransition, RefreshScheduler, SchedulerConfig, SchedulerHandle,
    TopicSource,
};

pub use projector::{ProjectorConfig, RenderInstruction, Renderer, ViewProjector};

pub use dashboard::{Dashboard, DashboardConfig, DashboardHandle, StatusNotice, StatusSink};

pub use api::{ApiClientConfig, DashboardApiClient};

pub use push::{PushMessage, PushTransportConfig, WsPushTransport};

pub use event::DashboardEvent;

pub use error::{ChannelError, DecodeError, SyncError, SyncResult, TransportError};

pub use config::{Config, ConfigError};
