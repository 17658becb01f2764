//! Refresh Scheduling
//!
//! - **channel**: push channel connection state and its transitions
//! - **refresh**: the polling loop, the `TopicSource` seam it fetches
//!   through, and the handle that owns its timer

mod channel;
mod refresh;

pub use channel::{ChannelState, ChannelTransition};
pub use refresh::{RefreshScheduler, SchedulerConfig, SchedulerHandle, TopicSource};
