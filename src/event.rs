//! Session event queue
//!
//! Every input to a dashboard session, poll results and push traffic alike,
//! arrives as a [`DashboardEvent`] on a single unbounded channel consumed by
//! one task.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::model::Topic;
use crate::push::PushMessage;

/// One input to the session event loop
#[derive(Debug)]
pub enum DashboardEvent {
    /// A scheduled or backfill poll for `topic` finished
    PollResolved {
        topic: Topic,
        issued_at: DateTime<Utc>,
        result: Result<Value, TransportError>,
    },
    /// Traffic from the push transport
    Push(PushMessage),
    /// Stop the session; anything queued after this is discarded
    Teardown,
}

pub type EventSender = mpsc::UnboundedSender<DashboardEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<DashboardEvent>;

/// Create the session event queue
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
