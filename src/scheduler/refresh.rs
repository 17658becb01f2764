//! Refresh Scheduler
//!
//! Drives full polls across every topic: once on start, then on a fixed
//! interval, plus on demand for backfill. Each topic's fetch runs as its own
//! task and reports back through the session event queue; a failed fetch
//! only affects its own topic.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::channel::ChannelState;
use crate::clock::Clock;
use crate::error::TransportError;
use crate::event::{DashboardEvent, EventSender};
use crate::model::Topic;

/// Shortest interval the scheduler will run with
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Anything that can fetch the current payload for a topic
#[async_trait]
pub trait TopicSource: Send + Sync {
    async fn fetch(&self, topic: Topic) -> Result<Value, TransportError>;
}

/// Polling policy
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub poll_interval: Duration,
    /// Keep interval polling while the push channel is connected
    pub poll_while_connected: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            poll_while_connected: true,
        }
    }
}

/// Why a full poll was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollReason {
    Startup,
    Interval,
    Backfill,
}

/// Spawns and owns the polling loop
pub struct RefreshScheduler {
    config: SchedulerConfig,
    source: Arc<dyn TopicSource>,
    clock: Arc<dyn Clock>,
    channel: watch::Receiver<ChannelState>,
    events: EventSender,
}

impl RefreshScheduler {
    pub fn new(
        config: SchedulerConfig,
        source: Arc<dyn TopicSource>,
        clock: Arc<dyn Clock>,
        channel: watch::Receiver<ChannelState>,
        events: EventSender,
    ) -> Self {
        let mut config = config;
        if config.poll_interval < MIN_POLL_INTERVAL {
            tracing::warn!(
                requested_ms = config.poll_interval.as_millis() as u64,
                "Poll interval too short, using {:?}",
                MIN_POLL_INTERVAL
            );
            config.poll_interval = MIN_POLL_INTERVAL;
        }

        Self {
            config,
            source,
            clock,
            channel,
            events,
        }
    }

    /// Start the polling loop; the first full poll is issued immediately
    pub fn start(self) -> SchedulerHandle {
        let cancel = CancellationToken::new();
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(cancel.clone(), requests_rx));

        SchedulerHandle {
            cancel,
            requests: requests_tx,
            task: Some(task),
        }
    }

    async fn run(self, cancel: CancellationToken, mut requests: mpsc::UnboundedReceiver<()>) {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight: JoinSet<()> = JoinSet::new();
        let mut started = false;

        tracing::info!(
            interval_secs = self.config.poll_interval.as_secs(),
            poll_while_connected = self.config.poll_while_connected,
            "Refresh scheduler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                _ = interval.tick() => {
                    if !started {
                        started = true;
                        self.poll_all(&mut in_flight, PollReason::Startup);
                    } else if self.config.poll_while_connected || !self.channel.borrow().connected {
                        self.poll_all(&mut in_flight, PollReason::Interval);
                    } else {
                        tracing::trace!("Skipping interval poll, push channel healthy");
                    }
                }

                Some(()) = requests.recv() => {
                    self.poll_all(&mut in_flight, PollReason::Backfill);
                }

                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::error!(error = %e, "Poll task panicked");
                        }
                    }
                }
            }
        }

        let aborted = in_flight.len();
        in_flight.shutdown().await;
        tracing::info!(aborted, "Refresh scheduler stopped");
    }

    fn poll_all(&self, in_flight: &mut JoinSet<()>, reason: PollReason) {
        tracing::debug!(reason = ?reason, "Issuing full poll");

        for topic in Topic::ALL {
            let source = self.source.clone();
            let events = self.events.clone();
            let issued_at = self.clock.now();

            in_flight.spawn(async move {
                let result = source.fetch(topic).await;
                // The session may already be gone
                let _ = events.send(DashboardEvent::PollResolved {
                    topic,
                    issued_at,
                    result,
                });
            });
        }
    }
}

/// Handle to a running scheduler
///
/// Dropping the handle cancels the loop and any in-flight fetches.
pub struct SchedulerHandle {
    cancel: CancellationToken,
    requests: mpsc::UnboundedSender<()>,
    task: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Ask for an immediate full poll across all topics
    pub fn request_full_poll(&self) -> bool {
        self.requests.send(()).is_ok()
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
            && self
                .task
                .as_ref()
                .map(|task| !task.is_finished())
                .unwrap_or(false)
    }

    /// Cancel the loop and wait for in-flight fetches to be aborted
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Scheduler task ended abnormally");
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
