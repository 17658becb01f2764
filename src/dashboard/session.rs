//! Dashboard Session
//!
//! The single consumer of the session event queue. Owns the reconciler
//! (and through it the snapshot store), the view projector, the push
//! channel state and the status sink. Nothing else mutates them.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use uuid::Uuid;

use super::status::{StatusNotice, StatusSink};
use crate::clock::Clock;
use crate::error::{SyncError, SyncResult};
use crate::event::{self, DashboardEvent, EventReceiver, EventSender};
use crate::model::Topic;
use crate::projector::{ProjectorConfig, Renderer, ViewProjector};
use crate::push::PushMessage;
use crate::reconcile::{Reconciler, ReconcilerConfig};
use crate::scheduler::{
    ChannelState, ChannelTransition, RefreshScheduler, SchedulerConfig, SchedulerHandle,
    TopicSource,
};
use crate::store::SnapshotStore;

/// Everything a session needs to know up front
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub reconciler: ReconcilerConfig,
    pub projector: ProjectorConfig,
    pub scheduler: SchedulerConfig,
    /// How long a status notice stays up
    pub status_dismiss: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            reconciler: ReconcilerConfig::default(),
            projector: ProjectorConfig::default(),
            scheduler: SchedulerConfig::default(),
            status_dismiss: Duration::from_millis(3000),
        }
    }
}

/// Side effects requested by [`Dashboard::handle`] that need the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Issue an immediate full poll
    Backfill,
    /// A notice went up; arm the dismiss deadline
    NoticeShown,
    /// Session torn down; stop the scheduler and exit
    Stop,
}

/// One dashboard session
pub struct Dashboard {
    id: Uuid,
    config: DashboardConfig,
    clock: Arc<dyn Clock>,
    reconciler: Reconciler,
    projector: ViewProjector,
    channel: watch::Sender<ChannelState>,
    status: Option<Box<dyn StatusSink>>,
    notice: Option<StatusNotice>,
    torn_down: bool,
}

impl Dashboard {
    pub fn new(config: DashboardConfig, clock: Arc<dyn Clock>) -> Self {
        let (channel, _) = watch::channel(ChannelState::default());

        Self {
            id: Uuid::new_v4(),
            reconciler: Reconciler::new(config.reconciler.clone(), clock.clone()),
            projector: ViewProjector::new(config.projector.clone()),
            config,
            clock,
            channel,
            status: None,
            notice: None,
            torn_down: false,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.id
    }

    pub fn register_renderer(&mut self, topic: Topic, renderer: Box<dyn Renderer>) {
        self.projector.register(topic, renderer);
    }

    pub fn set_status_sink(&mut self, sink: Box<dyn StatusSink>) {
        self.status = Some(sink);
    }

    /// Watch the push channel state (read by the scheduler)
    pub fn subscribe_channel(&self) -> watch::Receiver<ChannelState> {
        self.channel.subscribe()
    }

    pub fn channel_state(&self) -> ChannelState {
        *self.channel.borrow()
    }

    pub fn store(&self) -> &SnapshotStore {
        self.reconciler.store()
    }

    pub fn projector(&self) -> &ViewProjector {
        &self.projector
    }

    pub fn active_notice(&self) -> Option<&StatusNotice> {
        self.notice.as_ref()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Apply one event and report what the runtime must do next
    pub fn handle(&mut self, event: DashboardEvent) -> Vec<Directive> {
        if self.torn_down {
            tracing::trace!(session = %self.id, event = ?event, "Discarding event after teardown");
            return Vec::new();
        }

        match event {
            DashboardEvent::PollResolved {
                topic,
                issued_at,
                result,
            } => {
                match result {
                    Ok(payload) => {
                        self.reconciler.on_poll_result(topic, issued_at, payload);
                    }
                    Err(e) => {
                        tracing::warn!(session = %self.id, topic = %topic, error = %e, "Poll failed, keeping last snapshot");
                    }
                }
                self.flush_refreshes();
                Vec::new()
            }

            DashboardEvent::Push(PushMessage::Connect) => {
                let now = self.clock.now();
                if self.transition(|state| state.on_connect(now)) != ChannelTransition::Connected {
                    return Vec::new();
                }
                tracing::info!(session = %self.id, "Push channel connected, backfilling");
                self.show_notice(StatusNotice::connected(now));
                vec![Directive::Backfill, Directive::NoticeShown]
            }

            DashboardEvent::Push(PushMessage::Disconnect { reason }) => {
                let now = self.clock.now();
                if self.transition(|state| state.on_disconnect(now))
                    != ChannelTransition::Disconnected
                {
                    return Vec::new();
                }
                tracing::info!(session = %self.id, reason = ?reason, "Push channel disconnected");
                self.show_notice(StatusNotice::disconnected(reason.as_deref(), now));
                vec![Directive::NoticeShown]
            }

            DashboardEvent::Push(PushMessage::Status(data)) => {
                tracing::debug!(session = %self.id, status = %data, "Server status frame");
                Vec::new()
            }

            DashboardEvent::Push(PushMessage::Update { topic, payload }) => {
                let now = self.clock.now();
                self.channel.send_if_modified(|state| {
                    state.on_event(now);
                    false
                });
                self.reconciler.on_push_event(topic, payload);
                self.flush_refreshes();
                Vec::new()
            }

            DashboardEvent::Teardown => {
                tracing::info!(session = %self.id, topics = self.store().len(), "Dashboard torn down");
                self.torn_down = true;
                vec![Directive::Stop]
            }
        }
    }

    /// Take down the current notice, if any
    pub fn dismiss_notice(&mut self) {
        if self.notice.take().is_some() {
            if let Some(sink) = self.status.as_mut() {
                sink.dismiss();
            }
        }
    }

    fn transition(
        &mut self,
        apply: impl FnOnce(&mut ChannelState) -> ChannelTransition,
    ) -> ChannelTransition {
        let mut transition = ChannelTransition::Unchanged;
        self.channel.send_if_modified(|state| {
            transition = apply(state);
            transition != ChannelTransition::Unchanged
        });
        transition
    }

    fn show_notice(&mut self, notice: StatusNotice) {
        if let Some(sink) = self.status.as_mut() {
            sink.show(&notice);
        }
        self.notice = Some(notice);
    }

    fn flush_refreshes(&mut self) {
        for topic in self.reconciler.drain_refreshes() {
            self.projector.refresh(topic, self.reconciler.store());
        }
    }

    /// Consume events until teardown or until every sender is gone
    pub async fn run(
        mut self,
        mut events: EventReceiver,
        mut scheduler: Option<SchedulerHandle>,
    ) -> Self {
        tracing::info!(session = %self.id, "Dashboard session started");
        let mut dismiss_at: Option<Instant> = None;

        loop {
            let event = tokio::select! {
                event = events.recv() => event,
                _ = tokio::time::sleep_until(dismiss_at.unwrap_or_else(Instant::now)), if dismiss_at.is_some() => {
                    dismiss_at = None;
                    self.dismiss_notice();
                    continue;
                }
            };

            let Some(event) = event else {
                tracing::debug!(session = %self.id, "Event queue closed");
                break;
            };

            for directive in self.handle(event) {
                match directive {
                    Directive::Backfill => {
                        if let Some(scheduler) = scheduler.as_ref() {
                            scheduler.request_full_poll();
                        }
                    }
                    Directive::NoticeShown => {
                        dismiss_at = Some(Instant::now() + self.config.status_dismiss);
                    }
                    Directive::Stop => {}
                }
            }

            if self.torn_down {
                break;
            }
        }

        if let Some(scheduler) = scheduler.take() {
            scheduler.stop().await;
        }
        self.torn_down = true;

        // Anything still queued is dropped unapplied
        events.close();
        while let Ok(event) = events.try_recv() {
            self.handle(event);
        }

        self
    }

    /// Start the scheduler and the event loop on the current runtime
    pub fn launch(self, source: Arc<dyn TopicSource>) -> DashboardHandle {
        let (sender, receiver) = event::channel();

        let scheduler = RefreshScheduler::new(
            self.config.scheduler.clone(),
            source,
            self.clock.clone(),
            self.subscribe_channel(),
            sender.clone(),
        )
        .start();

        let task = tokio::spawn(self.run(receiver, Some(scheduler)));
        DashboardHandle { sender, task }
    }
}

/// Handle to a launched session
pub struct DashboardHandle {
    sender: EventSender,
    task: JoinHandle<Dashboard>,
}

impl DashboardHandle {
    /// Queue for transports to feed
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    pub fn push(&self, message: PushMessage) -> SyncResult<()> {
        self.sender
            .send(DashboardEvent::Push(message))
            .map_err(|_| SyncError::TornDown)
    }

    /// Tear the session down and get its final state back
    pub async fn teardown(self) -> Result<Dashboard, JoinError> {
        let _ = self.sender.send(DashboardEvent::Teardown);
        self.task.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, SystemClock};
    use crate::error::TransportError;
    use crate::model::TopicPayload;
    use crate::projector::RenderInstruction;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn dashboard() -> (Dashboard, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        let dash = Dashboard::new(DashboardConfig::default(), Arc::new(clock.clone()));
        (dash, clock)
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl StatusSink for RecordingSink {
        fn show(&mut self, notice: &StatusNotice) {
            self.log
                .lock()
                .unwrap()
                .push(format!("show:{}", notice.severity));
        }

        fn dismiss(&mut self) {
            self.log.lock().unwrap().push("dismiss".to_string());
        }
    }

    struct CountingRenderer {
        renders: Arc<AtomicUsize>,
    }

    impl Renderer for CountingRenderer {
        fn render(&mut self, _topic: Topic, _instruction: &RenderInstruction) {
            self.renders.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CountingSource {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl TopicSource for CountingSource {
        async fn fetch(&self, topic: Topic) -> Result<Value, TransportError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match topic {
                Topic::Stats => Ok(json!({"total_articles": 120, "total_comments": 340})),
                _ => Err(TransportError::Unavailable),
            }
        }
    }

    fn poll(topic: Topic, issued_at: chrono::DateTime<Utc>, value: Value) -> DashboardEvent {
        DashboardEvent::PollResolved {
            topic,
            issued_at,
            result: Ok(value),
        }
    }

    #[test]
    fn test_poll_and_push_render() {
        let (mut dash, clock) = dashboard();
        let renders = Arc::new(AtomicUsize::new(0));
        dash.register_renderer(
            Topic::Stats,
            Box::new(CountingRenderer {
                renders: renders.clone(),
            }),
        );

        dash.handle(poll(Topic::Stats, clock.now(), json!({"total_articles": 120})));
        dash.handle(DashboardEvent::Push(PushMessage::Update {
            topic: Topic::Stats,
            payload: json!({"total_articles": 125}),
        }));
        // Same value again: applied to the store but no redraw
        dash.handle(DashboardEvent::Push(PushMessage::Update {
            topic: Topic::Stats,
            payload: json!({"total_articles": 125}),
        }));

        assert_eq!(renders.load(Ordering::SeqCst), 2);
        match &dash.store().read(Topic::Stats).unwrap().payload {
            TopicPayload::Stats(s) => assert_eq!(s.total_articles, 125),
            other => panic!("Expected Stats, got {:?}", other),
        }
        assert!(dash.channel_state().last_event_at.is_some());
    }

    #[test]
    fn test_failed_poll_keeps_snapshot() {
        let (mut dash, clock) = dashboard();
        dash.handle(poll(Topic::Stats, clock.now(), json!({"total_articles": 120})));

        let directives = dash.handle(DashboardEvent::PollResolved {
            topic: Topic::Stats,
            issued_at: clock.now(),
            result: Err(TransportError::Timeout),
        });

        assert!(directives.is_empty());
        assert!(dash.active_notice().is_none());
        match &dash.store().read(Topic::Stats).unwrap().payload {
            TopicPayload::Stats(s) => assert_eq!(s.total_articles, 120),
            other => panic!("Expected Stats, got {:?}", other),
        }
    }

    #[test]
    fn test_reconnect_requests_one_backfill() {
        let (mut dash, _clock) = dashboard();
        let sink = RecordingSink::default();
        dash.set_status_sink(Box::new(sink.clone()));

        let connect = || DashboardEvent::Push(PushMessage::Connect);
        let disconnect = || DashboardEvent::Push(PushMessage::Disconnect { reason: None });

        assert_eq!(
            dash.handle(connect()),
            vec![Directive::Backfill, Directive::NoticeShown]
        );
        assert!(dash.handle(connect()).is_empty());

        assert_eq!(dash.handle(disconnect()), vec![Directive::NoticeShown]);
        assert!(dash.handle(disconnect()).is_empty());
        assert!(!dash.channel_state().connected);

        let backfills = dash
            .handle(connect())
            .into_iter()
            .filter(|d| *d == Directive::Backfill)
            .count();
        assert_eq!(backfills, 1);

        assert_eq!(
            *sink.log.lock().unwrap(),
            vec!["show:success", "show:warning", "show:success"]
        );
    }

    #[test]
    fn test_status_frame_ignored() {
        let (mut dash, _clock) = dashboard();
        let sink = RecordingSink::default();
        dash.set_status_sink(Box::new(sink.clone()));

        let directives = dash.handle(DashboardEvent::Push(PushMessage::Status(
            json!({"msg": "Connected to server"}),
        )));

        assert!(directives.is_empty());
        assert!(dash.store().is_empty());
        assert!(!dash.channel_state().connected);
        assert!(sink.log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_channel_state_published_to_watchers() {
        let (mut dash, _clock) = dashboard();
        let watcher = dash.subscribe_channel();

        dash.handle(DashboardEvent::Push(PushMessage::Connect));
        assert!(watcher.borrow().connected);

        dash.handle(DashboardEvent::Push(PushMessage::Disconnect { reason: None }));
        assert!(!watcher.borrow().connected);
    }

    #[test]
    fn test_teardown_discards_late_poll() {
        let (mut dash, clock) = dashboard();
        let issued_at = clock.now();

        assert_eq!(dash.handle(DashboardEvent::Teardown), vec![Directive::Stop]);

        clock.advance(chrono::Duration::seconds(2));
        let directives = dash.handle(poll(Topic::Stats, issued_at, json!({"total_articles": 120})));

        assert!(directives.is_empty());
        assert!(dash.store().read(Topic::Stats).is_none());
        assert!(dash.projector().last_rendered(Topic::Stats).is_none());
        assert!(dash.handle(DashboardEvent::Push(PushMessage::Connect)).is_empty());
        assert!(!dash.channel_state().connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_launch_polls_and_backfills() {
        let source = Arc::new(CountingSource {
            fetches: AtomicUsize::new(0),
        });
        let dash = Dashboard::new(DashboardConfig::default(), Arc::new(SystemClock));
        let handle = dash.launch(source.clone());
        let all = Topic::ALL.len();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), all);

        handle.push(PushMessage::Connect).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2 * all);

        handle
            .push(PushMessage::Disconnect { reason: None })
            .unwrap();
        handle.push(PushMessage::Connect).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 3 * all);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 4 * all);

        let dash = handle.teardown().await.unwrap();
        assert!(dash.is_torn_down());
        assert!(dash.store().read(Topic::Stats).is_some());
        assert!(dash.store().read(Topic::Keywords).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_notice_auto_dismissed() {
        let source = Arc::new(CountingSource {
            fetches: AtomicUsize::new(0),
        });
        let sink = RecordingSink::default();
        let mut dash = Dashboard::new(DashboardConfig::default(), Arc::new(SystemClock));
        dash.set_status_sink(Box::new(sink.clone()));
        let handle = dash.launch(source);

        handle.push(PushMessage::Connect).unwrap();
        tokio::time::sleep(Duration::from_millis(2900)).await;
        assert_eq!(*sink.log.lock().unwrap(), vec!["show:success"]);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*sink.log.lock().unwrap(), vec!["show:success", "dismiss"]);

        let dash = handle.teardown().await.unwrap();
        assert!(dash.active_notice().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_after_teardown_are_rejected() {
        let source = Arc::new(CountingSource {
            fetches: AtomicUsize::new(0),
        });
        let dash = Dashboard::new(DashboardConfig::default(), Arc::new(SystemClock));
        let handle = dash.launch(source.clone());
        let sender = handle.sender();

        let dash = handle.teardown().await.unwrap();
        let before = source.fetches.load(Ordering::SeqCst);

        // Late poll result arriving after the loop exited
        let late = sender.send(poll(Topic::Author, Utc::now(), json!({"top_authors": []})));
        assert!(late.is_err());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), before);
        assert!(dash.store().read(Topic::Author).is_none());
    }
}
