//! Update Reconciler
//!
//! Entry point for every update, poll or push. Decodes the payload against
//! its topic, applies topic-specific merging, writes through the staleness
//! rule and queues a view refresh for topics that changed.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

use super::articles::merge_articles;
use crate::clock::Clock;
use crate::model::{Topic, TopicPayload};
use crate::store::{Origin, SnapshotStore};

/// Configuration for merge behavior
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Maximum number of recent articles retained
    pub articles_limit: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self { articles_limit: 10 }
    }
}

/// What happened to an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Written to the store; a refresh was queued
    Applied,
    /// Rejected by the staleness rule
    Stale,
    /// Payload did not decode for its topic
    Dropped,
}

/// Merges poll results and push events into the snapshot store
pub struct Reconciler {
    store: SnapshotStore,
    config: ReconcilerConfig,
    clock: Arc<dyn Clock>,
    /// Topics awaiting a view refresh, in the order they changed
    pending: VecDeque<Topic>,
}

impl Reconciler {
    pub fn new(config: ReconcilerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: SnapshotStore::new(),
            config,
            clock,
            pending: VecDeque::new(),
        }
    }

    /// Handle the response to a poll issued at `issued_at`
    pub fn on_poll_result(
        &mut self,
        topic: Topic,
        issued_at: DateTime<Utc>,
        payload: Value,
    ) -> ReconcileOutcome {
        self.apply(topic, payload, Origin::Poll { issued_at })
    }

    /// Handle a push event for `topic`
    pub fn on_push_event(&mut self, topic: Topic, payload: Value) -> ReconcileOutcome {
        self.apply(topic, payload, Origin::Push)
    }

    fn apply(&mut self, topic: Topic, payload: Value, origin: Origin) -> ReconcileOutcome {
        let decoded = match TopicPayload::decode(topic, payload) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!(topic = %topic, source = ?origin.source(), error = %e, "Dropping undecodable payload");
                return ReconcileOutcome::Dropped;
            }
        };

        let merged = self.merge(decoded);
        let received_at = self.clock.now();

        if self.store.write(topic, merged, origin, received_at) {
            if !self.pending.contains(&topic) {
                self.pending.push_back(topic);
            }
            tracing::trace!(topic = %topic, source = ?origin.source(), "Snapshot updated");
            ReconcileOutcome::Applied
        } else {
            ReconcileOutcome::Stale
        }
    }

    /// Apply derived merges; everything except articles is a full replace
    fn merge(&self, incoming: TopicPayload) -> TopicPayload {
        match incoming {
            TopicPayload::Articles(incoming) => {
                let existing = match self.store.read(Topic::Articles).map(|s| &s.payload) {
                    Some(TopicPayload::Articles(existing)) => existing.as_slice(),
                    _ => &[],
                };
                TopicPayload::Articles(merge_articles(
                    existing,
                    incoming,
                    self.config.articles_limit,
                ))
            }
            other => other,
        }
    }

    /// Take the queued refreshes
    pub fn drain_refreshes(&mut self) -> Vec<Topic> {
        self.pending.drain(..).collect()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::model::Source;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn setup() -> (Reconciler, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        let reconciler = Reconciler::new(ReconcilerConfig::default(), Arc::new(clock.clone()));
        (reconciler, clock)
    }

    fn total_articles(reconciler: &Reconciler) -> u64 {
        match &reconciler.store().read(Topic::Stats).unwrap().payload {
            TopicPayload::Stats(s) => s.total_articles,
            other => panic!("Expected Stats, got {:?}", other),
        }
    }

    #[test]
    fn test_poll_result_applies_and_queues_refresh() {
        let (mut reconciler, clock) = setup();
        let issued_at = clock.now();

        let outcome = reconciler.on_poll_result(
            Topic::Stats,
            issued_at,
            json!({"total_articles": 120, "total_comments": 340}),
        );

        assert_eq!(outcome, ReconcileOutcome::Applied);
        assert_eq!(total_articles(&reconciler), 120);
        assert_eq!(reconciler.drain_refreshes(), vec![Topic::Stats]);
        assert!(reconciler.drain_refreshes().is_empty());
    }

    #[test]
    fn test_stats_scenario_push_beats_stale_poll() {
        let (mut reconciler, clock) = setup();

        let first_poll = clock.now();
        reconciler.on_poll_result(
            Topic::Stats,
            first_poll,
            json!({"total_articles": 120, "total_comments": 340}),
        );

        // A second poll goes out, then a push lands before it resolves
        clock.advance(Duration::seconds(30));
        let slow_poll = clock.now();
        clock.advance(Duration::seconds(1));
        let pushed =
            reconciler.on_push_event(Topic::Stats, json!({"total_articles": 125, "total_comments": 341}));
        assert_eq!(pushed, ReconcileOutcome::Applied);
        assert_eq!(total_articles(&reconciler), 125);

        clock.advance(Duration::seconds(1));
        let stale = reconciler.on_poll_result(
            Topic::Stats,
            slow_poll,
            json!({"total_articles": 121, "total_comments": 340}),
        );

        assert_eq!(stale, ReconcileOutcome::Stale);
        assert_eq!(total_articles(&reconciler), 125);
        assert_eq!(
            reconciler.store().read(Topic::Stats).unwrap().source,
            Source::Push
        );
    }

    #[test]
    fn test_undecodable_payload_dropped() {
        let (mut reconciler, _clock) = setup();

        let outcome = reconciler.on_push_event(Topic::Keywords, json!("not a list"));

        assert_eq!(outcome, ReconcileOutcome::Dropped);
        assert!(reconciler.store().read(Topic::Keywords).is_none());
        assert!(reconciler.drain_refreshes().is_empty());
    }

    #[test]
    fn test_articles_are_merged() {
        let (mut reconciler, clock) = setup();
        reconciler.on_poll_result(
            Topic::Articles,
            clock.now(),
            json!([
                {"id": "A", "title": "a", "created_at": "2024-05-01 11:00:00"},
                {"id": "B", "title": "b", "created_at": "2024-05-01 11:30:00"}
            ]),
        );
        reconciler.on_push_event(
            Topic::Articles,
            json!([{"id": "C", "title": "c", "created_at": "2024-05-01 11:45:00"}]),
        );

        match &reconciler.store().read(Topic::Articles).unwrap().payload {
            TopicPayload::Articles(articles) => {
                let ids: Vec<_> = articles.iter().map(|a| a.id.as_str()).collect();
                assert_eq!(ids, vec!["C", "B", "A"]);
            }
            other => panic!("Expected Articles, got {:?}", other),
        }
    }

    #[test]
    fn test_articles_capped_at_limit() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        let mut reconciler =
            Reconciler::new(ReconcilerConfig { articles_limit: 2 }, Arc::new(clock.clone()));

        reconciler.on_push_event(
            Topic::Articles,
            json!([
                {"id": "1", "created_at": "2024-05-01 10:00:00"},
                {"id": "2", "created_at": "2024-05-01 10:01:00"},
                {"id": "3", "created_at": "2024-05-01 10:02:00"}
            ]),
        );

        match &reconciler.store().read(Topic::Articles).unwrap().payload {
            TopicPayload::Articles(articles) => assert_eq!(articles.len(), 2),
            other => panic!("Expected Articles, got {:?}", other),
        }
    }

    #[test]
    fn test_keywords_fully_replaced() {
        let (mut reconciler, clock) = setup();
        reconciler.on_poll_result(
            Topic::Keywords,
            clock.now(),
            json!([{"keyword": "rust", "count": 3}, {"keyword": "tokio", "count": 2}]),
        );
        reconciler.on_push_event(Topic::Keywords, json!([{"keyword": "serde", "count": 9}]));

        match &reconciler.store().read(Topic::Keywords).unwrap().payload {
            TopicPayload::Keywords(keywords) => {
                assert_eq!(keywords.len(), 1);
                assert_eq!(keywords[0].keyword, "serde");
            }
            other => panic!("Expected Keywords, got {:?}", other),
        }
    }

    #[test]
    fn test_refresh_queue_dedupes() {
        let (mut reconciler, _clock) = setup();
        reconciler.on_push_event(Topic::Stats, json!({"total_articles": 1}));
        reconciler.on_push_event(Topic::Keywords, json!([]));
        reconciler.on_push_event(Topic::Stats, json!({"total_articles": 2}));

        assert_eq!(
            reconciler.drain_refreshes(),
            vec![Topic::Stats, Topic::Keywords]
        );
    }
}
