//! Snapshot Store
//!
//! One snapshot per topic, overwritten in place. Pushes are authoritative;
//! a poll is rejected when a push for the same topic arrived after the
//! poll was issued, so a slow poll response can never regress a widget.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::model::{Snapshot, Source, Topic, TopicPayload};

/// How a write reached the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Response to a poll issued at `issued_at`
    Poll { issued_at: DateTime<Utc> },
    /// Push event
    Push,
}

impl Origin {
    pub fn source(&self) -> Source {
        match self {
            Origin::Poll { .. } => Source::Poll,
            Origin::Push => Source::Push,
        }
    }
}

/// Latest known value per topic
#[derive(Debug, Default)]
pub struct SnapshotStore {
    snapshots: HashMap<Topic, Snapshot>,
    /// When the most recent push was received, per topic
    last_push: HashMap<Topic, DateTime<Utc>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a write unless the staleness rule rejects it
    ///
    /// Returns `true` when the snapshot for `topic` was replaced.
    pub fn write(
        &mut self,
        topic: Topic,
        payload: TopicPayload,
        origin: Origin,
        received_at: DateTime<Utc>,
    ) -> bool {
        if payload.topic() != topic {
            tracing::warn!(
                topic = %topic,
                payload_topic = %payload.topic(),
                "Rejecting write with mismatched payload"
            );
            return false;
        }

        match origin {
            Origin::Push => {
                self.last_push.insert(topic, received_at);
            }
            Origin::Poll { issued_at } => {
                if let Some(pushed_at) = self.last_push.get(&topic) {
                    if *pushed_at > issued_at {
                        tracing::debug!(
                            topic = %topic,
                            %issued_at,
                            %pushed_at,
                            "Dropping poll superseded by a newer push"
                        );
                        return false;
                    }
                }
            }
        }

        self.snapshots.insert(
            topic,
            Snapshot {
                topic,
                payload,
                received_at,
                source: origin.source(),
            },
        );
        true
    }

    pub fn read(&self, topic: Topic) -> Option<&Snapshot> {
        self.snapshots.get(&topic)
    }

    /// Topics that have a snapshot, in dashboard order
    pub fn topics(&self) -> Vec<Topic> {
        Topic::ALL
            .iter()
            .copied()
            .filter(|t| self.snapshots.contains_key(t))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StatsPayload;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn stats(total: u64) -> TopicPayload {
        TopicPayload::Stats(StatsPayload {
            total_articles: total,
            ..Default::default()
        })
    }

    fn total_articles(store: &SnapshotStore) -> u64 {
        match &store.read(Topic::Stats).unwrap().payload {
            TopicPayload::Stats(s) => s.total_articles,
            other => panic!("Expected Stats, got {:?}", other),
        }
    }

    #[test]
    fn test_read_absent() {
        let store = SnapshotStore::new();
        assert!(store.read(Topic::Stats).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_poll_write_applies() {
        let mut store = SnapshotStore::new();
        let applied = store.write(
            Topic::Stats,
            stats(120),
            Origin::Poll { issued_at: t0() },
            t0() + Duration::milliseconds(40),
        );
        assert!(applied);

        let snapshot = store.read(Topic::Stats).unwrap();
        assert_eq!(snapshot.source, Source::Poll);
        assert_eq!(snapshot.received_at, t0() + Duration::milliseconds(40));
        assert_eq!(total_articles(&store), 120);
    }

    #[test]
    fn test_stale_poll_rejected_after_push() {
        let mut store = SnapshotStore::new();

        // Poll issued at t0, push lands at t0+1s, poll response at t0+2s
        assert!(store.write(
            Topic::Stats,
            stats(125),
            Origin::Push,
            t0() + Duration::seconds(1)
        ));
        let applied = store.write(
            Topic::Stats,
            stats(120),
            Origin::Poll { issued_at: t0() },
            t0() + Duration::seconds(2),
        );

        assert!(!applied);
        assert_eq!(total_articles(&store), 125);
        assert_eq!(store.read(Topic::Stats).unwrap().source, Source::Push);
    }

    #[test]
    fn test_poll_issued_after_push_applies() {
        let mut store = SnapshotStore::new();
        store.write(Topic::Stats, stats(125), Origin::Push, t0());

        let applied = store.write(
            Topic::Stats,
            stats(130),
            Origin::Poll {
                issued_at: t0() + Duration::seconds(1),
            },
            t0() + Duration::seconds(2),
        );
        assert!(applied);
        assert_eq!(total_articles(&store), 130);
    }

    #[test]
    fn test_push_always_applies() {
        let mut store = SnapshotStore::new();
        store.write(
            Topic::Stats,
            stats(1),
            Origin::Poll {
                issued_at: t0() + Duration::seconds(10),
            },
            t0() + Duration::seconds(10),
        );
        assert!(store.write(Topic::Stats, stats(2), Origin::Push, t0()));
        assert_eq!(total_articles(&store), 2);
    }

    #[test]
    fn test_staleness_is_per_topic() {
        let mut store = SnapshotStore::new();
        store.write(
            Topic::Keywords,
            TopicPayload::Keywords(Vec::new()),
            Origin::Push,
            t0() + Duration::seconds(5),
        );

        assert!(store.write(
            Topic::Stats,
            stats(7),
            Origin::Poll { issued_at: t0() },
            t0() + Duration::seconds(6),
        ));
        assert_eq!(store.topics(), vec![Topic::Stats, Topic::Keywords]);
    }

    #[test]
    fn test_mismatched_payload_rejected() {
        let mut store = SnapshotStore::new();
        assert!(!store.write(Topic::Keywords, stats(1), Origin::Push, t0()));
        assert!(store.is_empty());
    }
}
