//! Topic identifiers and snapshot provenance
//!
//! The topic set is fixed at compile time: every widget on the dashboard
//! is backed by exactly one of these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::payload::TopicPayload;

/// A named category of dashboard data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    Stats,
    Sentiment,
    Keywords,
    Trend,
    Articles,
    Categories,
    Regional,
    Author,
    TimeOfDay,
}

impl Topic {
    /// Every topic, in dashboard order
    pub const ALL: [Topic; 9] = [
        Topic::Stats,
        Topic::Sentiment,
        Topic::Keywords,
        Topic::Trend,
        Topic::Articles,
        Topic::Categories,
        Topic::Regional,
        Topic::Author,
        Topic::TimeOfDay,
    ];

    /// Stable string form used in logs, config and the CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Stats => "stats",
            Topic::Sentiment => "sentiment",
            Topic::Keywords => "keywords",
            Topic::Trend => "trend",
            Topic::Articles => "articles",
            Topic::Categories => "categories",
            Topic::Regional => "regional",
            Topic::Author => "author",
            Topic::TimeOfDay => "time-of-day",
        }
    }

    /// Path of the poll endpoint serving this topic
    pub fn endpoint(&self) -> &'static str {
        match self {
            Topic::Stats => "/api/stats",
            Topic::Sentiment => "/api/sentiment",
            Topic::Keywords => "/api/keywords",
            Topic::Trend => "/api/trends",
            Topic::Articles => "/api/recent_articles",
            Topic::Categories => "/api/categories",
            Topic::Regional => "/api/regional_analysis",
            Topic::Author => "/api/author_analysis",
            Topic::TimeOfDay => "/api/time_analysis",
        }
    }

    /// Name of the push event carrying updates for this topic, if any
    pub fn push_event(&self) -> Option<&'static str> {
        match self {
            Topic::Stats => Some("stats_update"),
            Topic::Sentiment => Some("sentiment_update"),
            Topic::Keywords => Some("keywords_update"),
            Topic::Articles => Some("articles_update"),
            _ => None,
        }
    }

    /// Resolve a push event name back to its topic
    pub fn from_push_event(name: &str) -> Option<Topic> {
        Topic::ALL
            .iter()
            .copied()
            .find(|topic| topic.push_event() == Some(name))
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stats" => Ok(Topic::Stats),
            "sentiment" => Ok(Topic::Sentiment),
            "keywords" => Ok(Topic::Keywords),
            "trend" | "trends" => Ok(Topic::Trend),
            "articles" => Ok(Topic::Articles),
            "categories" => Ok(Topic::Categories),
            "regional" => Ok(Topic::Regional),
            "author" | "authors" => Ok(Topic::Author),
            "time-of-day" | "time" => Ok(Topic::TimeOfDay),
            other => Err(format!("unknown topic: {}", other)),
        }
    }
}

/// Where a snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Poll,
    Push,
}

/// Latest known value for one topic plus provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub topic: Topic,
    pub payload: TopicPayload,
    pub received_at: DateTime<Utc>,
    pub source: Source,
}
