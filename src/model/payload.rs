//! Typed topic payloads
//!
//! Every poll endpoint and push event carries JSON in one of these shapes.
//! Missing counters default to zero so partially populated responses still
//! render; a payload of the wrong overall shape is a [`DecodeError`].

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::topic::Topic;
use crate::error::DecodeError;

/// Aggregate counters shown on the stat cards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsPayload {
    #[serde(default)]
    pub total_articles: u64,
    #[serde(default)]
    pub total_comments: u64,
    #[serde(default)]
    pub today_articles: u64,
    #[serde(default)]
    pub average_engagement: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_distribution: Option<SentimentCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    /// Fields the dashboard does not interpret but keeps for readers
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Positive / negative / neutral tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    #[serde(default)]
    pub positive: u64,
    #[serde(default)]
    pub negative: u64,
    #[serde(default)]
    pub neutral: u64,
}

impl SentimentCounts {
    pub fn total(&self) -> u64 {
        self.positive
            .saturating_add(self.negative)
            .saturating_add(self.neutral)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentPoint {
    pub time: String,
    #[serde(default)]
    pub positive: u64,
    #[serde(default)]
    pub negative: u64,
    #[serde(default)]
    pub neutral: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentPayload {
    #[serde(default)]
    pub sentiment_trend: Vec<SentimentPoint>,
    #[serde(default)]
    pub overall_sentiment: Option<SentimentCounts>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub keyword: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub sentiment_score: f64,
    #[serde(default)]
    pub sentiment_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub time: String,
    #[serde(default)]
    pub article_count: u64,
    #[serde(default)]
    pub avg_engagement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTrendPoint {
    pub date: String,
    #[serde(default)]
    pub article_count: u64,
    #[serde(default)]
    pub avg_engagement: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendPayload {
    #[serde(default)]
    pub hourly_trend: Vec<TrendPoint>,
    #[serde(default)]
    pub daily_trend: Vec<DailyTrendPoint>,
    #[serde(default)]
    pub peak_hours: Vec<String>,
    #[serde(default)]
    pub growth_rate: f64,
}

/// One article row as served by `/api/recent_articles`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub reposts_count: u64,
    #[serde(default)]
    pub comments_count: u64,
    #[serde(default)]
    pub attitudes_count: u64,
    #[serde(default)]
    pub region_name: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub article_url: String,
    #[serde(default)]
    pub article_type: String,
}

impl Article {
    /// Publication time parsed from `created_at`, if it is in a known format
    pub fn published_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub name: String,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionEntry {
    pub region: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub avg_engagement: f64,
    #[serde(default)]
    pub sentiment_distribution: Option<SentimentCounts>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionalPayload {
    #[serde(default)]
    pub regional_data: Vec<RegionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorEntry {
    #[serde(default, deserialize_with = "string_or_number")]
    pub author_id: String,
    pub name: String,
    #[serde(default)]
    pub article_count: u64,
    #[serde(default)]
    pub avg_engagement: f64,
    #[serde(default)]
    pub total_engagement: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorPayload {
    #[serde(default)]
    pub top_authors: Vec<AuthorEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourBucket {
    pub hour: u32,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub avg_engagement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayBucket {
    pub weekday: u32,
    #[serde(default)]
    pub weekday_name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub avg_engagement: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeOfDayPayload {
    #[serde(default)]
    pub hourly_analysis: Vec<HourBucket>,
    #[serde(default)]
    pub weekly_analysis: Vec<WeekdayBucket>,
}

/// A comment attached to an article detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub like_counts: u64,
}

/// Full record served by `/api/article_detail/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub article: Article,
    #[serde(default, deserialize_with = "string_or_number")]
    pub author_id: String,
    #[serde(default)]
    pub author_home_url: String,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub comment_count: u64,
}

/// Decoded payload for any topic
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TopicPayload {
    Stats(StatsPayload),
    Sentiment(SentimentPayload),
    Keywords(Vec<KeywordEntry>),
    Trend(TrendPayload),
    Articles(Vec<Article>),
    Categories(Vec<CategoryCount>),
    Regional(RegionalPayload),
    Author(AuthorPayload),
    TimeOfDay(TimeOfDayPayload),
}

impl TopicPayload {
    /// Decode a raw JSON value against the schema of `topic`
    pub fn decode(topic: Topic, value: Value) -> Result<Self, DecodeError> {
        fn shape<T: serde::de::DeserializeOwned>(
            topic: Topic,
            value: Value,
        ) -> Result<T, DecodeError> {
            serde_json::from_value(value).map_err(|e| DecodeError::Shape {
                topic,
                reason: e.to_string(),
            })
        }

        Ok(match topic {
            Topic::Stats => TopicPayload::Stats(shape(topic, value)?),
            Topic::Sentiment => TopicPayload::Sentiment(shape(topic, value)?),
            Topic::Keywords => TopicPayload::Keywords(shape(topic, value)?),
            Topic::Trend => TopicPayload::Trend(shape(topic, value)?),
            Topic::Articles => TopicPayload::Articles(shape(topic, value)?),
            Topic::Categories => TopicPayload::Categories(shape(topic, value)?),
            Topic::Regional => TopicPayload::Regional(shape(topic, value)?),
            Topic::Author => TopicPayload::Author(shape(topic, value)?),
            Topic::TimeOfDay => TopicPayload::TimeOfDay(shape(topic, value)?),
        })
    }

    /// The topic this payload belongs to
    pub fn topic(&self) -> Topic {
        match self {
            TopicPayload::Stats(_) => Topic::Stats,
            TopicPayload::Sentiment(_) => Topic::Sentiment,
            TopicPayload::Keywords(_) => Topic::Keywords,
            TopicPayload::Trend(_) => Topic::Trend,
            TopicPayload::Articles(_) => Topic::Articles,
            TopicPayload::Categories(_) => Topic::Categories,
            TopicPayload::Regional(_) => Topic::Regional,
            TopicPayload::Author(_) => Topic::Author,
            TopicPayload::TimeOfDay(_) => Topic::TimeOfDay,
        }
    }
}

/// Parse the timestamp formats the data API is known to emit
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]`, the `T`-separated variant,
/// and the Weibo style `Tue Jan 02 10:00:00 +0800 2024`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%a %b %d %H:%M:%S %z %Y") {
        return Some(dt.naive_utc());
    }

    const NAIVE_FORMATS: [&str; 5] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
