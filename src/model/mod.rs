//! Dashboard Data Model
//!
//! - **topic**: the fixed topic set, snapshot provenance and the `Snapshot` record
//! - **payload**: typed, topic-specific payload shapes decoded from JSON

mod payload;
mod topic;

pub use payload::{
    parse_timestamp, Article, ArticleDetail, AuthorEntry, AuthorPayload, CategoryCount, Comment,
    DailyTrendPoint, HourBucket, KeywordEntry, RegionEntry, RegionalPayload, SentimentCounts,
    SentimentPayload, SentimentPoint, StatsPayload, TimeOfDayPayload, TopicPayload, TrendPayload,
    TrendPoint, WeekdayBucket,
};
pub use topic::{Snapshot, Source, Topic};
