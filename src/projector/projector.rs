//! View Projector
//!
//! Turns the current snapshot for a topic into a [`RenderInstruction`],
//! compares it with what was last rendered and only hands changed
//! instructions to the topic's renderer.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::instruction::{
    ArticleRow, ChartData, Dataset, KeywordRow, ListRow, RenderInstruction, StatCard,
};
use crate::model::{parse_timestamp, Topic, TopicPayload};
use crate::store::SnapshotStore;

/// Receives render instructions for one widget
pub trait Renderer: Send {
    fn render(&mut self, topic: Topic, instruction: &RenderInstruction);
}

/// Display limits applied while projecting
#[derive(Debug, Clone)]
pub struct ProjectorConfig {
    /// Article titles longer than this are truncated with `...`
    pub title_max_chars: usize,
    pub categories_top: usize,
    pub regional_top: usize,
    pub authors_top: usize,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            title_max_chars: 50,
            categories_top: 10,
            regional_top: 15,
            authors_top: 10,
        }
    }
}

/// Projects snapshots into render instructions, suppressing no-op redraws
pub struct ViewProjector {
    config: ProjectorConfig,
    /// Last instruction handed out per topic
    render_state: HashMap<Topic, RenderInstruction>,
    renderers: HashMap<Topic, Box<dyn Renderer>>,
}

impl ViewProjector {
    pub fn new(config: ProjectorConfig) -> Self {
        Self {
            config,
            render_state: HashMap::new(),
            renderers: HashMap::new(),
        }
    }

    /// Register the renderer for a topic, returning any previous one
    pub fn register(
        &mut self,
        topic: Topic,
        renderer: Box<dyn Renderer>,
    ) -> Option<Box<dyn Renderer>> {
        self.renderers.insert(topic, renderer)
    }

    /// Build the instruction for `topic`, or `None` if nothing changed
    pub fn project(&mut self, topic: Topic, store: &SnapshotStore) -> Option<RenderInstruction> {
        let snapshot = store.read(topic)?;
        let next = build_instruction(&snapshot.payload, &self.config);

        if self.render_state.get(&topic) == Some(&next) {
            tracing::debug!(topic = %topic, "Skipping redraw, view unchanged");
            return None;
        }

        self.render_state.insert(topic, next.clone());
        Some(next)
    }

    /// Project `topic` and dispatch to its renderer
    ///
    /// Returns `true` if a new instruction was produced.
    pub fn refresh(&mut self, topic: Topic, store: &SnapshotStore) -> bool {
        let Some(instruction) = self.project(topic, store) else {
            return false;
        };

        match self.renderers.get_mut(&topic) {
            Some(renderer) => renderer.render(topic, &instruction),
            None => tracing::trace!(topic = %topic, "No renderer registered"),
        }
        true
    }

    /// What was last rendered for `topic`
    pub fn last_rendered(&self, topic: Topic) -> Option<&RenderInstruction> {
        self.render_state.get(&topic)
    }
}

/// Pure projection of a payload
pub fn build_instruction(payload: &TopicPayload, config: &ProjectorConfig) -> RenderInstruction {
    match payload {
        TopicPayload::Stats(stats) => RenderInstruction::Cards(vec![
            card("total_articles", stats.total_articles.to_string()),
            card("total_comments", stats.total_comments.to_string()),
            card("today_articles", stats.today_articles.to_string()),
            card("avg_engagement", format!("{:.1}", stats.average_engagement)),
        ]),

        TopicPayload::Sentiment(sentiment) => {
            let trend = &sentiment.sentiment_trend;
            let mut charts = vec![ChartData {
                chart: "sentiment-trend".to_string(),
                labels: trend.iter().map(|p| hour_label(&p.time)).collect(),
                datasets: vec![
                    Dataset::new("positive", trend.iter().map(|p| p.positive as f64).collect()),
                    Dataset::new("negative", trend.iter().map(|p| p.negative as f64).collect()),
                    Dataset::new("neutral", trend.iter().map(|p| p.neutral as f64).collect()),
                ],
            }];

            if let Some(overall) = sentiment.overall_sentiment.filter(|o| o.total() > 0) {
                charts.push(ChartData {
                    chart: "sentiment-distribution".to_string(),
                    labels: vec!["positive".into(), "negative".into(), "neutral".into()],
                    datasets: vec![Dataset::new(
                        "articles",
                        vec![
                            overall.positive as f64,
                            overall.negative as f64,
                            overall.neutral as f64,
                        ],
                    )],
                });
            }
            RenderInstruction::Charts(charts)
        }

        TopicPayload::Keywords(keywords) => RenderInstruction::List(
            keywords
                .iter()
                .map(|k| {
                    ListRow::Keyword(KeywordRow {
                        keyword: k.keyword.clone(),
                        count: k.count,
                        sentiment_label: k
                            .sentiment_label
                            .clone()
                            .unwrap_or_else(|| "neutral".to_string()),
                        sentiment_score: k.sentiment_score,
                    })
                })
                .collect(),
        ),

        TopicPayload::Trend(trend) => RenderInstruction::Charts(vec![ChartData {
            chart: "article-trend".to_string(),
            labels: trend.hourly_trend.iter().map(|p| hour_label(&p.time)).collect(),
            datasets: vec![Dataset::new(
                "articles",
                trend.hourly_trend.iter().map(|p| p.article_count as f64).collect(),
            )],
        }]),

        TopicPayload::Articles(articles) => RenderInstruction::List(
            articles
                .iter()
                .map(|a| {
                    ListRow::Article(ArticleRow {
                        id: a.id.clone(),
                        title: truncate_title(&a.title, config.title_max_chars),
                        author: a.author_name.clone(),
                        created_at: a.created_at.clone(),
                        region: a.region_name.clone(),
                        category: a.article_type.clone(),
                        reposts: a.reposts_count,
                        comments: a.comments_count,
                        likes: a.attitudes_count,
                    })
                })
                .collect(),
        ),

        TopicPayload::Categories(categories) => {
            let mut top: Vec<_> = categories.iter().collect();
            top.sort_by(|a, b| b.count.cmp(&a.count));
            top.truncate(config.categories_top);

            RenderInstruction::Charts(vec![ChartData {
                chart: "categories".to_string(),
                labels: top.iter().map(|c| c.name.clone()).collect(),
                datasets: vec![Dataset::new(
                    "articles",
                    top.iter().map(|c| c.count as f64).collect(),
                )],
            }])
        }

        TopicPayload::Regional(regional) => {
            let mut top: Vec<_> = regional.regional_data.iter().collect();
            top.sort_by(|a, b| b.count.cmp(&a.count));
            top.truncate(config.regional_top);

            RenderInstruction::Charts(vec![ChartData {
                chart: "regional".to_string(),
                labels: top.iter().map(|r| r.region.clone()).collect(),
                datasets: vec![Dataset::new(
                    "articles",
                    top.iter().map(|r| r.count as f64).collect(),
                )],
            }])
        }

        TopicPayload::Author(authors) => {
            let mut top: Vec<_> = authors.top_authors.iter().collect();
            top.sort_by(|a, b| {
                b.avg_engagement
                    .partial_cmp(&a.avg_engagement)
                    .unwrap_or(Ordering::Equal)
            });
            top.truncate(config.authors_top);

            RenderInstruction::Charts(vec![ChartData {
                chart: "authors".to_string(),
                labels: top.iter().map(|a| a.name.clone()).collect(),
                datasets: vec![Dataset::new(
                    "avg_engagement",
                    top.iter().map(|a| a.avg_engagement).collect(),
                )],
            }])
        }

        TopicPayload::TimeOfDay(time) => RenderInstruction::Charts(vec![
            ChartData {
                chart: "hourly".to_string(),
                labels: time
                    .hourly_analysis
                    .iter()
                    .map(|h| format!("{}:00", h.hour))
                    .collect(),
                datasets: vec![Dataset::new(
                    "articles",
                    time.hourly_analysis.iter().map(|h| h.count as f64).collect(),
                )],
            },
            ChartData {
                chart: "weekly".to_string(),
                labels: time
                    .weekly_analysis
                    .iter()
                    .map(|w| w.weekday_name.clone())
                    .collect(),
                datasets: vec![Dataset::new(
                    "articles",
                    time.weekly_analysis.iter().map(|w| w.count as f64).collect(),
                )],
            },
        ]),
    }
}

fn card(key: &str, value: String) -> StatCard {
    StatCard {
        key: key.to_string(),
        value,
    }
}

/// `2024-05-01 13` (hour bucket key) → `13:00`
fn hour_label(raw: &str) -> String {
    parse_timestamp(&format!("{}:00", raw))
        .or_else(|| parse_timestamp(raw))
        .map(|dt| dt.format("%H:00").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.is_empty() {
        return "(untitled)".to_string();
    }
    if title.chars().count() > max_chars {
        let mut truncated: String = title.chars().take(max_chars).collect();
        truncated.push_str("...");
        truncated
    } else {
        title.to_string()
    }
}
