//! Render Instructions
//!
//! The minimal, toolkit-independent description of one topic's widget.
//! Instructions compare by value so the projector can skip no-op redraws.

use serde::Serialize;

/// A named numeric series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
}

impl Dataset {
    pub fn new(label: impl Into<String>, data: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            data,
        }
    }
}

/// Labels plus datasets for one chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    /// Chart identifier within the topic (e.g. `sentiment-trend`)
    pub chart: String,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

/// A single stat card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatCard {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordRow {
    pub keyword: String,
    pub count: u64,
    pub sentiment_label: String,
    pub sentiment_score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleRow {
    pub id: String,
    pub title: String,
    pub author: String,
    pub created_at: String,
    pub region: String,
    pub category: String,
    pub reposts: u64,
    pub comments: u64,
    pub likes: u64,
}

/// One row in a list widget
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListRow {
    Keyword(KeywordRow),
    Article(ArticleRow),
}

impl ListRow {
    /// Stable identity of the row within its list
    pub fn key(&self) -> &str {
        match self {
            ListRow::Keyword(row) => &row.keyword,
            ListRow::Article(row) => &row.id,
        }
    }
}

/// What the rendering layer needs to redraw one topic's widget
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum RenderInstruction {
    Cards(Vec<StatCard>),
    Charts(Vec<ChartData>),
    List(Vec<ListRow>),
}

impl RenderInstruction {
    /// Short human summary, used by log-based renderers
    pub fn summary(&self) -> String {
        match self {
            RenderInstruction::Cards(cards) => cards
                .iter()
                .map(|c| format!("{}={}", c.key, c.value))
                .collect::<Vec<_>>()
                .join(" "),
            RenderInstruction::Charts(charts) => charts
                .iter()
                .map(|c| format!("{}[{} points x {} series]", c.chart, c.labels.len(), c.datasets.len()))
                .collect::<Vec<_>>()
                .join(" "),
            RenderInstruction::List(rows) => format!("{} rows", rows.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_serialize() {
        let instruction = RenderInstruction::Cards(vec![StatCard {
            key: "total_articles".to_string(),
            value: "120".to_string(),
        }]);
        let json = serde_json::to_string(&instruction).unwrap();
        assert!(json.contains("\"type\":\"cards\""));
        assert!(json.contains("\"key\":\"total_articles\""));
    }

    #[test]
    fn test_summary() {
        let instruction = RenderInstruction::Charts(vec![ChartData {
            chart: "trend".to_string(),
            labels: vec!["10:00".to_string(), "11:00".to_string()],
            datasets: vec![Dataset::new("articles", vec![1.0, 2.0])],
        }]);
        assert_eq!(instruction.summary(), "trend[2 points x 1 series]");
    }
}
