//! Dashboard Data API Client
//!
//! HTTP client for the read-only JSON endpoints backing each dashboard
//! widget.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::error::TransportError;
use crate::model::{Article, ArticleDetail, Topic};
use crate::scheduler::TopicSource;

/// Configuration for the data API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL of the data API (e.g., "http://localhost:5000")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// `limit` sent when polling recent articles
    pub articles_limit: usize,
    /// Restrict the polled article feed to one category
    pub articles_category: Option<String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            request_timeout_ms: 10_000,
            articles_limit: 10,
            articles_category: None,
        }
    }
}

/// Data API client
pub struct DashboardApiClient {
    client: Client,
    config: ApiClientConfig,
}

impl DashboardApiClient {
    pub fn new(config: ApiClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Full URL polled for `topic`
    pub fn topic_url(&self, topic: Topic) -> String {
        match topic {
            Topic::Articles => self.recent_articles_url(
                self.config.articles_limit,
                self.config.articles_category.as_deref(),
            ),
            other => format!("{}{}", self.base(), other.endpoint()),
        }
    }

    fn recent_articles_url(&self, limit: usize, category: Option<&str>) -> String {
        let mut url = format!("{}{}?limit={}", self.base(), Topic::Articles.endpoint(), limit);
        if let Some(category) = category.filter(|c| !c.is_empty()) {
            url.push_str("&category=");
            url.push_str(&urlencoding::encode(category));
        }
        url
    }

    /// Fetch the raw payload for a topic
    pub async fn fetch_topic(&self, topic: Topic) -> Result<Value, TransportError> {
        let value = self.get_json(&self.topic_url(topic)).await?;
        if let Some(message) = api_error(&value) {
            return Err(TransportError::Body(message));
        }
        Ok(value)
    }

    /// Recent articles, optionally restricted to one category
    pub async fn recent_articles(
        &self,
        limit: usize,
        category: Option<&str>,
    ) -> Result<Vec<Article>, TransportError> {
        let value = self.get_json(&self.recent_articles_url(limit, category)).await?;
        if let Some(message) = api_error(&value) {
            return Err(TransportError::Body(message));
        }
        serde_json::from_value(value).map_err(|e| TransportError::Body(e.to_string()))
    }

    /// Detail view of one article with its comments
    pub async fn article_detail(&self, id: &str) -> Result<ArticleDetail, TransportError> {
        let url = format!(
            "{}/api/article_detail/{}",
            self.base(),
            urlencoding::encode(id)
        );

        let value = match self.get_json(&url).await {
            Err(TransportError::Status { status: 404, .. }) => {
                return Err(TransportError::NotFound(id.to_string()))
            }
            other => other?,
        };
        if let Some(message) = api_error(&value) {
            tracing::debug!(article_id = id, error = %message, "Article detail not available");
            return Err(TransportError::NotFound(id.to_string()));
        }

        serde_json::from_value(value).map_err(|e| TransportError::Body(e.to_string()))
    }

    /// Server-side collection status, passed through untyped
    pub async fn system_status(&self) -> Result<Value, TransportError> {
        self.get_json(&format!("{}/api/system_status", self.base()))
            .await
    }

    async fn get_json(&self, url: &str) -> Result<Value, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))
    }
}

/// `{"error": "..."}` bodies are how the API reports failures
fn api_error(value: &Value) -> Option<String> {
    value
        .as_object()
        .and_then(|obj| obj.get("error"))
        .map(|e| match e.as_str() {
            Some(s) => s.to_string(),
            None => e.to_string(),
        })
}

#[async_trait]
impl TopicSource for DashboardApiClient {
    async fn fetch(&self, topic: Topic) -> Result<Value, TransportError> {
        self.fetch_topic(topic).await
    }
}
