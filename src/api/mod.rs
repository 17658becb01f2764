//! Dashboard Data API
//!
//! Client side of the read-only JSON API the dashboard polls.
//!
//! # Endpoints
//!
//! ## Topics (polled)
//! - `GET /api/stats`
//! - `GET /api/sentiment`
//! - `GET /api/keywords`
//! - `GET /api/trends`
//! - `GET /api/recent_articles?limit=N[&category=C]`
//! - `GET /api/categories`
//! - `GET /api/regional_analysis`
//! - `GET /api/author_analysis`
//! - `GET /api/time_analysis`
//!
//! ## On demand
//! - `GET /api/article_detail/{id}` - `{"error": ...}` when the article is unknown
//! - `GET /api/system_status`
//!
//! # Example
//!
//! ```rust,ignore
//! use pulsewatch::api::{ApiClientConfig, DashboardApiClient};
//! use pulsewatch::model::Topic;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = DashboardApiClient::new(ApiClientConfig::default())?;
//!     let stats = api.fetch_topic(Topic::Stats).await?;
//!     println!("{}", stats);
//!     Ok(())
//! }
//! ```

mod client;

pub use client::{ApiClientConfig, DashboardApiClient};
