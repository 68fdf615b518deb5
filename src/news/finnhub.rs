//! Finnhub company-news client
//!
//! Requires an API key; construction is gated on the key being configured,
//! so an absent key means the news feature is disabled rather than failing
//! per call.

use super::{NewsItem, NewsSource};
use crate::error::FetchError;
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Finnhub API base URL
pub const FINNHUB_API_URL: &str = "https://finnhub.io";

/// Configuration for the news client
#[derive(Debug, Clone)]
pub struct FinnhubConfig {
    /// Base URL for the API
    pub base_url: String,
    /// API key, sent with every request
    pub api_key: String,
    /// Request timeout
    pub timeout: Duration,
}

impl FinnhubConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: FINNHUB_API_URL.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Client for the Finnhub company-news endpoint
pub struct FinnhubNews {
    config: FinnhubConfig,
    client: Client,
}

impl FinnhubNews {
    pub fn new(config: FinnhubConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(FetchError::Http)?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl NewsSource for FinnhubNews {
    async fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NewsItem>, FetchError> {
        let url = format!("{}/api/v1/company-news", self.config.base_url);

        tracing::debug!(symbol, %start, %end, "Fetching company news");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("from", &start.to_string()),
                ("to", &end.to_string()),
            ])
            .header("X-Finnhub-Token", &self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let raw: Vec<FinnhubArticle> = response.json().await?;
        let items: Vec<NewsItem> = raw
            .into_iter()
            .filter_map(|article| convert_article(symbol, article))
            .collect();

        tracing::debug!(symbol, items = items.len(), "Fetched company news");
        Ok(items)
    }
}

/// Map a provider article onto [`NewsItem`]. Articles without a headline or
/// with an unusable timestamp are dropped.
fn convert_article(symbol: &str, article: FinnhubArticle) -> Option<NewsItem> {
    if article.headline.is_empty() {
        return None;
    }
    let timestamp = Utc.timestamp_opt(article.datetime, 0).single()?;
    Some(NewsItem {
        symbol: symbol.to_string(),
        timestamp,
        id: article.id,
        headline: article.headline,
        summary: article.summary,
        source: article.source,
        url: article.url,
        category: if article.category.is_empty() {
            None
        } else {
            Some(article.category)
        },
    })
}

/// Raw article from the company-news endpoint
#[derive(Debug, Deserialize)]
struct FinnhubArticle {
    #[serde(default)]
    category: String,
    datetime: i64,
    #[serde(default)]
    headline: String,
    id: i64,
    #[serde(default)]
    source: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    url: String,
}
