//! Yahoo Finance chart API client
//!
//! Fetches daily bars from the public v8 chart endpoint. Rows with missing
//! OHLC values (halted days, partial sessions) are dropped rather than
//! written as zeros.

use super::{PriceBar, QuoteSource};
use crate::error::FetchError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Public chart API base URL
pub const YAHOO_API_URL: &str = "https://query1.finance.yahoo.com";

/// Configuration for the quote client
#[derive(Debug, Clone)]
pub struct YahooConfig {
    /// Base URL for the chart API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: YAHOO_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Client for the Yahoo Finance chart API
pub struct YahooQuotes {
    config: YahooConfig,
    client: Client,
}

impl YahooQuotes {
    /// Create a client with default configuration.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(YahooConfig::default())
    }

    /// Create a client with custom configuration.
    pub fn with_config(config: YahooConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent("stockflux/0.1")
            .build()
            .map_err(FetchError::Http)?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl QuoteSource for YahooQuotes {
    async fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, FetchError> {
        let url = format!("{}/v8/finance/chart/{}", self.config.base_url, symbol);
        let period1 = start.and_hms_opt(0, 0, 0).expect("midnight").and_utc();
        let period2 = (end + chrono::Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .expect("midnight")
            .and_utc();

        tracing::debug!(symbol, %start, %end, "Fetching daily bars");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.timestamp().to_string()),
                ("period2", period2.timestamp().to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let chart: ChartResponse = response.json().await?;
        if let Some(err) = chart.chart.error {
            return Err(FetchError::Decode(format!(
                "{}: {}",
                err.code, err.description
            )));
        }

        let bars = chart
            .chart
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|result| convert_result(symbol, result))
            .unwrap_or_default();

        tracing::debug!(symbol, bars = bars.len(), "Fetched daily bars");
        Ok(bars)
    }
}

/// Flatten one chart result into day-aligned bars.
fn convert_result(symbol: &str, result: ChartResult) -> Vec<PriceBar> {
    let quote = match result.indicators.quote.into_iter().next() {
        Some(q) => q,
        None => return Vec::new(),
    };
    let adjclose = result
        .indicators
        .adjclose
        .unwrap_or_default()
        .into_iter()
        .next()
        .map(|a| a.adjclose)
        .unwrap_or_default();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let (open, high, low, close) = match (
            value_at(&quote.open, i),
            value_at(&quote.high, i),
            value_at(&quote.low, i),
            value_at(&quote.close, i),
        ) {
            (Some(o), Some(h), Some(l), Some(c)) => (o, h, l, c),
            _ => continue,
        };
        bars.push(PriceBar {
            symbol: symbol.to_string(),
            timestamp: day_align(*ts),
            open,
            high,
            low,
            close,
            volume: value_at(&quote.volume, i).unwrap_or(0.0),
            adj_close: value_at(&adjclose, i),
        });
    }
    bars
}

fn value_at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

/// The provider stamps daily bars with the session open; normalize to UTC
/// midnight so one bar per (symbol, day) holds in the store.
fn day_align(unix_secs: i64) -> DateTime<Utc> {
    let dt = Utc.timestamp_opt(unix_secs, 0).single().unwrap_or_default();
    dt.date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight")
        .and_utc()
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}
