//! Store retrieval and result reshaping
//!
//! Issues one combined range query over both measurements and reshapes the
//! row-per-field results into a dense price table plus per-symbol news
//! lists. A failed query surfaces as `Err`, never as a silently empty view.

use super::PriceTable;
use crate::news::NewsItem;
use crate::store::{FluxQuery, Measurement, Record, StoreError, TimeRange, TimeSeriesStore};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Everything a renderer needs for one window: prices plus news.
#[derive(Debug, Clone)]
pub struct MarketView {
    pub prices: PriceTable,
    /// Per-symbol news, ordered by timestamp ascending.
    pub news: BTreeMap<String, Vec<NewsItem>>,
}

impl MarketView {
    /// True when neither measurement returned anything.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty() && self.news.values().all(Vec::is_empty)
    }
}

/// Queries the store and reshapes results for visualization.
pub struct RetrievalEngine {
    store: Arc<dyn TimeSeriesStore>,
    bucket: String,
    org: String,
}

impl RetrievalEngine {
    pub fn new(
        store: Arc<dyn TimeSeriesStore>,
        bucket: impl Into<String>,
        org: impl Into<String>,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            org: org.into(),
        }
    }

    /// Fetch closing prices and news for `symbols` over `range`.
    ///
    /// `Ok` with an empty view means "nothing to visualize"; `Err` means the
    /// query itself failed — callers must not conflate the two.
    pub async fn retrieve(
        &self,
        symbols: &[String],
        range: TimeRange,
    ) -> Result<MarketView, StoreError> {
        let query = FluxQuery::new(&self.bucket, range)
            .measurement(Measurement::StockData)
            .measurement(Measurement::MarketNews)
            .fields(["close", "headline", "summary", "source", "url", "category"])
            .symbols(symbols.iter().cloned());

        let tables = self.store.query(&self.org, &query).await?;

        let mut price_series: BTreeMap<String, BTreeMap<DateTime<Utc>, f64>> = BTreeMap::new();
        let mut news_parts: BTreeMap<NewsKey, PartialNews> = BTreeMap::new();

        for record in tables.iter().flat_map(|t| t.records.iter()) {
            let symbol = match record.symbol() {
                Some(s) => s.to_string(),
                None => continue,
            };
            match record.measurement.as_str() {
                "stock_data" => {
                    if record.field == "close" {
                        if let Some(close) = record.value.as_f64() {
                            price_series
                                .entry(symbol)
                                .or_default()
                                .insert(record.time, close);
                        }
                    }
                }
                "market_news" => {
                    accumulate_news(&mut news_parts, &symbol, record);
                }
                _ => {}
            }
        }

        let prices = PriceTable::from_series(symbols, &price_series);
        let news = assemble_news(news_parts);

        tracing::debug!(
            symbols = symbols.len(),
            price_rows = prices.index().len(),
            news_items = news.values().map(Vec::len).sum::<usize>(),
            "Retrieved market view"
        );

        Ok(MarketView { prices, news })
    }
}

/// The store returns one row per field; news fields for the same item share
/// (symbol, timestamp, id) and get pivoted back together here.
type NewsKey = (String, DateTime<Utc>, i64);

#[derive(Debug, Default)]
struct PartialNews {
    headline: Option<String>,
    summary: Option<String>,
    source: Option<String>,
    url: Option<String>,
    category: Option<String>,
}

fn accumulate_news(parts: &mut BTreeMap<NewsKey, PartialNews>, symbol: &str, record: &Record) {
    let id = record
        .tags
        .get("id")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(0);
    let entry = parts
        .entry((symbol.to_string(), record.time, id))
        .or_default();
    let text = record.value.as_text().map(str::to_string);
    match record.field.as_str() {
        "headline" => entry.headline = text,
        "summary" => entry.summary = text,
        "source" => entry.source = text,
        "url" => entry.url = text,
        "category" => entry.category = text,
        _ => {}
    }
}

fn assemble_news(parts: BTreeMap<NewsKey, PartialNews>) -> BTreeMap<String, Vec<NewsItem>> {
    let mut news: BTreeMap<String, Vec<NewsItem>> = BTreeMap::new();
    for ((symbol, time, id), part) in parts {
        // A pivoted row without a headline is not a presentable item.
        let headline = match part.headline {
            Some(h) if !h.is_empty() => h,
            _ => continue,
        };
        news.entry(symbol.clone()).or_default().push(NewsItem {
            symbol,
            timestamp: time,
            id,
            headline,
            summary: part.summary.unwrap_or_default(),
            source: part.source.unwrap_or_default(),
            url: part.url.unwrap_or_default(),
            category: part.category,
        });
    }
    for items in news.values_mut() {
        items.sort_by_key(|item| (item.timestamp, item.id));
    }
    news
}
