//! Per-symbol ingestion orchestration
//!
//! Runs the price and news sub-flows in sequence for one symbol. The two
//! sub-flows are independent: a price failure never blocks news ingestion
//! and vice versa. Nothing here unwinds; every failure is reduced to a
//! [`FlowOutcome`].

use super::{ExistenceChecker, FlowOutcome, IngestionRequest, SymbolReport};
use crate::error::ErrorKind;
use crate::news::{NewsSource, RateLimiter};
use crate::quotes::QuoteSource;
use crate::store::{Measurement, TimeRange, TimeSeriesStore};
use crate::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Orchestrates idempotent per-symbol ingestion of prices and news.
pub struct IngestionCoordinator {
    store: Arc<dyn TimeSeriesStore>,
    quotes: Arc<dyn QuoteSource>,
    news: Option<Arc<dyn NewsSource>>,
    limiter: Arc<RateLimiter>,
    bucket: String,
    org: String,
    news_disabled_logged: AtomicBool,
}

impl IngestionCoordinator {
    pub fn new(
        store: Arc<dyn TimeSeriesStore>,
        quotes: Arc<dyn QuoteSource>,
        news: Option<Arc<dyn NewsSource>>,
        limiter: Arc<RateLimiter>,
        bucket: impl Into<String>,
        org: impl Into<String>,
    ) -> Self {
        Self {
            store,
            quotes,
            news,
            limiter,
            bucket: bucket.into(),
            org: org.into(),
            news_disabled_logged: AtomicBool::new(false),
        }
    }

    /// Ingest both data kinds for one symbol. Existing ranges are skipped,
    /// empty fetches succeed with zero writes, and each sub-flow fails on
    /// its own.
    pub async fn ingest(&self, request: &IngestionRequest) -> SymbolReport {
        let range = TimeRange::dates(request.start, request.end);

        let price = self.ingest_prices(request, &range).await;
        let news = self.ingest_news(request, &range).await;

        let report = SymbolReport {
            symbol: request.symbol.clone(),
            price,
            news,
        };
        tracing::info!(
            symbol = %report.symbol,
            price = %report.price,
            news = %report.news,
            success = report.success(),
            "Symbol ingestion finished"
        );
        report
    }

    async fn ingest_prices(&self, request: &IngestionRequest, range: &TimeRange) -> FlowOutcome {
        let symbol = request.symbol.as_str();
        let checker = ExistenceChecker::new(self.store.as_ref(), &self.bucket, &self.org);
        if checker.exists(symbol, Measurement::StockData, range).await {
            tracing::info!(symbol, measurement = "stock_data", "Range already ingested, skipped");
            return FlowOutcome::SkippedExisting;
        }

        let bars = match self.quotes.fetch(symbol, request.start, request.end).await {
            Ok(bars) => bars,
            Err(e) => {
                tracing::warn!(
                    symbol,
                    measurement = "stock_data",
                    operation = "fetch",
                    error = %e,
                    "Price fetch failed"
                );
                telemetry::record_flow_failure(Measurement::StockData, ErrorKind::Fetch);
                return FlowOutcome::Failed(ErrorKind::Fetch);
            }
        };
        if bars.is_empty() {
            tracing::info!(symbol, measurement = "stock_data", "No bars for range");
            return FlowOutcome::Empty;
        }

        let points: Vec<_> = bars.iter().map(|bar| bar.to_point()).collect();
        match self.store.write(&self.bucket, &self.org, &points).await {
            Ok(()) => {
                tracing::info!(
                    symbol,
                    measurement = "stock_data",
                    points = points.len(),
                    "Ingested price bars"
                );
                telemetry::record_points_written(Measurement::StockData, points.len());
                FlowOutcome::Written(points.len())
            }
            Err(e) => {
                tracing::warn!(
                    symbol,
                    measurement = "stock_data",
                    operation = "write",
                    error = %e,
                    "Price write failed"
                );
                telemetry::record_flow_failure(Measurement::StockData, ErrorKind::Write);
                FlowOutcome::Failed(ErrorKind::Write)
            }
        }
    }

    async fn ingest_news(&self, request: &IngestionRequest, range: &TimeRange) -> FlowOutcome {
        let symbol = request.symbol.as_str();
        let source = match &self.news {
            Some(source) => source,
            None => {
                if !self.news_disabled_logged.swap(true, Ordering::Relaxed) {
                    tracing::info!("News ingestion disabled: no API key configured");
                }
                return FlowOutcome::Disabled;
            }
        };

        let checker = ExistenceChecker::new(self.store.as_ref(), &self.bucket, &self.org);
        if checker.exists(symbol, Measurement::MarketNews, range).await {
            tracing::info!(symbol, measurement = "market_news", "Range already ingested, skipped");
            return FlowOutcome::SkippedExisting;
        }

        // Provider-imposed ceiling: the limiter is shared across all symbols.
        self.limiter.acquire().await;

        let items = match source.fetch(symbol, request.start, request.end).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(
                    symbol,
                    measurement = "market_news",
                    operation = "fetch",
                    error = %e,
                    "News fetch failed"
                );
                telemetry::record_flow_failure(Measurement::MarketNews, ErrorKind::Fetch);
                return FlowOutcome::Failed(ErrorKind::Fetch);
            }
        };
        if items.is_empty() {
            tracing::info!(symbol, measurement = "market_news", "No news for range");
            return FlowOutcome::Empty;
        }

        let points: Vec<_> = items.iter().map(|item| item.to_point()).collect();
        match self.store.write(&self.bucket, &self.org, &points).await {
            Ok(()) => {
                tracing::info!(
                    symbol,
                    measurement = "market_news",
                    points = points.len(),
                    "Ingested news items"
                );
                telemetry::record_points_written(Measurement::MarketNews, points.len());
                FlowOutcome::Written(points.len())
            }
            Err(e) => {
                tracing::warn!(
                    symbol,
                    measurement = "market_news",
                    operation = "write",
                    error = %e,
                    "News write failed"
                );
                telemetry::record_flow_failure(Measurement::MarketNews, ErrorKind::Write);
                FlowOutcome::Failed(ErrorKind::Write)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::news::NewsItem;
    use crate::quotes::PriceBar;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct FakeQuotes {
        bars_per_day: bool,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeQuotes {
        fn with_data() -> Self {
            Self {
                bars_per_day: true,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }
        fn empty() -> Self {
            Self {
                bars_per_day: false,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }
        fn failing() -> Self {
            Self {
                bars_per_day: false,
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl QuoteSource for FakeQuotes {
        async fn fetch(
            &self,
            symbol: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<PriceBar>, FetchError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if self.fail {
                return Err(FetchError::Decode("simulated outage".to_string()));
            }
            if !self.bars_per_day {
                return Ok(Vec::new());
            }
            let mut bars = Vec::new();
            let mut day = start;
            while day <= end {
                bars.push(PriceBar {
                    symbol: symbol.to_string(),
                    timestamp: day.and_hms_opt(0, 0, 0).unwrap().and_utc(),
                    open: 100.0,
                    high: 101.0,
                    low: 99.0,
                    close: 100.5,
                    volume: 1000.0,
                    adj_close: None,
                });
                day += chrono::Duration::days(1);
            }
            Ok(bars)
        }
    }

    struct FakeNews {
        fail: bool,
    }

    #[async_trait]
    impl NewsSource for FakeNews {
        async fn fetch(
            &self,
            symbol: &str,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<NewsItem>, FetchError> {
            if self.fail {
                return Err(FetchError::Decode("simulated outage".to_string()));
            }
            Ok(vec![NewsItem {
                symbol: symbol.to_string(),
                timestamp: start.and_hms_opt(13, 30, 0).unwrap().and_utc(),
                id: 1,
                headline: "headline".to_string(),
                summary: String::new(),
                source: "wire".to_string(),
                url: String::new(),
                category: None,
            }])
        }
    }

    fn coordinator(
        store: Arc<MemoryStore>,
        quotes: Arc<FakeQuotes>,
        news: Option<Arc<dyn NewsSource>>,
    ) -> IngestionCoordinator {
        IngestionCoordinator::new(
            store,
            quotes,
            news,
            Arc::new(RateLimiter::new(Duration::ZERO)),
            "bucket",
            "org",
        )
    }

    fn request() -> IngestionRequest {
        IngestionRequest::parse("AAPL", "2024-01-15", "2024-01-17").unwrap()
    }

    #[tokio::test]
    async fn test_ingest_writes_prices_and_news() {
        let store = Arc::new(MemoryStore::new());
        let coord = coordinator(
            store.clone(),
            Arc::new(FakeQuotes::with_data()),
            Some(Arc::new(FakeNews { fail: false })),
        );
        let report = coord.ingest(&request()).await;
        assert!(report.success());
        assert_eq!(report.price, FlowOutcome::Written(3));
        assert_eq!(report.news, FlowOutcome::Written(1));
        assert_eq!(store.point_count(), 4);
    }

    #[tokio::test]
    async fn test_repeat_ingest_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let quotes = Arc::new(FakeQuotes::with_data());
        let coord = coordinator(store.clone(), quotes.clone(), None);

        let first = coord.ingest(&request()).await;
        assert_eq!(first.price, FlowOutcome::Written(3));
        let points_after_first = store.points();

        let second = coord.ingest(&request()).await;
        assert_eq!(second.price, FlowOutcome::SkippedExisting);
        assert_eq!(store.points(), points_after_first);
        // The second run never hit the provider.
        assert_eq!(quotes.calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_empty_fetch_is_success() {
        let store = Arc::new(MemoryStore::new());
        let coord = coordinator(store.clone(), Arc::new(FakeQuotes::empty()), None);
        let report = coord.ingest(&request()).await;
        assert_eq!(report.price, FlowOutcome::Empty);
        assert!(report.price.is_ok());
        assert_eq!(store.point_count(), 0);
    }

    #[tokio::test]
    async fn test_news_failure_leaves_price_success() {
        let store = Arc::new(MemoryStore::new());
        let coord = coordinator(
            store.clone(),
            Arc::new(FakeQuotes::with_data()),
            Some(Arc::new(FakeNews { fail: true })),
        );
        let report = coord.ingest(&request()).await;
        assert_eq!(report.price, FlowOutcome::Written(3));
        assert_eq!(report.news, FlowOutcome::Failed(ErrorKind::Fetch));
        assert!(!report.success());
        assert_eq!(store.point_count(), 3);
    }

    #[tokio::test]
    async fn test_price_failure_leaves_news_success() {
        let store = Arc::new(MemoryStore::new());
        let coord = coordinator(
            store.clone(),
            Arc::new(FakeQuotes::failing()),
            Some(Arc::new(FakeNews { fail: false })),
        );
        let report = coord.ingest(&request()).await;
        assert_eq!(report.price, FlowOutcome::Failed(ErrorKind::Fetch));
        assert_eq!(report.news, FlowOutcome::Written(1));
        assert!(!report.success());
    }

    #[tokio::test]
    async fn test_missing_news_source_is_disabled_not_failed() {
        let store = Arc::new(MemoryStore::new());
        let coord = coordinator(store, Arc::new(FakeQuotes::with_data()), None);
        let report = coord.ingest(&request()).await;
        assert_eq!(report.news, FlowOutcome::Disabled);
        assert!(!report.success());
        assert!(!report.has_failure());
        assert_ne!(report.news, FlowOutcome::Failed(ErrorKind::Fetch));
    }

    #[tokio::test]
    async fn test_write_failure_reported_as_write_kind() {
        let store = Arc::new(MemoryStore::new());
        store.fail_writes(true);
        let coord = coordinator(store, Arc::new(FakeQuotes::with_data()), None);
        let report = coord.ingest(&request()).await;
        assert_eq!(report.price, FlowOutcome::Failed(ErrorKind::Write));
    }

    #[tokio::test]
    async fn test_overlapping_wider_range_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        let quotes = Arc::new(FakeQuotes::with_data());
        let coord = coordinator(store.clone(), quotes, None);

        coord.ingest(&request()).await;
        // A wider range that overlaps already-ingested days still counts
        // as present, so no second fetch happens.
        let wider = IngestionRequest::parse("AAPL", "2024-01-15", "2024-01-19").unwrap();
        let report = coord.ingest(&wider).await;
        assert_eq!(report.price, FlowOutcome::SkippedExisting);
        assert_eq!(store.point_count(), 3);
    }
}
