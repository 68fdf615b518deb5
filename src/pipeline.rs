//! Batch run orchestration
//!
//! Wires the store, adapters, coordinator, retrieval engine and renderer
//! into one end-to-end run. All handles live in an explicit [`Pipeline`]
//! context so tests can inject in-process doubles.

use crate::chart;
use crate::config::Config;
use crate::error::ErrorKind;
use crate::ingest::{FlowOutcome, IngestionCoordinator, IngestionRequest, SymbolReport};
use crate::news::{FinnhubConfig, FinnhubNews, NewsSource, RateLimiter};
use crate::quotes::{QuoteSource, YahooQuotes};
use crate::retrieve::{align, default_tolerance, AlignedNewsEvent, RetrievalEngine};
use crate::store::{InfluxConfig, InfluxStore, StoreError, TimeRange, TimeSeriesStore};
use chrono::NaiveDate;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Aggregated outcome of one batch run.
#[derive(Debug)]
pub struct RunSummary {
    pub reports: Vec<SymbolReport>,
    /// Whether the retrieval query succeeded. An empty result still counts
    /// as retrieved; only a query failure clears this.
    pub retrieved: bool,
    pub chart_written: bool,
}

impl RunSummary {
    /// True when every symbol's ingestion fully succeeded. Disabled news
    /// makes this false; see [`Self::has_failures`] for error-only checks.
    pub fn all_succeeded(&self) -> bool {
        self.reports.iter().all(SymbolReport::success)
    }

    /// True when any sub-flow of any symbol hit an actual error.
    pub fn has_failures(&self) -> bool {
        self.reports.iter().any(SymbolReport::has_failure)
    }

    /// Total points written across all symbols.
    pub fn points_written(&self) -> usize {
        self.reports.iter().map(SymbolReport::points_written).sum()
    }
}

/// Long-lived handles for one run: store gateway, adapters, and the shared
/// news rate limiter. Created once, reused across all calls in the run.
pub struct Pipeline {
    store: Arc<dyn TimeSeriesStore>,
    quotes: Arc<dyn QuoteSource>,
    news: Option<Arc<dyn NewsSource>>,
    limiter: Arc<RateLimiter>,
    bucket: String,
    org: String,
    chart: crate::config::ChartConfig,
}

impl Pipeline {
    /// Build the production pipeline from configuration: HTTP store
    /// gateway, quote client, and a news client iff an API key is set.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;

        let store = InfluxStore::connect(InfluxConfig::new(
            &config.store.url,
            &config.store.token,
        ))?;
        let quotes = YahooQuotes::new()?;
        let news: Option<Arc<dyn NewsSource>> = match &config.news.api_key {
            Some(key) => Some(Arc::new(FinnhubNews::new(FinnhubConfig::new(key))?)),
            None => None,
        };

        Ok(Self::with_parts(
            Arc::new(store),
            Arc::new(quotes),
            news,
            config,
        ))
    }

    /// Assemble a pipeline from pre-built parts (used by tests and by
    /// embedders that bring their own store or adapters).
    pub fn with_parts(
        store: Arc<dyn TimeSeriesStore>,
        quotes: Arc<dyn QuoteSource>,
        news: Option<Arc<dyn NewsSource>>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            quotes,
            news,
            limiter: Arc::new(RateLimiter::new(Duration::from_millis(
                config.news.min_call_interval_ms,
            ))),
            bucket: config.store.bucket.clone(),
            org: config.store.org.clone(),
            chart: config.chart.clone(),
        }
    }

    /// Ingest all symbols over the date range, then retrieve, align, and
    /// render the chart to `output`.
    ///
    /// Store unavailability is fatal; per-symbol failures, a failed
    /// retrieval query, and a failed chart write are reported in the
    /// summary instead.
    pub async fn run(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
        output: &Path,
    ) -> anyhow::Result<RunSummary> {
        self.ensure_reachable().await?;
        tracing::info!(symbols = symbols.len(), %start, %end, "Starting batch run");

        let reports = self.ingest_symbols(symbols, start, end).await;

        let (retrieved, chart_written) =
            match self.chart_phase(symbols, start, end, output).await {
                Ok(written) => (true, written),
                Err(e) => {
                    tracing::error!(error = %e, "Retrieval query failed; skipping chart");
                    (false, false)
                }
            };

        Ok(RunSummary {
            reports,
            retrieved,
            chart_written,
        })
    }

    /// Ingestion only: one report per symbol.
    pub async fn ingest_all(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<SymbolReport>> {
        self.ensure_reachable().await?;
        Ok(self.ingest_symbols(symbols, start, end).await)
    }

    /// Retrieval, alignment and rendering only. Returns whether a chart was
    /// written; a failed retrieval query is an error, a window with nothing
    /// to visualize or a failed render is `Ok(false)`.
    pub async fn render_chart(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
        output: &Path,
    ) -> anyhow::Result<bool> {
        self.ensure_reachable().await?;
        self.chart_phase(symbols, start, end, output)
            .await
            .map_err(Into::into)
    }

    async fn ensure_reachable(&self) -> anyhow::Result<()> {
        if !self.store.ping().await {
            anyhow::bail!("store is unreachable; nothing can proceed");
        }
        Ok(())
    }

    async fn ingest_symbols(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<SymbolReport> {
        let coordinator = IngestionCoordinator::new(
            self.store.clone(),
            self.quotes.clone(),
            self.news.clone(),
            self.limiter.clone(),
            &self.bucket,
            &self.org,
        );

        let mut reports = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            match IngestionRequest::new(symbol.clone(), start, end) {
                Ok(request) => reports.push(coordinator.ingest(&request).await),
                Err(e) => {
                    tracing::warn!(symbol, error = %e, "Rejected ingestion request");
                    reports.push(SymbolReport {
                        symbol: symbol.clone(),
                        price: FlowOutcome::Failed(ErrorKind::Validation),
                        news: FlowOutcome::Failed(ErrorKind::Validation),
                    });
                }
            }
        }
        reports
    }

    async fn chart_phase(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
        output: &Path,
    ) -> Result<bool, StoreError> {
        let engine = RetrievalEngine::new(self.store.clone(), &self.bucket, &self.org);
        let view = engine
            .retrieve(symbols, TimeRange::dates(start, end))
            .await?;

        if view.is_empty() {
            tracing::info!("Nothing to visualize for this window");
            return Ok(false);
        }

        let mut events: Vec<AlignedNewsEvent> = Vec::new();
        for (symbol, items) in &view.news {
            let series = view.prices.series(symbol);
            events.extend(align(items, &series, default_tolerance()));
        }
        for event in events.iter().filter(|e| e.aligned_price.is_none()) {
            // Off-series events still get surfaced, just not drawn.
            tracing::info!(
                symbol = %event.symbol,
                at = %event.news_timestamp,
                headline = %event.headline,
                "News event outside price series tolerance"
            );
        }

        match chart::render(&view, &events, output, &self.chart.appearance()) {
            Ok(()) => Ok(true),
            Err(e) => {
                tracing::error!(error = %e, "Chart rendering failed");
                Ok(false)
            }
        }
    }
}
