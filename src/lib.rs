//! stockflux: incremental stock data ingestion and aligned visualization
//!
//! This library provides the core components for:
//! - Idempotent, existence-checked ingestion of daily OHLCV bars and
//!   company news into an InfluxDB-compatible time-series store
//! - A typed Flux query builder and line-protocol point encoding
//! - Rate-limited news fetching from an external provider
//! - Retrieval into a dense price table with per-symbol news lists
//! - Nearest-time alignment of news events onto price series
//! - SVG chart rendering of the aligned view
//! - Structured logging and run metrics

pub mod chart;
pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod news;
pub mod pipeline;
pub mod quotes;
pub mod retrieve;
pub mod store;
pub mod telemetry;
