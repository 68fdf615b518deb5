//! Time-series store gateway
//!
//! Narrow interface over a remote InfluxDB 2.x-compatible store: point
//! writes and Flux range queries. Everything above this module talks to the
//! [`TimeSeriesStore`] trait so tests can swap in [`MemoryStore`].

mod flux;
mod influx;
mod memory;
mod point;

pub use flux::{FluxQuery, FluxTime, TimeRange};
pub use influx::{InfluxConfig, InfluxStore};
pub use memory::MemoryStore;
pub use point::{Point, Value};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

/// Named partition of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measurement {
    /// Daily OHLCV bars
    StockData,
    /// Company news items
    MarketNews,
}

impl Measurement {
    /// Wire name used as the store measurement.
    pub fn as_str(&self) -> &'static str {
        match self {
            Measurement::StockData => "stock_data",
            Measurement::MarketNews => "market_news",
        }
    }
}

impl std::fmt::Display for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store gateway errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not reach the store at all
    #[error("store connection failed: {0}")]
    Connection(String),
    /// Point write rejected or transport failed mid-write
    #[error("store write failed: {0}")]
    Write(String),
    /// Query rejected or response unreadable
    #[error("store query failed: {0}")]
    Query(String),
}

/// One row of a query result, already ungrouped: a single field value at a
/// single timestamp with its tag set.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub measurement: String,
    pub field: String,
    pub value: Value,
    pub time: DateTime<Utc>,
    pub tags: BTreeMap<String, String>,
}

impl Record {
    /// The `symbol` tag, if present.
    pub fn symbol(&self) -> Option<&str> {
        self.tags.get("symbol").map(String::as_str)
    }
}

/// A group of records sharing one result table in the store's response.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub records: Vec<Record>,
}

/// Request/response interface to the time-series store.
#[async_trait]
pub trait TimeSeriesStore: Send + Sync {
    /// Health check; true when the store answers.
    async fn ping(&self) -> bool;

    /// Write a batch of points. The store overwrites on identical
    /// (measurement, tag set, timestamp, field), which is what makes
    /// re-ingestion of an already-written range harmless.
    async fn write(&self, bucket: &str, org: &str, points: &[Point]) -> Result<(), StoreError>;

    /// Run a range query and return the resulting tables.
    async fn query(&self, org: &str, query: &FluxQuery) -> Result<Vec<Table>, StoreError>;
}
