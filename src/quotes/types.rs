//! Quote types

use crate::store::{Measurement, Point, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar for a symbol.
///
/// The timestamp is day-aligned UTC midnight, which is what makes repeated
/// ingestion of the same trading day overwrite rather than duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub adj_close: Option<f64>,
}

impl PriceBar {
    /// Convert to the store's point representation.
    pub fn to_point(&self) -> Point {
        let mut point = Point::new(Measurement::StockData.as_str(), self.timestamp)
            .tag("symbol", &self.symbol)
            .field("open", Value::Float(self.open))
            .field("high", Value::Float(self.high))
            .field("low", Value::Float(self.low))
            .field("close", Value::Float(self.close))
            .field("volume", Value::Float(self.volume));
        if let Some(adj) = self.adj_close {
            point = point.field("adj_close", Value::Float(adj));
        }
        point
    }
}
