//! News types

use crate::store::{Measurement, Point, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One company news item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub symbol: String,
    /// Publication time, second precision UTC.
    pub timestamp: DateTime<Utc>,
    /// Provider-assigned id; part of the store's natural key.
    pub id: i64,
    pub headline: String,
    pub summary: String,
    pub source: String,
    pub url: String,
    pub category: Option<String>,
}

impl NewsItem {
    /// Convert to the store's point representation.
    ///
    /// The provider id is written as a tag, not a field, so two items
    /// published in the same second stay distinct series instead of
    /// silently overwriting each other.
    pub fn to_point(&self) -> Point {
        let mut point = Point::new(Measurement::MarketNews.as_str(), self.timestamp)
            .tag("symbol", &self.symbol)
            .tag("id", self.id.to_string())
            .field("headline", Value::Text(self.headline.clone()))
            .field("summary", Value::Text(self.summary.clone()))
            .field("source", Value::Text(self.source.clone()))
            .field("url", Value::Text(self.url.clone()));
        if let Some(category) = &self.category {
            point = point.field("category", Value::Text(category.clone()));
        }
        point
    }
}
