//! Pre-flight existence check
//!
//! Decides whether ingestion work is needed for a (symbol, measurement,
//! range). A query failure is treated as "absent": the caller will then
//! re-fetch, and the store's overwrite semantics make a duplicate attempt
//! harmless, whereas trusting a failed query could silently skip data.

use crate::store::{FluxQuery, Measurement, TimeRange, TimeSeriesStore};

/// Checks whether data is already present in the store.
pub struct ExistenceChecker<'a> {
    store: &'a dyn TimeSeriesStore,
    bucket: &'a str,
    org: &'a str,
}

impl<'a> ExistenceChecker<'a> {
    pub fn new(store: &'a dyn TimeSeriesStore, bucket: &'a str, org: &'a str) -> Self {
        Self { store, bucket, org }
    }

    /// True when at least one record exists for the symbol in the
    /// measurement within the range. False on query failure (fail closed).
    pub async fn exists(
        &self,
        symbol: &str,
        measurement: Measurement,
        range: &TimeRange,
    ) -> bool {
        // One representative field per measurement is enough for a count.
        let probe_field = match measurement {
            Measurement::StockData => "close",
            Measurement::MarketNews => "headline",
        };
        let query = FluxQuery::new(self.bucket, range.clone())
            .measurement(measurement)
            .field(probe_field)
            .symbol(symbol)
            .count();

        match self.store.query(self.org, &query).await {
            Ok(tables) => tables
                .iter()
                .flat_map(|t| t.records.iter())
                .any(|r| r.value.as_i64().unwrap_or(0) > 0),
            Err(e) => {
                tracing::warn!(
                    symbol,
                    measurement = %measurement,
                    error = %e,
                    "Existence query failed; treating range as absent"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Point, Value};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn range() -> TimeRange {
        TimeRange::dates(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_exists_true_after_write() {
        let store = MemoryStore::new();
        let point = Point::new(
            "stock_data",
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
        )
        .tag("symbol", "AAPL")
        .field("close", Value::Float(185.92));
        store.write("b", "o", &[point]).await.unwrap();

        let checker = ExistenceChecker::new(&store, "b", "o");
        assert!(
            checker
                .exists("AAPL", Measurement::StockData, &range())
                .await
        );
    }

    #[tokio::test]
    async fn test_absent_symbol_reports_false() {
        let store = MemoryStore::new();
        let checker = ExistenceChecker::new(&store, "b", "o");
        assert!(
            !checker
                .exists("MSFT", Measurement::StockData, &range())
                .await
        );
    }

    #[tokio::test]
    async fn test_measurements_are_independent() {
        let store = MemoryStore::new();
        let point = Point::new(
            "stock_data",
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
        )
        .tag("symbol", "AAPL")
        .field("close", Value::Float(185.92));
        store.write("b", "o", &[point]).await.unwrap();

        let checker = ExistenceChecker::new(&store, "b", "o");
        assert!(
            !checker
                .exists("AAPL", Measurement::MarketNews, &range())
                .await
        );
    }

    #[tokio::test]
    async fn test_fails_closed_on_query_error() {
        let store = MemoryStore::new();
        let point = Point::new(
            "stock_data",
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
        )
        .tag("symbol", "AAPL")
        .field("close", Value::Float(185.92));
        store.write("b", "o", &[point]).await.unwrap();
        store.fail_queries(true);

        let checker = ExistenceChecker::new(&store, "b", "o");
        // Data is there, but the failed query must still report absent.
        assert!(
            !checker
                .exists("AAPL", Measurement::StockData, &range())
                .await
        );
    }
}
