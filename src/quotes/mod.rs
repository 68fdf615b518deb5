//! OHLCV quote source
//!
//! Daily bars come from an external quote provider behind the
//! [`QuoteSource`] trait.

mod types;
mod yahoo;

pub use types::PriceBar;
pub use yahoo::{YahooConfig, YahooQuotes};

use crate::error::FetchError;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Trait for daily-bar providers.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetch daily bars for `symbol` over the inclusive date range.
    /// An empty result means the provider has no bars for the range, which
    /// is not an error.
    async fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, FetchError>;
}
