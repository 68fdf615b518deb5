//! Company news source
//!
//! News items come from an external provider behind the [`NewsSource`]
//! trait. The provider enforces a per-second call ceiling, so successive
//! fetches must go through a shared [`RateLimiter`].

mod finnhub;
mod limiter;
mod types;

pub use finnhub::{FinnhubConfig, FinnhubNews};
pub use limiter::RateLimiter;
pub use types::NewsItem;

use crate::error::FetchError;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Trait for company-news providers.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Fetch news items for `symbol` over the inclusive date range. An
    /// empty result means no coverage, which is not an error.
    async fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NewsItem>, FetchError>;
}
