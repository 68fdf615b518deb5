//! Nearest-time alignment of news onto a price series

use crate::news::NewsItem;
use chrono::{DateTime, Duration, Utc};

/// A news event positioned against its symbol's price series.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedNewsEvent {
    pub symbol: String,
    pub news_timestamp: DateTime<Utc>,
    /// Nearest in-tolerance price, or `None` when the series has no point
    /// close enough. Events without a price stay in the list; they just
    /// carry no y-coordinate.
    pub aligned_price: Option<f64>,
    pub headline: String,
    pub summary: String,
    pub url: String,
}

/// Default alignment tolerance: one day, matching daily bars.
pub fn default_tolerance() -> Duration {
    Duration::days(1)
}

/// Align each news item to the nearest price timestamp within `tolerance`.
///
/// `series` must be sorted ascending (which [`super::PriceTable::series`]
/// guarantees). On an exact distance tie the earlier timestamp wins. Prices
/// are never fabricated: outside tolerance the event gets no price.
pub fn align(
    news: &[NewsItem],
    series: &[(DateTime<Utc>, f64)],
    tolerance: Duration,
) -> Vec<AlignedNewsEvent> {
    news.iter()
        .map(|item| AlignedNewsEvent {
            symbol: item.symbol.clone(),
            news_timestamp: item.timestamp,
            aligned_price: nearest_within(series, item.timestamp, tolerance),
            headline: item.headline.clone(),
            summary: item.summary.clone(),
            url: item.url.clone(),
        })
        .collect()
}

/// Nearest-price lookup via binary search over the sorted series.
fn nearest_within(
    series: &[(DateTime<Utc>, f64)],
    at: DateTime<Utc>,
    tolerance: Duration,
) -> Option<f64> {
    if series.is_empty() {
        return None;
    }
    let idx = series.partition_point(|(ts, _)| *ts < at);

    // Candidates are the neighbors straddling the insertion point. Checking
    // the earlier one first makes exact ties resolve to it.
    let mut best: Option<(Duration, f64)> = None;
    for candidate in [idx.checked_sub(1), Some(idx)].into_iter().flatten() {
        if let Some((ts, price)) = series.get(candidate) {
            let distance = (*ts - at).abs();
            if distance <= tolerance {
                let closer = match best {
                    Some((best_distance, _)) => distance < best_distance,
                    None => true,
                };
                if closer {
                    best = Some((distance, *price));
                }
            }
        }
    }
    best.map(|(_, price)| price)
}
