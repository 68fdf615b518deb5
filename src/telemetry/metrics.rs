//! Run metrics

use crate::error::ErrorKind;
use crate::store::Measurement;
use metrics::counter;

/// Record points written to the store.
pub fn record_points_written(measurement: Measurement, count: usize) {
    counter!(
        "stockflux_points_written_total",
        "measurement" => measurement.as_str()
    )
    .increment(count as u64);
}

/// Record a failed ingestion sub-flow.
pub fn record_flow_failure(measurement: Measurement, kind: ErrorKind) {
    counter!(
        "stockflux_flow_failures_total",
        "measurement" => measurement.as_str(),
        "kind" => kind.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter_is_a_noop() {
        // With no recorder installed these must not panic.
        record_points_written(Measurement::StockData, 10);
        record_flow_failure(Measurement::MarketNews, ErrorKind::Fetch);
    }
}
