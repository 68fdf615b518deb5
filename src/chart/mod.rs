//! Chart rendering
//!
//! Draws the retrieved price table as one line per symbol with aligned news
//! events marked on top, and writes a self-contained SVG artifact. Render
//! failures are reported to the caller but are non-fatal to the pipeline.

use crate::retrieve::{AlignedNewsEvent, MarketView};
use anyhow::Context;
use chrono::{DateTime, Utc};
use plotters::prelude::*;
use std::path::Path;

/// Chart appearance settings
#[derive(Debug, Clone)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Stock Data Visualization".to_string(),
        }
    }
}

/// Render the view to an SVG file at `output`.
pub fn render(
    view: &MarketView,
    events: &[AlignedNewsEvent],
    output: &Path,
    config: &ChartConfig,
) -> anyhow::Result<()> {
    if view.prices.is_empty() {
        anyhow::bail!("no price data to chart");
    }
    let index = view.prices.index();
    let (first, last) = (index[0], *index.last().expect("non-empty index"));
    let (lo, hi) = view.prices.price_bounds().expect("non-empty table");
    // Pad the y-range so flat series do not collapse the axis.
    let pad = ((hi - lo) * 0.05).max(1.0);

    let root = SVGBackend::new(output, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| anyhow::anyhow!("chart fill failed: {e}"))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&config.title, ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(first..last, (lo - pad)..(hi + pad))
        .map_err(|e| anyhow::anyhow!("chart build failed: {e}"))?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Closing Price")
        .x_labels(8)
        .x_label_formatter(&|ts: &DateTime<Utc>| ts.format("%Y-%m-%d").to_string())
        .draw()
        .map_err(|e| anyhow::anyhow!("chart mesh failed: {e}"))?;

    for (i, symbol) in view.prices.columns().iter().enumerate() {
        let series = view.prices.series(symbol);
        if series.is_empty() {
            continue;
        }
        let color = Palette99::pick(i).to_rgba();
        chart
            .draw_series(LineSeries::new(series, color.stroke_width(2)))
            .map_err(|e| anyhow::anyhow!("line series failed: {e}"))?
            .label(symbol.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
            });
    }

    // Only in-tolerance events carry a y-coordinate; the rest are listed
    // textually by the caller instead of drawn.
    let markers = events
        .iter()
        .filter_map(|e| e.aligned_price.map(|price| (e.news_timestamp, price)));
    chart
        .draw_series(
            markers.map(|(ts, price)| Circle::new((ts, price), 5, BLACK.filled())),
        )
        .map_err(|e| anyhow::anyhow!("news markers failed: {e}"))?;

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.85))
        .draw()
        .map_err(|e| anyhow::anyhow!("chart legend failed: {e}"))?;

    root.present()
        .with_context(|| format!("failed to write chart to {}", output.display()))?;

    tracing::info!(output = %output.display(), "Chart written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::NewsItem;
    use crate::retrieve::{align, default_tolerance, PriceTable};
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn view() -> MarketView {
        let mut series = BTreeMap::new();
        let mut aapl = BTreeMap::new();
        for (day, close) in [(15, 100.0), (16, 101.0), (17, 102.0)] {
            aapl.insert(ts(day), close);
        }
        series.insert("AAPL".to_string(), aapl);
        let prices = PriceTable::from_series(
            &["AAPL".to_string(), "MSFT".to_string()],
            &series,
        );
        MarketView {
            prices,
            news: BTreeMap::new(),
        }
    }

    #[test]
    fn test_render_writes_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        let news = vec![NewsItem {
            symbol: "AAPL".to_string(),
            timestamp: ts(16),
            id: 1,
            headline: "h".to_string(),
            summary: String::new(),
            source: String::new(),
            url: String::new(),
            category: None,
        }];
        let view = view();
        let events = align(&news, &view.prices.series("AAPL"), default_tolerance());
        render(&view, &events, &path, &ChartConfig::default()).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("AAPL"));
    }

    #[test]
    fn test_render_empty_view_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        let empty = MarketView {
            prices: PriceTable::from_series(&["AAPL".to_string()], &BTreeMap::new()),
            news: BTreeMap::new(),
        };
        let result = render(&empty, &[], &path, &ChartConfig::default());
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_render_skips_empty_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        render(&view(), &[], &path, &ChartConfig::default()).unwrap();
        assert!(path.exists());
    }
}
