//! Dense price table

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Closing prices as a dense (timestamp x symbol) matrix.
///
/// The index is strictly increasing UTC; every requested symbol gets a
/// column even when it contributed no data, and cells without a price are
/// `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    index: Vec<DateTime<Utc>>,
    columns: Vec<String>,
    /// Column-major: `cells[col][row]`
    cells: Vec<Vec<Option<f64>>>,
}

impl PriceTable {
    /// Build from sparse per-symbol series. `symbols` fixes the column set
    /// and order; series for symbols outside it are ignored.
    pub fn from_series(
        symbols: &[String],
        series: &BTreeMap<String, BTreeMap<DateTime<Utc>, f64>>,
    ) -> Self {
        let mut stamps: BTreeSet<DateTime<Utc>> = BTreeSet::new();
        for symbol in symbols {
            if let Some(points) = series.get(symbol) {
                stamps.extend(points.keys().copied());
            }
        }
        let index: Vec<_> = stamps.into_iter().collect();

        let cells = symbols
            .iter()
            .map(|symbol| {
                let points = series.get(symbol);
                index
                    .iter()
                    .map(|ts| points.and_then(|p| p.get(ts).copied()))
                    .collect()
            })
            .collect();

        Self {
            index,
            columns: symbols.to_vec(),
            cells,
        }
    }

    /// Sorted, deduplicated timestamps.
    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    /// Column names in requested order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Dense column for one symbol, aligned with [`Self::index`].
    pub fn column(&self, symbol: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .position(|c| c == symbol)
            .map(|i| self.cells[i].as_slice())
    }

    /// The non-missing (timestamp, price) pairs for one symbol, in index
    /// order. This is the series the alignment step works against.
    pub fn series(&self, symbol: &str) -> Vec<(DateTime<Utc>, f64)> {
        match self.column(symbol) {
            Some(cells) => self
                .index
                .iter()
                .zip(cells)
                .filter_map(|(ts, cell)| cell.map(|price| (*ts, price)))
                .collect(),
            None => Vec::new(),
        }
    }

    /// True when no symbol contributed any data.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Bounds of all present prices, for chart scaling.
    pub fn price_bounds(&self) -> Option<(f64, f64)> {
        let mut bounds: Option<(f64, f64)> = None;
        for column in &self.cells {
            for price in column.iter().flatten() {
                bounds = Some(match bounds {
                    Some((lo, hi)) => (lo.min(*price), hi.max(*price)),
                    None => (*price, *price),
                });
            }
        }
        bounds
    }
}
