//! Incremental ingestion
//!
//! Per-symbol, per-measurement ingestion with a pre-flight existence check
//! so repeated runs over overlapping date ranges never duplicate data.

mod coordinator;
mod exists;
mod report;

pub use coordinator::IngestionCoordinator;
pub use exists::ExistenceChecker;
pub use report::{FlowOutcome, SymbolReport};

use crate::error::ValidationError;
use chrono::NaiveDate;

/// A validated per-symbol ingestion request over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionRequest {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl IngestionRequest {
    /// Build a request from already-typed dates.
    pub fn new(
        symbol: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let symbol = symbol.into();
        if symbol.is_empty()
            || symbol.len() > 12
            || !symbol
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
        {
            return Err(ValidationError::BadSymbol(symbol));
        }
        if start > end {
            return Err(ValidationError::InvertedRange { start, end });
        }
        Ok(Self { symbol, start, end })
    }

    /// Parse a request from string dates in `YYYY-MM-DD` form.
    pub fn parse(symbol: &str, start: &str, end: &str) -> Result<Self, ValidationError> {
        let start = parse_date(start)?;
        let end = parse_date(end)?;
        Self::new(symbol, start, end)
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| ValidationError::BadDate(s.to_string()))
}
