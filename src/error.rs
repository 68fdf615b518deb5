//! Error taxonomy shared across the pipeline
//!
//! Sub-flows never expose raw provider errors to the coordinator's caller;
//! they are reduced to an [`ErrorKind`] carried inside the flow outcome so
//! "no data" stays distinguishable from "operation failed".

use thiserror::Error;

/// Classification of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Store or provider unreachable
    Connection,
    /// Malformed date or symbol input
    Validation,
    /// Provider call failed (network, auth, rate limit)
    Fetch,
    /// Store write failed
    Write,
    /// Store query failed
    Query,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Connection => "connection",
            ErrorKind::Validation => "validation",
            ErrorKind::Fetch => "fetch",
            ErrorKind::Write => "write",
            ErrorKind::Query => "query",
        };
        f.write_str(s)
    }
}

/// Malformed input rejected before any side effects.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Date string did not parse as YYYY-MM-DD
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    BadDate(String),
    /// Start date after end date
    #[error("start date {start} is after end date {end}")]
    InvertedRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
    /// Empty or malformed ticker symbol
    #[error("invalid symbol '{0}'")]
    BadSymbol(String),
}

/// A provider call that did not produce records.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider returned a non-success status
    #[error("provider returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    /// Response body did not match the expected shape
    #[error("failed to decode provider response: {0}")]
    Decode(String),
}
