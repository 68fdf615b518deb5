//! Ingestion outcome reporting

use crate::error::ErrorKind;

/// Outcome of one ingestion sub-flow (price or news) for one symbol.
///
/// Distinguishes "nothing to do" shapes from failures so callers never have
/// to guess whether a zero-write run lost data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Records fetched and written
    Written(usize),
    /// Existence check found the range already ingested
    SkippedExisting,
    /// Provider had no records for the range (non-trading days, no coverage)
    Empty,
    /// Feature not configured (news without an API key)
    Disabled,
    /// Fetch or write failed
    Failed(ErrorKind),
}

impl FlowOutcome {
    /// Whether the sub-flow counts as successful. `Disabled` is not-ok:
    /// the requested data kind was not ingested. It stays distinct from
    /// `Failed` so reports read "disabled", not "error".
    pub fn is_ok(&self) -> bool {
        match self {
            FlowOutcome::Written(_) | FlowOutcome::SkippedExisting | FlowOutcome::Empty => true,
            FlowOutcome::Disabled | FlowOutcome::Failed(_) => false,
        }
    }

    /// Whether the sub-flow hit an actual error, as opposed to being
    /// switched off or having nothing to do.
    pub fn is_failure(&self) -> bool {
        matches!(self, FlowOutcome::Failed(_))
    }

    /// Points written by this sub-flow.
    pub fn written(&self) -> usize {
        match self {
            FlowOutcome::Written(n) => *n,
            _ => 0,
        }
    }
}

impl std::fmt::Display for FlowOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowOutcome::Written(n) => write!(f, "written({})", n),
            FlowOutcome::SkippedExisting => f.write_str("skipped"),
            FlowOutcome::Empty => f.write_str("empty"),
            FlowOutcome::Disabled => f.write_str("disabled"),
            FlowOutcome::Failed(kind) => write!(f, "failed({})", kind),
        }
    }
}

/// Aggregated result of both sub-flows for one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolReport {
    pub symbol: String,
    pub price: FlowOutcome,
    pub news: FlowOutcome,
}

impl SymbolReport {
    /// Overall success: both sub-flows ok.
    pub fn success(&self) -> bool {
        self.price.is_ok() && self.news.is_ok()
    }

    /// Whether either sub-flow hit an actual error.
    pub fn has_failure(&self) -> bool {
        self.price.is_failure() || self.news.is_failure()
    }

    /// Total points written for this symbol.
    pub fn points_written(&self) -> usize {
        self.price.written() + self.news.written()
    }
}
