//! Retrieval & alignment
//!
//! Reconstructs an aligned view of price history plus news events from the
//! store: dense price table, per-symbol news lists, and nearest-time
//! alignment for the chart overlay.

mod align;
mod engine;
mod table;

pub use align::{align, default_tolerance, AlignedNewsEvent};
pub use engine::{MarketView, RetrievalEngine};
pub use table::PriceTable;
