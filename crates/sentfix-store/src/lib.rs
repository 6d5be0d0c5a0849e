//! Storage layer: aggregated analysis records keyed by (original, refined) sentence pair.

mod duck;
mod error;
mod pattern;

pub use duck::DuckPatternStore;
pub use error::StoreError;
pub use pattern::{Occurrence, PatternStore, RecordOutcome};
