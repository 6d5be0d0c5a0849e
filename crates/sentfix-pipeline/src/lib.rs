//! Orchestrates the correction stages for a single request.

mod error;
mod pipeline;

pub use error::PipelineError;
pub use pipeline::{CorrectionOutcome, CorrectionPipeline, PersistStatus, Stage};
