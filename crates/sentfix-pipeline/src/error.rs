use sentfix_core::MalformedInput;
use sentfix_grammar::GrammarError;
use thiserror::Error;

/// Failures that reach the caller. Refinement and persistence failures are
/// recovered inside the pipeline and never appear here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("malformed input: {0}")]
    MalformedInput(#[from] MalformedInput),

    #[error("grammar check failed: {0}")]
    UpstreamGrammar(#[from] GrammarError),
}

impl PipelineError {
    /// HTTP-style status for the service boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MalformedInput(_) => 400,
            Self::UpstreamGrammar(_) => 502,
        }
    }
}
