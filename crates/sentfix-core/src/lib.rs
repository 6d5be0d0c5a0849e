pub mod api;
pub mod diff;
pub mod model;

pub use api::{CorrectSentenceRequest, CorrectionResponse, ErrorResponse};
pub use diff::{Analysis, analyze, classify, diff};
pub use model::{
    AnalysisRecord, CorrectionRequest, DiffKind, DiffOp, GrammarMatch, MalformedInput, MissType,
    Refinement,
};
