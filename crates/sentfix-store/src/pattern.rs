use sentfix_core::{AnalysisRecord, DiffOp, MissType};

use crate::StoreError;

/// One observed (original, refined) pair with the analysis computed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub original_sentence: String,
    pub language_tool_corrected: String,
    pub llm_refined_sentence: String,
    pub diff_details: Vec<DiffOp>,
    pub miss_type: MissType,
    pub refinement_failed: bool,
}

/// Result of [`PatternStore::record_occurrence`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    pub record: AnalysisRecord,
    /// `true` when this call created the record.
    pub was_new: bool,
}

/// Persistent aggregation of analysis records.
///
/// Implementations must make `record_occurrence` atomic per key pair:
/// concurrent calls for the same pair serialize into one record whose count
/// rises by exactly one per call, and a failed call commits nothing.
pub trait PatternStore: Send + Sync {
    /// Insert a new record with count 1, or bump the count and detection time
    /// of the existing record for `(original_sentence, llm_refined_sentence)`.
    ///
    /// On a repeat, the stored diff, miss type, grammar output and
    /// refinement flag from the first insert are kept as they are.
    fn record_occurrence(&self, occurrence: &Occurrence) -> Result<RecordOutcome, StoreError>;

    fn get(&self, id: i64) -> Result<AnalysisRecord, StoreError>;

    /// Most frequent patterns first, most recently seen first among equals.
    fn top_patterns(&self, limit: usize) -> Result<Vec<AnalysisRecord>, StoreError>;

    /// Number of distinct patterns recorded.
    fn pattern_count(&self) -> Result<usize, StoreError>;
}
