//! Data model shared by every pipeline stage.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected before any stage runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sentence must contain at least one non-whitespace character")]
pub struct MalformedInput;

/// A validated correction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionRequest {
    pub sentence: String,
    /// Run the refinement stage and record the analysis.
    pub force_refine: bool,
}

impl CorrectionRequest {
    /// Build a request, rejecting empty or whitespace-only sentences.
    pub fn new(sentence: impl Into<String>, force_refine: bool) -> Result<Self, MalformedInput> {
        let sentence = sentence.into();
        if sentence.trim().is_empty() {
            return Err(MalformedInput);
        }
        Ok(Self {
            sentence,
            force_refine,
        })
    }
}

/// One issue reported by the grammar checker.
///
/// `offset` and `length` are in the checker's native units (UTF-16 code units).
/// The core passes matches through and only reads them when applying
/// replacements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarMatch {
    pub offset: usize,
    pub length: usize,
    pub replacements: Vec<String>,
    pub message: String,
    pub rule_id: Option<String>,
}

/// Opcode kind for a word-level diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Equal,
    Replace,
    Delete,
    Insert,
}

impl DiffKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Replace => "replace",
            Self::Delete => "delete",
            Self::Insert => "insert",
        }
    }
}

/// A single opcode transforming a span of original words into a span of
/// refined words. Spans are half-open word-index ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOp {
    pub kind: DiffKind,
    pub original_span: Range<usize>,
    pub refined_span: Range<usize>,
    pub original_text: String,
    pub refined_text: String,
}

impl DiffOp {
    /// Human-readable summary, e.g. `'go' changed to 'goes'`.
    pub fn description(&self) -> String {
        match self.kind {
            DiffKind::Equal => format!("'{}' unchanged", self.original_text),
            DiffKind::Replace => format!(
                "'{}' changed to '{}'",
                self.original_text, self.refined_text
            ),
            DiffKind::Delete => format!("'{}' deleted", self.original_text),
            DiffKind::Insert => format!("'{}' inserted", self.refined_text),
        }
    }
}

/// Which stage, if any, changed the sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissType {
    /// Neither stage changed the text.
    None,
    /// The grammar checker changed the text.
    LtCorrected,
    /// The grammar checker found nothing but the language model rewrote the text.
    LtMissedAndLlmRefined,
}

impl MissType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::LtCorrected => "LT_CORRECTED",
            Self::LtMissedAndLlmRefined => "LT_MISSED_AND_LLM_REFINED",
        }
    }
}

impl fmt::Display for MissType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(Self::None),
            "LT_CORRECTED" => Ok(Self::LtCorrected),
            "LT_MISSED_AND_LLM_REFINED" => Ok(Self::LtMissedAndLlmRefined),
            other => Err(format!("unknown miss type: {other}")),
        }
    }
}

/// Aggregated record of one distinct (original, refined) sentence pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: i64,
    pub original_sentence: String,
    /// Grammar-checker output as of the first insert.
    pub language_tool_corrected: String,
    pub llm_refined_sentence: String,
    pub diff_details: Vec<DiffOp>,
    pub miss_type: MissType,
    pub occurrence_count: u64,
    pub last_detected_at: DateTime<Utc>,
    /// The refiner fell back to its input when this record was created.
    pub refinement_failed: bool,
}

/// Outcome of a best-effort refinement call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refinement {
    Refined(String),
    /// The generative call failed; `text` is the unchanged input.
    Fallback { text: String, reason: String },
}

impl Refinement {
    pub fn text(&self) -> &str {
        match self {
            Self::Refined(text) | Self::Fallback { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Refined(text) | Self::Fallback { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}
