//! Plain-text rendering of recorded patterns and correction outcomes.

use sentfix_core::{AnalysisRecord, DiffKind};
use sentfix_pipeline::{CorrectionOutcome, PersistStatus};

const MAX_SENTENCE_WIDTH: usize = 60;

/// Print one line per pattern: id, count, miss type, and the sentence pair.
/// `total` is the number of patterns in the store.
pub fn print_pattern_table(records: &[AnalysisRecord], total: usize) {
    if records.is_empty() {
        println!("No patterns recorded.");
        return;
    }
    println!("Top {} of {} patterns", records.len(), total);
    println!();
    println!(
        "{:>6}  {:>5}  {:<26} {}",
        "id", "count", "miss_type", "original -> refined"
    );
    for rec in records {
        println!(
            "{:>6}  {:>5}  {:<26} {} -> {}",
            rec.id,
            rec.occurrence_count,
            rec.miss_type.as_str(),
            shorten(&rec.original_sentence),
            shorten(&rec.llm_refined_sentence),
        );
    }
}

/// Print a single pattern as a vertical card.
pub fn print_pattern_card(rec: &AnalysisRecord) {
    println!("=== pattern {} ===", rec.id);
    println!();

    println!("Sentences");
    println!("  {:<26} {}", "original_sentence", rec.original_sentence);
    println!(
        "  {:<26} {}",
        "language_tool_corrected", rec.language_tool_corrected
    );
    println!("  {:<26} {}", "llm_refined_sentence", rec.llm_refined_sentence);
    println!();

    println!("Analysis");
    println!("  {:<26} {}", "miss_type", rec.miss_type);
    println!(
        "  {:<26} {}",
        "refinement_failed",
        if rec.refinement_failed { "yes" } else { "no" }
    );
    println!("  {:<26} {}", "occurrence_count", rec.occurrence_count);
    println!(
        "  {:<26} {}",
        "last_detected_at",
        rec.last_detected_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    let changes: Vec<_> = rec
        .diff_details
        .iter()
        .filter(|op| op.kind != DiffKind::Equal)
        .collect();
    if changes.is_empty() {
        return;
    }
    println!("Diff ({}):", changes.len());
    for op in changes {
        println!(
            "    {:<8} [{}..{}) -> [{}..{})  {}",
            op.kind.as_str(),
            op.original_span.start,
            op.original_span.end,
            op.refined_span.start,
            op.refined_span.end,
            op.description()
        );
    }
    println!();
}

/// Print the stage-by-stage result of one `correct --verbose` run.
pub fn print_outcome(outcome: &CorrectionOutcome) {
    println!("  {:<26} {:?}", "stages", outcome.stages);
    println!("  {:<26} {}", "grammar_corrected", outcome.grammar_corrected);
    for m in &outcome.matches {
        println!(
            "    @{}+{}  {}  [{}]",
            m.offset,
            m.length,
            m.message,
            m.replacements.join(", ")
        );
    }
    if let Some(refinement) = &outcome.refinement {
        let note = if refinement.is_fallback() {
            " (fallback)"
        } else {
            ""
        };
        println!("  {:<26} {}{}", "refined", refinement.text(), note);
    }
    match &outcome.persist {
        PersistStatus::Skipped => {}
        PersistStatus::Recorded {
            id,
            was_new,
            occurrence_count,
        } => println!(
            "  {:<26} id={} count={}{}",
            "pattern",
            id,
            occurrence_count,
            if *was_new { " (new)" } else { "" }
        ),
        PersistStatus::Failed(reason) => {
            println!("  {:<26} not recorded: {}", "pattern", reason)
        }
    }
    println!("{}", outcome.corrected_text);
}

fn shorten(s: &str) -> String {
    if s.chars().count() > MAX_SENTENCE_WIDTH {
        let head: String = s.chars().take(MAX_SENTENCE_WIDTH - 3).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_sentences_untouched() {
        assert_eq!(shorten("He goes to school"), "He goes to school");
    }

    #[test]
    fn long_sentences_truncated_on_char_boundary() {
        let long = "é".repeat(80);
        let out = shorten(&long);
        assert_eq!(out.chars().count(), MAX_SENTENCE_WIDTH);
        assert!(out.ends_with("..."));
    }
}
