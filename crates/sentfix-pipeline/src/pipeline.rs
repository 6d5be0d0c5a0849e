use std::sync::Arc;

use sentfix_ai::LlmRefiner;
use sentfix_core::{
    CorrectSentenceRequest, CorrectionRequest, GrammarMatch, Refinement, analyze,
};
use sentfix_grammar::GrammarCorrector;
use sentfix_store::{Occurrence, PatternStore};
use tracing::{info, warn};

use crate::PipelineError;

/// Pipeline states, in the only order they can occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    GrammarChecked,
    Refined,
    Analyzed,
    Persisted,
    Done,
}

/// What happened to the analysis record for this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistStatus {
    /// Refinement was not requested; nothing is recorded.
    Skipped,
    Recorded {
        id: i64,
        was_new: bool,
        occurrence_count: u64,
    },
    /// The store write failed and was rolled back.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct CorrectionOutcome {
    /// Final text returned to the caller.
    pub corrected_text: String,
    pub grammar_corrected: String,
    pub matches: Vec<GrammarMatch>,
    /// `None` when refinement was not requested.
    pub refinement: Option<Refinement>,
    pub persist: PersistStatus,
    /// Stages visited, in order.
    pub stages: Vec<Stage>,
}

/// Grammar check, optional refinement, analysis, and pattern recording.
///
/// Only a grammar-stage failure aborts a request. Refinement falls back to
/// its input and store failures are logged, so a refined request always
/// returns text. Instances share nothing but the store and can run
/// concurrently.
#[derive(Clone)]
pub struct CorrectionPipeline {
    grammar: GrammarCorrector,
    refiner: LlmRefiner,
    store: Arc<dyn PatternStore>,
}

impl CorrectionPipeline {
    pub fn new(grammar: GrammarCorrector, refiner: LlmRefiner, store: Arc<dyn PatternStore>) -> Self {
        Self {
            grammar,
            refiner,
            store,
        }
    }

    /// `correctSentence`: validate, run the pipeline, return the final text.
    pub async fn correct_sentence(
        &self,
        request: CorrectSentenceRequest,
    ) -> Result<String, PipelineError> {
        let request = CorrectionRequest::try_from(request)?;
        Ok(self.correct(&request).await?.corrected_text)
    }

    /// Run every stage for `request` and report what each produced.
    pub async fn correct(
        &self,
        request: &CorrectionRequest,
    ) -> Result<CorrectionOutcome, PipelineError> {
        let original = request.sentence.as_str();
        let mut stages = vec![Stage::Received];
        info!(sentence = %original, force_refine = request.force_refine, "correction received");

        let (grammar_corrected, matches) = self.grammar.check(original).await?;
        stages.push(Stage::GrammarChecked);

        if !request.force_refine {
            stages.push(Stage::Done);
            return Ok(CorrectionOutcome {
                corrected_text: grammar_corrected.clone(),
                grammar_corrected,
                matches,
                refinement: None,
                persist: PersistStatus::Skipped,
                stages,
            });
        }

        let refine_input = if grammar_corrected.is_empty() {
            original
        } else {
            grammar_corrected.as_str()
        };
        let refinement = self.refiner.refine_detailed(refine_input).await;
        stages.push(Stage::Refined);

        let refined = refinement.text().to_string();
        let analysis = analyze(original, &grammar_corrected, &refined);
        stages.push(Stage::Analyzed);

        let occurrence = Occurrence {
            original_sentence: original.to_string(),
            language_tool_corrected: grammar_corrected.clone(),
            llm_refined_sentence: refined.clone(),
            diff_details: analysis.diff_details,
            miss_type: analysis.miss_type,
            refinement_failed: refinement.is_fallback(),
        };
        let persist = self.persist(occurrence).await;
        if matches!(persist, PersistStatus::Recorded { .. }) {
            stages.push(Stage::Persisted);
        }
        stages.push(Stage::Done);

        Ok(CorrectionOutcome {
            corrected_text: refined,
            grammar_corrected,
            matches,
            refinement: Some(refinement),
            persist,
            stages,
        })
    }

    /// Record the occurrence on the blocking pool.
    ///
    /// The write runs to completion (commit or rollback) even if the caller
    /// drops this future.
    async fn persist(&self, occurrence: Occurrence) -> PersistStatus {
        let store = Arc::clone(&self.store);
        let result =
            tokio::task::spawn_blocking(move || store.record_occurrence(&occurrence)).await;

        match result {
            Ok(Ok(outcome)) => PersistStatus::Recorded {
                id: outcome.record.id,
                was_new: outcome.was_new,
                occurrence_count: outcome.record.occurrence_count,
            },
            Ok(Err(e)) => {
                warn!(error = %e, "pattern recording failed");
                PersistStatus::Failed(e.to_string())
            }
            Err(e) => {
                warn!(error = %e, "pattern recording task failed");
                PersistStatus::Failed(e.to_string())
            }
        }
    }
}
