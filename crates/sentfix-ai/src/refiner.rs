use std::sync::Arc;

use async_trait::async_trait;
use sentfix_core::Refinement;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum AiError {
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),
    #[error("model request timed out: {0}")]
    Timeout(reqwest::Error),
    #[error("model server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response contained no generated text")]
    MissingContent,
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e)
        } else {
            Self::Http(e)
        }
    }
}

/// Fixed generation parameters. Never supplied per request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 200,
        }
    }
}

/// A generative-text capability.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, AiError>;
}

const INSTRUCTIONS: &str = "\
You are an expert English grammar and style corrector. \
Your task is to correct and refine the given sentence while strictly maintaining its original meaning and nuance. \
Ensure the output is grammatically perfect, natural, and concise. \
If the original sentence is already perfect, return it as is. \
Respond with the refined sentence only.";

/// Prompt sent to the model for `text`.
pub fn build_prompt(text: &str) -> String {
    format!("{INSTRUCTIONS}\n\nOriginal: \"{text}\"\n")
}

/// Best-effort refinement over a [`TextGenerator`].
#[derive(Clone)]
pub struct LlmRefiner {
    generator: Arc<dyn TextGenerator>,
    config: GenerationConfig,
}

impl LlmRefiner {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            config: GenerationConfig::default(),
        }
    }

    /// Refine `text`, reporting whether the result is a fallback.
    ///
    /// Generated text is trimmed; an empty generation counts as a failure.
    pub async fn refine_detailed(&self, text: &str) -> Refinement {
        let prompt = build_prompt(text);
        let reason = match self.generator.generate(&prompt, &self.config).await {
            Ok(generated) => {
                let refined = generated.trim();
                if !refined.is_empty() {
                    info!(changed = refined != text, "refinement complete");
                    return Refinement::Refined(refined.to_string());
                }
                "model returned empty text".to_string()
            }
            Err(e) => e.to_string(),
        };

        warn!(reason = %reason, "refinement failed, keeping input text");
        Refinement::Fallback {
            text: text.to_string(),
            reason,
        }
    }

    /// Refine `text`, returning it unchanged on any failure.
    pub async fn refine(&self, text: &str) -> String {
        self.refine_detailed(text).await.into_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Echo {
        reply: Result<String, String>,
        seen: Mutex<Vec<(String, GenerationConfig)>>,
    }

    impl Echo {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                reply: Err(reason.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for Echo {
        async fn generate(
            &self,
            prompt: &str,
            config: &GenerationConfig,
        ) -> Result<String, AiError> {
            self.seen
                .lock()
                .unwrap()
                .push((prompt.to_string(), *config));
            self.reply
                .clone()
                .map_err(|body| AiError::Server { status: 503, body })
        }
    }

    #[tokio::test]
    async fn returns_trimmed_generation() {
        let refiner = LlmRefiner::new(Arc::new(Echo::ok("  I have an idea.\n")));
        let out = refiner.refine_detailed("I has a idea").await;
        assert_eq!(out, Refinement::Refined("I have an idea.".into()));
    }

    #[tokio::test]
    async fn failure_falls_back_to_input() {
        let refiner = LlmRefiner::new(Arc::new(Echo::failing("connection reset")));
        let out = refiner.refine_detailed("He goes to school").await;
        match out {
            Refinement::Fallback { text, reason } => {
                assert_eq!(text, "He goes to school");
                assert!(reason.contains("connection reset"));
            }
            other => panic!("expected fallback, got {other:?}"),
        }
        assert_eq!(
            refiner.refine("He goes to school").await,
            "He goes to school"
        );
    }

    #[tokio::test]
    async fn empty_generation_is_fallback() {
        let refiner = LlmRefiner::new(Arc::new(Echo::ok("   ")));
        let out = refiner.refine_detailed("Fine.").await;
        assert!(out.is_fallback());
        assert_eq!(out.text(), "Fine.");
    }

    #[tokio::test]
    async fn uses_fixed_generation_config() {
        let generator = Arc::new(Echo::ok("ok"));
        let refiner = LlmRefiner::new(generator.clone());
        refiner.refine("He go to school").await;

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].0.contains("Original: \"He go to school\""));
        assert_eq!(seen[0].1.temperature, 0.7);
        assert_eq!(seen[0].1.max_output_tokens, 200);
    }
}
