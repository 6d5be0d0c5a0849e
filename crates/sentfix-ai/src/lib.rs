//! Refinement stage: generative rewrite of the grammar-corrected sentence.
//!
//! Refinement is best-effort. [`LlmRefiner`] never returns an error; a failed
//! generation falls back to the input text.

mod gemini;
mod refiner;

pub use gemini::GeminiClient;
pub use refiner::{AiError, GenerationConfig, LlmRefiner, TextGenerator, build_prompt};
