//! Grammar stage: a deterministic checker behind [`GrammarBackend`], plus the
//! transform that applies its suggested replacements.

mod apply;
mod corrector;
mod languagetool;

pub use apply::apply_matches;
pub use corrector::{GrammarBackend, GrammarCorrector, GrammarError};
pub use languagetool::LanguageToolClient;
