use std::sync::Arc;

use async_trait::async_trait;
use sentfix_core::GrammarMatch;
use thiserror::Error;
use tracing::{debug, info};

use crate::apply::apply_matches;

#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),
    #[error("grammar check timed out: {0}")]
    Timeout(reqwest::Error),
    #[error("grammar server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for GrammarError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e)
        } else {
            Self::Http(e)
        }
    }
}

/// A grammar/spell-checking capability for one locale.
#[async_trait]
pub trait GrammarBackend: Send + Sync {
    async fn check(&self, text: &str, locale: &str) -> Result<Vec<GrammarMatch>, GrammarError>;
}

/// Mandatory first stage of the correction pipeline.
///
/// Deterministic for a fixed backend configuration and input. Backend
/// failures, including timeouts, are returned to the caller unchanged.
#[derive(Clone)]
pub struct GrammarCorrector {
    backend: Arc<dyn GrammarBackend>,
    locale: String,
}

impl GrammarCorrector {
    pub fn new(backend: Arc<dyn GrammarBackend>, locale: impl Into<String>) -> Self {
        Self {
            backend,
            locale: locale.into(),
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Check `sentence` and return the corrected text with the raw matches.
    pub async fn check(
        &self,
        sentence: &str,
    ) -> Result<(String, Vec<GrammarMatch>), GrammarError> {
        let matches = self.backend.check(sentence, &self.locale).await?;
        debug!(?matches, "grammar matches");
        let corrected = apply_matches(sentence, &matches);
        info!(
            matches = matches.len(),
            changed = corrected != sentence,
            "grammar check complete"
        );
        Ok((corrected, matches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedBackend(Vec<GrammarMatch>);

    #[async_trait]
    impl GrammarBackend for FixedBackend {
        async fn check(&self, _: &str, _: &str) -> Result<Vec<GrammarMatch>, GrammarError> {
            Ok(self.0.clone())
        }
    }

    struct DownBackend;

    #[async_trait]
    impl GrammarBackend for DownBackend {
        async fn check(&self, _: &str, _: &str) -> Result<Vec<GrammarMatch>, GrammarError> {
            Err(GrammarError::Server {
                status: 503,
                body: "connection refused".into(),
            })
        }
    }

    #[tokio::test]
    async fn applies_backend_matches() {
        let backend = FixedBackend(vec![GrammarMatch {
            offset: 3,
            length: 2,
            replacements: vec!["goes".into()],
            message: "Possible agreement error".into(),
            rule_id: Some("HE_VERB_AGR".into()),
        }]);
        let corrector = GrammarCorrector::new(Arc::new(backend), "en-GB");
        let (corrected, matches) = corrector.check("He go to school").await.unwrap();
        assert_eq!(corrected, "He goes to school");
        assert_eq!(matches.len(), 1);
        assert_eq!(corrector.locale(), "en-GB");
    }

    #[tokio::test]
    async fn backend_failure_propagates() {
        let corrector = GrammarCorrector::new(Arc::new(DownBackend), "en-GB");
        let result = corrector.check("He go to school").await;
        assert!(matches!(result, Err(GrammarError::Server { status: 503, .. })));
    }
}
