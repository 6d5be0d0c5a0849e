//! Command-line and environment configuration, and pipeline wiring.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sentfix_ai::{GeminiClient, LlmRefiner};
use sentfix_grammar::{GrammarCorrector, LanguageToolClient};
use sentfix_pipeline::CorrectionPipeline;
use sentfix_store::{DuckPatternStore, PatternStore};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "sentfix", version, about = "Sentence correction with recurring-error analysis")]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Correct a single sentence and print the result.
    Correct {
        sentence: String,
        /// Refine with the language model and record the analysis.
        #[arg(long = "force-llm")]
        force_llm: bool,
        /// Print the full outcome (matches, refinement, record) instead of the text.
        #[arg(long)]
        verbose: bool,
    },
    /// Read `{"sentence", "forceLLM"}` JSON lines on stdin, answer one JSON line each.
    ServeStdin {
        /// Requests processed concurrently.
        #[arg(long, default_value_t = 8)]
        concurrency: usize,
    },
    /// List the most frequent recorded patterns.
    Patterns {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show one recorded pattern with its diff.
    Show { id: i64 },
}

#[derive(Args)]
pub struct Config {
    /// DuckDB file for recorded patterns (in-memory when omitted).
    #[arg(long, env = "SENTFIX_DB", global = true)]
    pub db: Option<PathBuf>,

    #[arg(
        long,
        env = "LANGUAGETOOL_URL",
        default_value = "http://localhost:8081",
        global = true
    )]
    pub languagetool_url: String,

    #[arg(long, env = "SENTFIX_LOCALE", default_value = "en-GB", global = true)]
    pub locale: String,

    #[arg(long, env = "GEMINI_API_KEY", default_value = "", hide_env_values = true, global = true)]
    pub gemini_api_key: String,

    #[arg(
        long,
        env = "GEMINI_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com",
        global = true
    )]
    pub gemini_url: String,

    #[arg(long, env = "SENTFIX_MODEL", default_value = "gemini-2.0-flash", global = true)]
    pub model: String,

    /// Timeout for each grammar or model request.
    #[arg(long, env = "SENTFIX_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub timeout_secs: u64,
}

impl Config {
    pub fn open_store(&self) -> anyhow::Result<Arc<dyn PatternStore>> {
        let store = match &self.db {
            Some(path) => DuckPatternStore::open_persistent(path)
                .with_context(|| format!("opening pattern store at {}", path.display()))?,
            None => {
                info!("no --db given, recording patterns in memory");
                DuckPatternStore::open().context("opening in-memory pattern store")?
            }
        };
        Ok(Arc::new(store))
    }

    pub fn build_pipeline(&self) -> anyhow::Result<CorrectionPipeline> {
        let timeout = Duration::from_secs(self.timeout_secs);

        let languagetool = LanguageToolClient::new(self.languagetool_url.clone(), timeout)
            .context("building LanguageTool client")?;
        let grammar = GrammarCorrector::new(Arc::new(languagetool), self.locale.clone());

        if self.gemini_api_key.is_empty() {
            warn!("GEMINI_API_KEY is not set, refinement will fall back to grammar output");
        }
        let gemini = GeminiClient::new(
            self.gemini_url.clone(),
            self.model.clone(),
            self.gemini_api_key.clone(),
            timeout,
        )
        .context("building Gemini client")?;
        let refiner = LlmRefiner::new(Arc::new(gemini));

        Ok(CorrectionPipeline::new(grammar, refiner, self.open_store()?))
    }
}
