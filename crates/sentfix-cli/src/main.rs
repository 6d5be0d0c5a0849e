mod config;
mod display;
mod serve;

use anyhow::Context;
use clap::Parser;
use sentfix_core::CorrectionRequest;

use crate::config::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("sentfix v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    match cli.command {
        Command::Correct {
            sentence,
            force_llm,
            verbose,
        } => {
            let pipeline = cli.config.build_pipeline()?;
            let request = CorrectionRequest::new(sentence, force_llm)?;
            let outcome = pipeline
                .correct(&request)
                .await
                .context("correcting sentence")?;
            if verbose {
                display::print_outcome(&outcome);
            } else {
                println!("{}", outcome.corrected_text);
            }
        }
        Command::ServeStdin { concurrency } => {
            let pipeline = cli.config.build_pipeline()?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            serve::serve_lines(&pipeline, stdin, tokio::io::stdout(), concurrency).await?;
        }
        Command::Patterns { limit } => {
            let store = cli.config.open_store()?;
            let records = store.top_patterns(limit).context("listing patterns")?;
            let total = store.pattern_count().context("counting patterns")?;
            display::print_pattern_table(&records, total);
        }
        Command::Show { id } => {
            let store = cli.config.open_store()?;
            let record = store
                .get(id)
                .with_context(|| format!("loading pattern {id}"))?;
            display::print_pattern_card(&record);
        }
    }
    Ok(())
}
