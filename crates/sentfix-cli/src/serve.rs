//! JSON-lines service boundary for `correctSentence`.
//!
//! Each input line is a `{"sentence": .., "forceLLM": ..}` request. Each output
//! line is either `{"correctedText": ..}` or `{"status": .., "error": ..}`, in
//! input order. Up to `concurrency` requests are in flight at once.

use futures::stream::{self, StreamExt};
use sentfix_core::{CorrectSentenceRequest, CorrectionResponse, ErrorResponse};
use sentfix_pipeline::CorrectionPipeline;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

/// Answer every request line from `input` on `output`. Returns the number of
/// requests handled.
pub async fn serve_lines<R, W>(
    pipeline: &CorrectionPipeline,
    input: R,
    mut output: W,
    concurrency: usize,
) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let lines = stream::unfold(input.lines(), |mut lines| async move {
        match lines.next_line().await {
            Ok(Some(line)) => Some((line, lines)),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "stopped reading requests");
                None
            }
        }
    });

    let mut responses = std::pin::pin!(
        lines
            .filter(|line| futures::future::ready(!line.trim().is_empty()))
            .map(|line| handle_line(pipeline, line))
            .buffered(concurrency.max(1))
    );

    let mut handled = 0;
    while let Some(response) = responses.next().await {
        let response = response?;
        output.write_all(response.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
        handled += 1;
    }
    info!(handled, "input closed");
    Ok(handled)
}

async fn handle_line(pipeline: &CorrectionPipeline, line: String) -> serde_json::Result<String> {
    let request: CorrectSentenceRequest = match serde_json::from_str(&line) {
        Ok(request) => request,
        Err(e) => {
            return serde_json::to_string(&ErrorResponse {
                status: 400,
                error: format!("invalid request: {e}"),
            });
        }
    };

    match pipeline.correct_sentence(request).await {
        Ok(corrected_text) => serde_json::to_string(&CorrectionResponse { corrected_text }),
        Err(e) => serde_json::to_string(&ErrorResponse {
            status: e.status_code(),
            error: e.to_string(),
        }),
    }
}
