//! HTTP client for a LanguageTool server (`POST /v2/check`).

use std::time::Duration;

use async_trait::async_trait;
use sentfix_core::GrammarMatch;
use serde::Deserialize;
use tracing::info;

use crate::corrector::{GrammarBackend, GrammarError};

/// LanguageTool HTTP backend.
pub struct LanguageToolClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct CheckResponse {
    matches: Vec<LtMatch>,
}

#[derive(Deserialize)]
struct LtMatch {
    #[serde(default)]
    message: String,
    offset: usize,
    length: usize,
    #[serde(default)]
    replacements: Vec<LtReplacement>,
    rule: Option<LtRule>,
}

#[derive(Deserialize)]
struct LtReplacement {
    value: String,
}

#[derive(Deserialize)]
struct LtRule {
    id: String,
}

impl From<LtMatch> for GrammarMatch {
    fn from(m: LtMatch) -> Self {
        GrammarMatch {
            offset: m.offset,
            length: m.length,
            replacements: m.replacements.into_iter().map(|r| r.value).collect(),
            message: m.message,
            rule_id: m.rule.map(|r| r.id),
        }
    }
}

impl LanguageToolClient {
    /// Create a client for the given server, e.g. `http://localhost:8081`.
    ///
    /// `timeout` bounds each check request end to end.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, GrammarError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl GrammarBackend for LanguageToolClient {
    async fn check(&self, text: &str, locale: &str) -> Result<Vec<GrammarMatch>, GrammarError> {
        let url = format!("{}/v2/check", self.base_url);

        info!(url = %url, locale, "checking sentence with LanguageTool");
        let resp = self
            .client
            .post(&url)
            .form(&[("text", text), ("language", locale)])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GrammarError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        parse_check_response(&body)
    }
}

fn parse_check_response(body: &str) -> Result<Vec<GrammarMatch>, GrammarError> {
    let parsed: CheckResponse = serde_json::from_str(body)?;
    Ok(parsed.matches.into_iter().map(GrammarMatch::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_check_response() {
        let body = r#"{
            "software": {"name": "LanguageTool", "version": "6.4"},
            "language": {"name": "English (GB)", "code": "en-GB"},
            "matches": [{
                "message": "The verb 'go' does not agree with the subject.",
                "shortMessage": "Agreement error",
                "replacements": [{"value": "goes"}, {"value": "went"}],
                "offset": 3,
                "length": 2,
                "context": {"text": "He go to school", "offset": 3, "length": 2},
                "sentence": "He go to school",
                "rule": {"id": "HE_VERB_AGR", "description": "Agreement", "issueType": "grammar"}
            }]
        }"#;
        let matches = parse_check_response(body).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].offset, 3);
        assert_eq!(matches[0].length, 2);
        assert_eq!(matches[0].replacements, vec!["goes", "went"]);
        assert_eq!(matches[0].rule_id.as_deref(), Some("HE_VERB_AGR"));
    }

    #[test]
    fn empty_match_list() {
        let matches = parse_check_response(r#"{"matches": []}"#).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn malformed_body_is_json_error() {
        let result = parse_check_response("<html>502 Bad Gateway</html>");
        assert!(matches!(result, Err(GrammarError::Json(_))));
    }

    /// Accepts connections and never answers.
    async fn silent_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn slow_server_is_timeout() {
        let client =
            LanguageToolClient::new(silent_server().await, Duration::from_millis(200)).unwrap();
        let result = client.check("He go to school", "en-GB").await;
        assert!(matches!(result, Err(GrammarError::Timeout(_))), "{result:?}");
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client =
            LanguageToolClient::new("http://localhost:8081/".into(), Duration::from_secs(5))
                .unwrap();
        assert_eq!(client.base_url, "http://localhost:8081");
    }
}
