//! JSON shapes at the `correctSentence` service boundary.

use serde::{Deserialize, Serialize};

use crate::model::{CorrectionRequest, MalformedInput};

/// `POST correctSentence` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectSentenceRequest {
    pub sentence: String,
    #[serde(rename = "forceLLM", default)]
    pub force_llm: bool,
}

impl TryFrom<CorrectSentenceRequest> for CorrectionRequest {
    type Error = MalformedInput;

    fn try_from(req: CorrectSentenceRequest) -> Result<Self, Self::Error> {
        CorrectionRequest::new(req.sentence, req.force_llm)
    }
}

/// `POST correctSentence` success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionResponse {
    #[serde(rename = "correctedText")]
    pub corrected_text: String,
}

/// Error body, paired with an HTTP-style status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_llm_defaults_to_false() {
        let req: CorrectSentenceRequest =
            serde_json::from_str(r#"{"sentence": "I want one babies"}"#).unwrap();
        assert!(!req.force_llm);
    }

    #[test]
    fn request_uses_camel_case_flag() {
        let req: CorrectSentenceRequest =
            serde_json::from_str(r#"{"sentence": "He go to school", "forceLLM": true}"#).unwrap();
        let req = CorrectionRequest::try_from(req).unwrap();
        assert!(req.force_refine);
        assert_eq!(req.sentence, "He go to school");
    }

    #[test]
    fn blank_request_is_malformed() {
        let req: CorrectSentenceRequest =
            serde_json::from_str(r#"{"sentence": "   ", "forceLLM": true}"#).unwrap();
        assert!(CorrectionRequest::try_from(req).is_err());
    }

    #[test]
    fn response_field_name() {
        let resp = CorrectionResponse {
            corrected_text: "I want one baby".into(),
        };
        assert_eq!(
            serde_json::to_string(&resp).unwrap(),
            r#"{"correctedText":"I want one baby"}"#
        );
    }
}
