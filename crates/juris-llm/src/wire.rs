//! Provider wire format (Gemini `generateContent`).
//!
//! Request:  `{"contents":[{"parts":[{"text":"…"}]}]}`
//! Response: `{"candidates":[{"content":{"parts":[{"text":"…"}]}}]}`
//! Error:    `{"error":{"code":429,"message":"…","status":"RESOURCE_EXHAUSTED"}}`

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
}

impl GenerateRequest {
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: prompt.to_string() }],
            }],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    pub fn answer_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| content.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Extract the answer from a 2xx body. Unparseable bodies yield an empty
/// answer, which the orchestrator treats as degenerate.
pub fn extract_answer(body: &str) -> String {
    serde_json::from_str::<GenerateResponse>(body)
        .map(|resp| resp.answer_text())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct ProviderError {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ProviderError>,
}

impl ProviderError {
    /// Best-effort parse of a non-2xx body; missing fields stay `None`.
    pub fn parse(body: &str) -> Self {
        serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|env| env.error)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let req = GenerateRequest::from_prompt("Is a verbal lease enforceable?");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Is a verbal lease enforceable?");
    }

    #[test]
    fn test_answer_joins_parts_of_first_candidate() {
        let body = r#"{"candidates":[
            {"content":{"parts":[{"text":"Under the statute of frauds, "},{"text":"leases over a year must be written."}]}},
            {"content":{"parts":[{"text":"ignored"}]}}
        ]}"#;
        assert_eq!(
            extract_answer(body),
            "Under the statute of frauds, leases over a year must be written."
        );
    }

    #[test]
    fn test_answer_missing_pieces_is_empty() {
        assert_eq!(extract_answer(r#"{"candidates":[]}"#), "");
        assert_eq!(extract_answer(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#), "");
        assert_eq!(extract_answer("<html>bad gateway</html>"), "");
    }

    #[test]
    fn test_provider_error_parse() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = ProviderError::parse(body);
        assert_eq!(err.code, Some(429));
        assert_eq!(err.message.as_deref(), Some("Quota exceeded"));
        assert_eq!(err.status.as_deref(), Some("RESOURCE_EXHAUSTED"));

        assert_eq!(ProviderError::parse("Service Unavailable"), ProviderError::default());
    }
}
