//! Error taxonomy for the fallback layer.
//!
//! `TransportError` is what a single outbound call can fail with.
//! `FailureKind` is the classified result of one (model, credential, retry)
//! attempt; it never escapes the retry loop except as the `last_error` of a
//! `FailureReport`. `OrchestrationError` is the only thing callers see.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::ledger::CredentialSummary;

// ── Transport ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out after {:.1}s", .after.as_secs_f64())]
    Timeout { after: Duration },
    #[error("network error: {0}")]
    Network(String),
    /// Anything that is neither a timeout nor a connection-level failure
    /// (malformed request, undecodable body, …).
    #[error("request error: {0}")]
    Request(String),
}

// ── Attempt-level failures ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("network error: {detail}")]
    Network { detail: String },
    #[error("request error: {detail}")]
    Request { detail: String },
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        /// Provider-side status string, e.g. `RESOURCE_EXHAUSTED`.
        #[serde(skip_serializing_if = "Option::is_none")]
        provider_status: Option<String>,
    },
    #[error("degenerate response: {chars} characters of answer text")]
    DegenerateResponse { chars: usize },
}

impl FailureKind {
    /// Whether the same (model, credential) pair may be tried again.
    pub fn is_retryable(&self) -> bool {
        match self {
            FailureKind::Timeout { .. } | FailureKind::Network { .. } => true,
            FailureKind::Http { status, .. } => matches!(status, 429 | 503),
            FailureKind::Request { .. } | FailureKind::DegenerateResponse { .. } => false,
        }
    }

    /// HTTP-level failures count against the credential on every attempt,
    /// transport failures only once the pair gives up.
    pub fn is_protocol_failure(&self) -> bool {
        matches!(self, FailureKind::Http { .. })
    }
}

impl From<TransportError> for FailureKind {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout { after } => FailureKind::Timeout {
                timeout_ms: after.as_millis() as u64,
            },
            TransportError::Network(detail) => FailureKind::Network { detail },
            TransportError::Request(detail) => FailureKind::Request { detail },
        }
    }
}

/// A failed attempt together with where it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptFailure {
    pub model: String,
    pub credential: String,
    pub retry_index: u32,
    #[serde(flatten)]
    pub kind: FailureKind,
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} via {} (retry {}): {}",
            self.model, self.credential, self.retry_index, self.kind
        )
    }
}

// ── Orchestration ─────────────────────────────────────────────────────────────

/// Diagnostic payload carried by an exhausted fallback run.
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub attempts: u32,
    pub credentials: Vec<CredentialSummary>,
    pub last_error: Option<AttemptFailure>,
}

#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("fallback exhausted after {} attempts", .0.attempts)]
    ExhaustedFallback(FailureReport),
    #[error("orchestration cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}

impl OrchestrationError {
    pub fn attempts(&self) -> u32 {
        match self {
            OrchestrationError::ExhaustedFallback(report) => report.attempts,
            OrchestrationError::Cancelled { attempts } => *attempts,
        }
    }

    pub fn last_error(&self) -> Option<&AttemptFailure> {
        match self {
            OrchestrationError::ExhaustedFallback(report) => report.last_error.as_ref(),
            OrchestrationError::Cancelled { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> FailureKind {
        FailureKind::Http { status, message: "x".into(), provider_status: None }
    }

    #[test]
    fn test_retryable_classes() {
        assert!(FailureKind::Timeout { timeout_ms: 100 }.is_retryable());
        assert!(FailureKind::Network { detail: "connection reset".into() }.is_retryable());
        assert!(http(429).is_retryable());
        assert!(http(503).is_retryable());
    }

    #[test]
    fn test_terminal_classes() {
        for status in [400, 401, 403, 404, 500, 502, 504] {
            assert!(!http(status).is_retryable(), "{status} should not be retried");
        }
        assert!(!FailureKind::DegenerateResponse { chars: 10 }.is_retryable());
        assert!(!FailureKind::Request { detail: "bad url".into() }.is_retryable());
    }

    #[test]
    fn test_transport_error_conversion_keeps_timeout() {
        let kind: FailureKind = TransportError::Timeout { after: Duration::from_millis(1500) }.into();
        assert_eq!(kind, FailureKind::Timeout { timeout_ms: 1500 });
        assert_eq!(
            TransportError::Timeout { after: Duration::from_millis(1500) }.to_string(),
            "request timed out after 1.5s"
        );
    }

    #[test]
    fn test_attempt_failure_serialises_flat() {
        let failure = AttemptFailure {
            model: "gemini-2.0-flash".into(),
            credential: "Primary".into(),
            retry_index: 2,
            kind: http(429),
        };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["kind"], "http");
        assert_eq!(json["status"], 429);
        assert_eq!(json["retry_index"], 2);
        assert!(json.get("provider_status").is_none());
    }
}
