//! Maps an orchestration outcome onto the payload handed back to callers.
//!
//! Failures are categorised from the structured `FailureKind` of the last
//! error, never from its text. The user-facing `error` string is fixed per
//! category; provider detail only ever appears under `details`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{FailureKind, OrchestrationError};
use crate::ledger::CredentialSummary;
use crate::orchestrator::Success;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    Timeout,
    QuotaExceeded,
    NetworkError,
    Unknown,
}

impl ErrorCategory {
    pub fn classify(kind: Option<&FailureKind>) -> Self {
        match kind {
            Some(FailureKind::Timeout { .. }) => ErrorCategory::Timeout,
            Some(FailureKind::Network { .. }) => ErrorCategory::NetworkError,
            Some(FailureKind::Http { status: 429, .. }) => ErrorCategory::QuotaExceeded,
            Some(FailureKind::Http { provider_status: Some(s), .. }) if s == "RESOURCE_EXHAUSTED" => {
                ErrorCategory::QuotaExceeded
            }
            _ => ErrorCategory::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Timeout       => "TIMEOUT",
            ErrorCategory::QuotaExceeded => "QUOTA_EXCEEDED",
            ErrorCategory::NetworkError  => "NETWORK_ERROR",
            ErrorCategory::Unknown       => "UNKNOWN",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCategory::Timeout => {
                "The analysis took too long to complete. Try a shorter or more \
                 specific question, or try again in a few minutes."
            }
            ErrorCategory::QuotaExceeded => {
                "The analysis service has reached its usage limit. Please wait a \
                 few minutes and try again, or contact support if this keeps happening."
            }
            ErrorCategory::NetworkError => {
                "The analysis service could not be reached. Please check your \
                 connection and try again shortly."
            }
            ErrorCategory::Unknown => {
                "The analysis could not be completed right now. Please try again later."
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    pub model: String,
    pub credential: String,
    pub attempt_count: u32,
    pub elapsed_ms: u64,
    pub retry_index: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuccessEnvelope {
    pub success: bool,
    pub analysis: String,
    pub metadata: AnalysisMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureDetails {
    pub attempts: u32,
    pub cancelled: bool,
    pub credentials: Vec<CredentialSummary>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureEnvelope {
    pub success: bool,
    pub category: ErrorCategory,
    pub error: String,
    pub details: FailureDetails,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Report {
    Success(SuccessEnvelope),
    Failure(FailureEnvelope),
}

pub fn report(outcome: &Result<Success, OrchestrationError>) -> Report {
    match outcome {
        Ok(success) => Report::Success(success_envelope(success)),
        Err(err) => Report::Failure(failure_envelope(err)),
    }
}

pub fn success_envelope(success: &Success) -> SuccessEnvelope {
    SuccessEnvelope {
        success: true,
        analysis: success.text.clone(),
        metadata: AnalysisMetadata {
            model: success.model.clone(),
            credential: success.credential.clone(),
            attempt_count: success.attempt_count,
            elapsed_ms: success.elapsed_ms(),
            retry_index: success.retry_index,
            timestamp: success.completed_at,
        },
    }
}

pub fn failure_envelope(err: &OrchestrationError) -> FailureEnvelope {
    let last = err.last_error();
    let category = ErrorCategory::classify(last.map(|f| &f.kind));
    let (credentials, cancelled) = match err {
        OrchestrationError::ExhaustedFallback(report) => (report.credentials.clone(), false),
        OrchestrationError::Cancelled { .. } => (Vec::new(), true),
    };

    FailureEnvelope {
        success: false,
        category,
        error: category.user_message().to_string(),
        details: FailureDetails {
            attempts: err.attempts(),
            cancelled,
            credentials,
            last_error: last.map(|f| f.to_string()),
        },
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AttemptFailure, FailureReport};
    use std::time::Duration;

    fn exhausted(kind: FailureKind) -> OrchestrationError {
        OrchestrationError::ExhaustedFallback(FailureReport {
            attempts: 3,
            credentials: vec![CredentialSummary { name: "Primary".into(), successes: 0, attempts: 3 }],
            last_error: Some(AttemptFailure {
                model: "gemini-2.0-flash".into(),
                credential: "Primary".into(),
                retry_index: 2,
                kind,
            }),
        })
    }

    #[test]
    fn test_classification_table() {
        let cases = [
            (FailureKind::Timeout { timeout_ms: 100 }, ErrorCategory::Timeout),
            (FailureKind::Network { detail: "refused".into() }, ErrorCategory::NetworkError),
            (
                FailureKind::Http { status: 429, message: "slow".into(), provider_status: None },
                ErrorCategory::QuotaExceeded,
            ),
            (
                FailureKind::Http {
                    status: 403,
                    message: "quota".into(),
                    provider_status: Some("RESOURCE_EXHAUSTED".into()),
                },
                ErrorCategory::QuotaExceeded,
            ),
            (
                FailureKind::Http { status: 500, message: "timeout upstream".into(), provider_status: None },
                ErrorCategory::Unknown,
            ),
            (FailureKind::DegenerateResponse { chars: 0 }, ErrorCategory::Unknown),
        ];
        for (kind, expected) in cases {
            assert_eq!(ErrorCategory::classify(Some(&kind)), expected, "{kind:?}");
        }
        assert_eq!(ErrorCategory::classify(None), ErrorCategory::Unknown);
    }

    #[test]
    fn test_success_payload() {
        let success = Success {
            text: "A verbal lease for under one year is generally enforceable.".into(),
            model: "gemini-2.0-flash".into(),
            credential: "Primary".into(),
            attempt_count: 3,
            elapsed: Duration::from_millis(4210),
            retry_index: 2,
            completed_at: Utc::now(),
        };
        let json = serde_json::to_value(report(&Ok(success))).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["metadata"]["model"], "gemini-2.0-flash");
        assert_eq!(json["metadata"]["attempt_count"], 3);
        assert_eq!(json["metadata"]["elapsed_ms"], 4210);
        assert_eq!(json["metadata"]["retry_index"], 2);
    }

    #[test]
    fn test_failure_keeps_provider_text_out_of_primary_message() {
        let err = exhausted(FailureKind::Http {
            status: 429,
            message: "Resource has been exhausted (e.g. check quota).".into(),
            provider_status: Some("RESOURCE_EXHAUSTED".into()),
        });
        let envelope = failure_envelope(&err);
        assert_eq!(envelope.category, ErrorCategory::QuotaExceeded);
        assert!(!envelope.error.contains("Resource has been exhausted"));
        assert!(envelope.details.last_error.as_deref().unwrap().contains("Resource has been exhausted"));

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["category"], "QUOTA_EXCEEDED");
        assert_eq!(json["details"]["credentials"][0]["attempts"], 3);
    }

    #[test]
    fn test_cancelled_run_is_unknown() {
        let envelope = failure_envelope(&OrchestrationError::Cancelled { attempts: 2 });
        assert_eq!(envelope.category, ErrorCategory::Unknown);
        assert!(envelope.details.cancelled);
        assert_eq!(envelope.details.attempts, 2);
    }

    #[test]
    fn test_messages_are_distinct() {
        let all = [
            ErrorCategory::Timeout,
            ErrorCategory::QuotaExceeded,
            ErrorCategory::NetworkError,
            ErrorCategory::Unknown,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.user_message(), b.user_message());
            }
        }
    }

    #[test]
    fn test_log_label_matches_wire_name() {
        for category in [
            ErrorCategory::Timeout,
            ErrorCategory::QuotaExceeded,
            ErrorCategory::NetworkError,
            ErrorCategory::Unknown,
        ] {
            assert_eq!(serde_json::to_value(category).unwrap(), category.as_str());
        }
    }
}
