//! Fallback orchestrator: model × credential × retry traversal.
//!
//! Models are the outer loop and credentials the inner one, so every
//! credential is exhausted on the best model before a weaker model is tried.
//! The first usable answer wins and ends the run. Visitation order is fixed
//! by ascending priority; nothing is randomised or reordered by load.
//!
//! The only suspension points are the transport call and the backoff sleep,
//! and both observe the run's cancellation token.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use crate::error::{AttemptFailure, FailureKind, FailureReport, OrchestrationError};
use crate::ledger::{Credential, CredentialLedger};
use crate::model::{self, ModelDescriptor};
use crate::retry::{RetryDecision, RetryPolicy};
use crate::transport::{RawResponse, Transport};
use crate::wire::{self, GenerateRequest, ProviderError};

/// A usable answer and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Success {
    pub text: String,
    pub model: String,
    pub credential: String,
    /// Attempts made by this run, including the successful one.
    pub attempt_count: u32,
    pub elapsed: Duration,
    pub retry_index: u32,
    pub completed_at: DateTime<Utc>,
}

impl Success {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }
}

/// One physical outbound call, scoped to a single run.
#[derive(Debug)]
struct AttemptRecord<'a> {
    model: &'a str,
    credential: &'a str,
    retry_index: u32,
    started: Instant,
}

impl<'a> AttemptRecord<'a> {
    fn start(model: &'a ModelDescriptor, credential: &'a Credential, retry_index: u32) -> Self {
        Self {
            model: &model.name,
            credential: credential.display_name(),
            retry_index,
            started: Instant::now(),
        }
    }

    fn latency_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn failure(&self, kind: FailureKind) -> AttemptFailure {
        AttemptFailure {
            model: self.model.to_string(),
            credential: self.credential.to_string(),
            retry_index: self.retry_index,
            kind,
        }
    }
}

pub struct FallbackOrchestrator {
    models: Vec<ModelDescriptor>,
    ledger: Arc<CredentialLedger>,
    policy: RetryPolicy,
    transport: Arc<dyn Transport>,
}

impl FallbackOrchestrator {
    pub fn new(
        models: Vec<ModelDescriptor>,
        ledger: Arc<CredentialLedger>,
        policy: RetryPolicy,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            models: model::by_priority(models),
            ledger,
            policy,
            transport,
        }
    }

    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn ledger(&self) -> &Arc<CredentialLedger> {
        &self.ledger
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn run(&self, prompt: &str) -> Result<Success, OrchestrationError> {
        self.run_with_cancel(prompt, &CancellationToken::new()).await
    }

    pub async fn run_with_cancel(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<Success, OrchestrationError> {
        let span = tracing::info_span!("orchestrate", run_id = %Uuid::new_v4());
        self.traverse(prompt, cancel).instrument(span).await
    }

    async fn traverse(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<Success, OrchestrationError> {
        let started = Instant::now();
        let payload = GenerateRequest::from_prompt(prompt);
        let mut attempts: u32 = 0;
        let mut last_error: Option<AttemptFailure> = None;

        for model in &self.models {
            let endpoint = model.endpoint();

            for credential in self.ledger.credentials() {
                let mut pair = self.policy.pair();

                loop {
                    // No attempt is recorded unless a call is actually issued.
                    if cancel.is_cancelled() {
                        return Err(OrchestrationError::Cancelled { attempts });
                    }
                    let record = AttemptRecord::start(model, credential, pair.retry_index());
                    self.ledger.record_attempt(credential);
                    attempts += 1;
                    debug!(
                        model = record.model,
                        credential = record.credential,
                        retry = record.retry_index,
                        attempt = attempts,
                        "provider attempt"
                    );

                    let result = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(OrchestrationError::Cancelled { attempts }),
                        r = self.transport.send(&endpoint, credential, &payload, model.timeout) => r,
                    };

                    let kind = match result {
                        Ok(raw) => match self.evaluate(raw) {
                            Ok(text) => {
                                self.ledger.record_success(credential);
                                info!(
                                    model = record.model,
                                    credential = record.credential,
                                    retry = record.retry_index,
                                    attempts,
                                    latency_ms = record.latency_ms(),
                                    elapsed_ms = started.elapsed().as_millis() as u64,
                                    "provider answered"
                                );
                                return Ok(Success {
                                    text,
                                    model: model.name.clone(),
                                    credential: credential.display_name().to_string(),
                                    attempt_count: attempts,
                                    elapsed: started.elapsed(),
                                    retry_index: record.retry_index,
                                    completed_at: Utc::now(),
                                });
                            }
                            Err(kind) => kind,
                        },
                        Err(transport_err) => FailureKind::from(transport_err),
                    };

                    let decision = pair.decide(&kind);
                    if kind.is_protocol_failure() || decision == RetryDecision::Escalate {
                        self.ledger.record_failure(credential);
                    }

                    match decision {
                        RetryDecision::Backoff(wait) => {
                            warn!(
                                model = record.model,
                                credential = record.credential,
                                retry = record.retry_index,
                                latency_ms = record.latency_ms(),
                                backoff_ms = wait.as_millis() as u64,
                                error = %kind,
                                "retryable failure, backing off"
                            );
                            tokio::select! {
                                biased;
                                _ = cancel.cancelled() => return Err(OrchestrationError::Cancelled { attempts }),
                                _ = tokio::time::sleep(wait) => {}
                            }
                        }
                        RetryDecision::Escalate => {
                            warn!(
                                model = record.model,
                                credential = record.credential,
                                retry = record.retry_index,
                                latency_ms = record.latency_ms(),
                                error = %kind,
                                "giving up on credential"
                            );
                            last_error = Some(record.failure(kind));
                            break;
                        }
                    }
                }
            }

            debug!(model = %model.name, "all credentials exhausted for model");
        }

        let report = FailureReport {
            attempts,
            credentials: self.ledger.summary(),
            last_error,
        };
        let last = report
            .last_error
            .as_ref()
            .map_or_else(|| "none".to_string(), |e| e.to_string());
        error!(attempts, last_error = %last, "fallback exhausted");
        Err(OrchestrationError::ExhaustedFallback(report))
    }

    /// Turn a raw response into either answer text or a classified failure.
    fn evaluate(&self, raw: RawResponse) -> Result<String, FailureKind> {
        if !raw.is_success() {
            let provider = ProviderError::parse(&raw.body);
            return Err(FailureKind::Http {
                status: raw.status,
                message: provider
                    .message
                    .unwrap_or_else(|| format!("HTTP {}", raw.status)),
                provider_status: provider.status,
            });
        }

        let text = wire::extract_answer(&raw.body);
        let chars = text.trim().chars().count();
        if chars < self.policy.min_answer_chars {
            return Err(FailureKind::DegenerateResponse { chars });
        }
        Ok(text)
    }
}
