//! Scripted provider used by the orchestrator scenario tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;

use juris_llm::wire::GenerateRequest;
use juris_llm::{
    Credential, CredentialLedger, FallbackOrchestrator, ModelDescriptor, RawResponse, RetryPolicy,
    Transport, TransportError,
};

pub const TEMPLATE: &str = "http://provider.test/v1beta/models/{model}:generateContent";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub model: String,
    pub credential: String,
}

pub enum Step {
    Reply(u16, String),
    Fail(TransportError),
    /// Never answers; the scripted transport enforces the deadline itself.
    Hang,
}

type Responder = dyn Fn(&Call, usize) -> Step + Send + Sync;

pub struct ScriptedTransport {
    responder: Box<Responder>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    /// `responder` receives the call and how many times this exact
    /// (model, credential) pair was called before.
    pub fn new(responder: impl Fn(&Call, usize) -> Step + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        endpoint: &str,
        credential: &Credential,
        _payload: &GenerateRequest,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        let model = endpoint
            .trim_start_matches("http://provider.test/v1beta/models/")
            .trim_end_matches(":generateContent")
            .to_string();
        let call = Call { model, credential: credential.id().to_string() };
        let step = {
            let mut calls = self.calls.lock().unwrap();
            let previous = calls.iter().filter(|c| **c == call).count();
            calls.push(call.clone());
            (self.responder)(&call, previous)
        };

        match step {
            Step::Reply(status, body) => Ok(RawResponse::new(status, body)),
            Step::Fail(err) => Err(err),
            Step::Hang => {
                tokio::time::sleep(timeout).await;
                Err(TransportError::Timeout { after: timeout })
            }
        }
    }
}

pub fn answer(text: &str) -> String {
    serde_json::json!({"candidates": [{"content": {"parts": [{"text": text}]}}]}).to_string()
}

pub fn answer_of_len(chars: usize) -> String {
    answer(&"a".repeat(chars))
}

pub fn provider_error(code: u16, message: &str, status: &str) -> String {
    serde_json::json!({"error": {"code": code, "message": message, "status": status}}).to_string()
}

pub fn models(names: &[&str]) -> Vec<ModelDescriptor> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            ModelDescriptor::new(*name, TEMPLATE)
                .with_priority(i as u32 + 1)
                .with_timeout(Duration::from_millis(100))
        })
        .collect()
}

pub fn ledger(ids: &[&str]) -> Arc<CredentialLedger> {
    Arc::new(CredentialLedger::new(
        ids.iter()
            .enumerate()
            .map(|(i, id)| {
                Credential::new(*id, format!("{id} key"), i as u32 + 1, SecretString::from(format!("{id}-secret")))
            })
            .collect(),
    ))
}

pub fn policy(max_retries_per_pair: u32, base_backoff_ms: u64) -> RetryPolicy {
    RetryPolicy {
        max_retries_per_pair,
        base_backoff: Duration::from_millis(base_backoff_ms),
        min_answer_chars: 50,
    }
}

pub fn orchestrator(
    model_names: &[&str],
    credential_ids: &[&str],
    policy: RetryPolicy,
    transport: Arc<ScriptedTransport>,
) -> FallbackOrchestrator {
    FallbackOrchestrator::new(models(model_names), ledger(credential_ids), policy, transport)
}
