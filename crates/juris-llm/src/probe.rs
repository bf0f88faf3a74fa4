//! Credential reachability probe for the health endpoint.
//! Independent of the orchestration retry policy: one GET per credential
//! against the provider's model listing, with a short fixed timeout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::task::JoinSet;

use crate::error::TransportError;
use crate::ledger::{Credential, CredentialLedger};
use crate::transport::classify_reqwest_error;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    /// Provider answered 2xx.
    Reachable,
    /// Provider answered but refused the credential.
    Rejected,
    /// No answer: timeout or connection failure.
    Unreachable,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub credential: String,
    pub status: ProbeStatus,
    pub http_status: Option<u16>,
    pub latency_ms: u64,
    pub detail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HealthProbe {
    client: reqwest::Client,
    listing_endpoint: String,
    timeout: Duration,
}

impl HealthProbe {
    pub fn new(listing_endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            listing_endpoint: listing_endpoint.into(),
            timeout: PROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn listing_endpoint(&self) -> &str {
        &self.listing_endpoint
    }

    pub async fn probe(&self, credential: &Credential) -> ProbeResult {
        let started = Instant::now();
        let result = tokio::time::timeout(
            self.timeout,
            self.client
                .get(&self.listing_endpoint)
                .query(&[("key", credential.expose_secret())])
                .send(),
        )
        .await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let (status, http_status, detail) = match result {
            Err(_) => (
                ProbeStatus::Unreachable,
                None,
                Some(TransportError::Timeout { after: self.timeout }.to_string()),
            ),
            Ok(Err(err)) => (
                ProbeStatus::Unreachable,
                None,
                Some(classify_reqwest_error(err.without_url(), self.timeout).to_string()),
            ),
            Ok(Ok(resp)) if resp.status().is_success() => {
                (ProbeStatus::Reachable, Some(resp.status().as_u16()), None)
            }
            Ok(Ok(resp)) => (
                ProbeStatus::Rejected,
                Some(resp.status().as_u16()),
                resp.status().canonical_reason().map(str::to_string),
            ),
        };

        ProbeResult {
            credential: credential.display_name().to_string(),
            status,
            http_status,
            latency_ms,
            detail,
        }
    }

    /// Probe every credential concurrently; results keep ledger order.
    pub async fn probe_all(&self, ledger: &CredentialLedger) -> Vec<ProbeResult> {
        let mut set = JoinSet::new();
        for (idx, credential) in ledger.credentials().iter().enumerate() {
            let probe = self.clone();
            let credential: Arc<Credential> = credential.clone();
            set.spawn(async move { (idx, probe.probe(&credential).await) });
        }

        let mut results = Vec::with_capacity(ledger.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(pair) => results.push(pair),
                Err(e) => tracing::error!("credential probe task failed: {e}"),
            }
        }
        results.sort_by_key(|(idx, _)| *idx);
        results.into_iter().map(|(_, r)| r).collect()
    }
}
