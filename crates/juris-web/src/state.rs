//! Shared application state for the web server.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use juris_config::{Config, ResolvedCredential};
use juris_llm::probe::HealthProbe;
use juris_llm::{
    Credential, CredentialLedger, FallbackOrchestrator, ModelDescriptor, RetryPolicy, Transport,
};

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub orchestrator: FallbackOrchestrator,
    pub probe: HealthProbe,
    pub max_query_chars: usize,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(orchestrator: FallbackOrchestrator, probe: HealthProbe, max_query_chars: usize) -> Self {
        Self {
            orchestrator,
            probe,
            max_query_chars,
            started_at: Utc::now(),
        }
    }

    /// Build the fallback matrix from configuration. The credential list is
    /// fixed here for the lifetime of the process.
    pub fn from_config(
        config: &Config,
        credentials: Vec<ResolvedCredential>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let models = config
            .models
            .iter()
            .map(|m| {
                ModelDescriptor::new(&m.name, &m.endpoint_template)
                    .with_priority(m.priority)
                    .with_timeout(m.timeout())
                    .with_description(&m.description)
            })
            .collect();

        let ledger = CredentialLedger::new(
            credentials
                .into_iter()
                .map(|c| Credential::new(c.id, c.display_name, c.priority, c.secret))
                .collect(),
        );

        let policy = RetryPolicy {
            max_retries_per_pair: config.retry.max_retries_per_pair,
            base_backoff: config.retry.base_backoff(),
            min_answer_chars: config.retry.min_answer_chars,
        };

        let orchestrator = FallbackOrchestrator::new(models, Arc::new(ledger), policy, transport);
        let probe = HealthProbe::new(&config.probe.listing_endpoint).with_timeout(config.probe.timeout());

        Self::new(orchestrator, probe, config.query.max_chars)
    }

    pub fn ledger(&self) -> &Arc<CredentialLedger> {
        self.orchestrator.ledger()
    }
}

pub type SharedState = Arc<AppState>;
