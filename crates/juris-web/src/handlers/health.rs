//! Health endpoint: configured models and live credential reachability.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use juris_llm::probe::{ProbeResult, ProbeStatus};
use serde::Serialize;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: i64,
    pub models: Vec<String>,
    pub active_credentials: usize,
    pub credentials: Vec<ProbeResult>,
}

/// GET /api/health
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let credentials = state.probe.probe_all(state.ledger()).await;
    let reachable = credentials.iter().any(|p| p.status == ProbeStatus::Reachable);
    let now = Utc::now();

    Json(HealthResponse {
        status: if reachable { "ok" } else { "degraded" },
        timestamp: now,
        uptime_secs: (now - state.started_at).num_seconds(),
        models: state.orchestrator.models().iter().map(|m| m.name.clone()).collect(),
        active_credentials: state.ledger().len(),
        credentials,
    })
}
