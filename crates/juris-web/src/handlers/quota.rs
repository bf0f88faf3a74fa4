//! Quota endpoint: in-memory credential usage since process start.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use juris_llm::UsageRecord;
use serde::Serialize;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct QuotaResponse {
    pub timestamp: DateTime<Utc>,
    pub total_attempts: u64,
    pub total_successes: u64,
    pub credentials: Vec<UsageRecord>,
}

/// GET /api/quota
pub async fn quota(State(state): State<SharedState>) -> Json<QuotaResponse> {
    let credentials = state.ledger().snapshot();
    Json(QuotaResponse {
        timestamp: Utc::now(),
        total_attempts: credentials.iter().map(|c| c.attempts).sum(),
        total_successes: credentials.iter().map(|c| c.successes).sum(),
        credentials,
    })
}
