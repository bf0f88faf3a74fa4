//! Analysis endpoint: the only caller of the fallback orchestrator.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use juris_llm::reporter::{self, Report};
use serde::Deserialize;

use crate::error::ApiError;
use crate::prompt::{build_prompt, validate_query};
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub query: String,
}

/// POST /api/analyze - run a legal query through the model/credential matrix
pub async fn analyze(
    State(state): State<SharedState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    let Json(req) = payload?;
    let query = validate_query(&req.query, state.max_query_chars)?;
    let prompt = build_prompt(query);

    tracing::info!(query_chars = query.chars().count(), "analysis requested");
    let outcome = state.orchestrator.run(&prompt).await;
    let report = reporter::report(&outcome);

    let status = match &report {
        Report::Success(_) => StatusCode::OK,
        Report::Failure(failure) => {
            tracing::warn!(
                category = failure.category.as_str(),
                attempts = failure.details.attempts,
                "analysis failed"
            );
            StatusCode::BAD_GATEWAY
        }
    };
    Ok((status, Json(report)))
}
