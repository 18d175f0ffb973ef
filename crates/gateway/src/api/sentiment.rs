use axum::extract::State;
use axum::Json;
use lm_domain::sentiment::{SentimentAnalysis, SentimentContext};
use lm_domain::task::TaskOptions;
use serde::Deserialize;

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SentimentRequest {
    pub text: String,
    #[serde(default)]
    pub context: SentimentContext,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// `POST /{api_version}/sentiment/analyze`
pub async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<SentimentRequest>,
) -> Result<Json<SentimentAnalysis>, ApiError> {
    let opts = TaskOptions {
        model: req.model,
        provider: req.provider,
        ..Default::default()
    };

    let analysis = state
        .coordinator
        .analyze_sentiment(&req.text, &req.context, opts)
        .await
        .map_err(|e| ApiError::internal("analyze sentiment", e))?;

    tracing::info!(
        lead_status = analysis.lead_status.as_str(),
        lead_score = analysis.lead_score,
        "sentiment analyzed"
    );
    Ok(Json(analysis))
}
