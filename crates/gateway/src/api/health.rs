use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

const SERVICE_NAME: &str = "leadmsg";
const SERVICE_DESCRIPTION: &str = "Lead message generation backed by hosted LLM providers";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /health (public, no auth)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": state.config.server.api_version,
        "environment": state.config.server.environment,
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /info (public, no auth)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn info(State(state): State<AppState>) -> impl IntoResponse {
    let prefix = state.api_prefix();
    let endpoint = |path: String, method: &str, description: &str| {
        serde_json::json!({ "path": path, "method": method, "description": description })
    };

    Json(serde_json::json!({
        "name": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "description": SERVICE_DESCRIPTION,
        "providers": state.coordinator.registry().list_available(),
        "default_provider": state.coordinator.registry().default_provider(),
        "endpoints": [
            endpoint("/health".into(), "GET", "Service health check"),
            endpoint("/info".into(), "GET", "Service descriptor"),
            endpoint(format!("{prefix}/lead-messages/generate"), "POST", "Generate a message for a lead"),
            endpoint(format!("{prefix}/lead-messages/ruth"), "POST", "Reply as the Ruth chatbot persona"),
            endpoint(format!("{prefix}/sentiment/analyze"), "POST", "Analyze the sentiment of a lead message"),
            endpoint(format!("{prefix}/providers/status"), "GET", "Credential and model status per provider"),
        ],
    }))
}
