pub mod auth;
pub mod error;
pub mod health;
pub mod lead_messages;
pub mod providers;
pub mod request_log;
pub mod sentiment;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
///
/// Routes are split into **public** (`/health`, `/info`) and **protected**
/// (under `/{api_version}`, gated behind the `X-API-Key` middleware).
/// Every request goes through the request-logging middleware.
pub fn router(state: AppState) -> Router<AppState> {
    let prefix = state.api_prefix();

    let public = Router::new()
        .route("/health", get(health::health))
        .route("/info", get(health::info));

    let protected = Router::new()
        // Lead messages
        .route(
            &format!("{prefix}/lead-messages/generate"),
            post(lead_messages::generate),
        )
        .route(&format!("{prefix}/lead-messages/ruth"), post(lead_messages::ruth))
        // Sentiment
        .route(&format!("{prefix}/sentiment/analyze"), post(sentiment::analyze))
        // Providers
        .route(&format!("{prefix}/providers/status"), get(providers::status))
        .route_layer(middleware::from_fn_with_state(state, auth::require_api_key));

    public
        .merge(protected)
        .layer(middleware::from_fn(request_log::log_requests))
}
