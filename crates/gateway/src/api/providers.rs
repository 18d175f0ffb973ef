use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

/// `GET /{api_version}/providers/status`: probe every registered provider.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.coordinator.provider_status().await)
}
