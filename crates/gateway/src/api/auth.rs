//! API key middleware.
//!
//! The key is read from the env var named by `server.api_key_env` once at
//! startup and only its SHA-256 digest is kept in [`AppState`]. Every
//! protected request must carry the same value in `X-API-Key`.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Axum middleware that rejects requests without a matching `X-API-Key`.
/// Attach via `axum::middleware::from_fn_with_state`.
pub async fn require_api_key(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    // Compare fixed-length digests in constant time so neither the key
    // nor its length leaks through timing.
    let provided_hash = Sha256::digest(provided.as_bytes());
    if !bool::from(provided_hash.as_slice().ct_eq(&state.api_key_hash)) {
        tracing::warn!(
            path = %req.uri().path(),
            key_present = !provided.is_empty(),
            "rejected request with invalid API key"
        );
        return (
            StatusCode::UNAUTHORIZED,
            axum::Json(serde_json::json!({ "error": "invalid or missing API key" })),
        )
            .into_response();
    }

    next.run(req).await
}
