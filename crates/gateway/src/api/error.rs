use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lm_domain::error::Error;

/// A failed request, rendered as `{ "error": message }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Any failure of a forwarded task is an internal error; the message
    /// keeps the underlying description so callers can see what broke.
    pub fn internal(action: &str, err: Error) -> Self {
        tracing::error!(error = %err, "failed to {action}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("failed to {action}: {err}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}
