//! Shared utility functions for provider adapters.

use lm_domain::config::AuthConfig;
use lm_domain::error::{Error, Result};

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeouts map to [`Error::Timeout`] and failed connects to
/// [`Error::Connection`], both of which the retry policy treats as
/// transient. Everything else maps to [`Error::Http`].
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else if e.is_connect() {
        Error::Connection(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Map a non-2xx vendor reply to the domain error. 429 is the only status
/// classified as transient.
pub(crate) fn from_status(provider: &str, status: reqwest::StatusCode, body: &str) -> Error {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        Error::RateLimited {
            provider: provider.to_string(),
            message: body.to_string(),
        }
    } else {
        Error::Provider {
            provider: provider.to_string(),
            message: format!("HTTP {} - {}", status.as_u16(), body),
        }
    }
}

/// Resolve the API key from an [`AuthConfig`].
///
/// Precedence:
/// 1. `key` field (plaintext, warns)
/// 2. `env` field (reads environment variable)
/// 3. Error
pub fn resolve_api_key(auth: &AuthConfig) -> Result<String> {
    if let Some(ref key) = auth.key {
        tracing::warn!(
            "API key loaded from plaintext config field 'key'; prefer 'env' instead"
        );
        return Ok(key.clone());
    }

    if let Some(ref env_var) = auth.env {
        return match std::env::var(env_var) {
            Ok(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(Error::Auth(format!(
                "environment variable '{env_var}' not set or empty"
            ))),
        };
    }

    Err(Error::Auth(
        "no API key configured: set 'key' or 'env' in the provider auth section".into(),
    ))
}
