/// Shared error type used across all leadmsg crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("rate limited by {provider}: {message}")]
    RateLimited { provider: String, message: String },

    #[error("connection: {0}")]
    Connection(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("config: {0}")]
    Config(String),

    #[error("parse: {0}")]
    Parse(String),

    #[error("auth: {0}")]
    Auth(String),
}

impl Error {
    /// Transient failures are worth another attempt: the vendor throttled
    /// us, the call timed out, or the connection could not be made.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::RateLimited { .. } | Error::Connection(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
