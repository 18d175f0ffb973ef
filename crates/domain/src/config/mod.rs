mod cache;
mod env;
mod llm;
mod logging;
mod observability;
mod server;

pub use cache::*;
pub use env::*;
pub use llm::*;
pub use logging::*;
pub use observability::*;
pub use server::*;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::task::TaskKind;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good. Only
    /// [`ConfigSeverity::Error`] entries should block startup.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError::error("server.host", "host must not be empty"));
        }
        if self.server.api_version.is_empty() || self.server.api_version.contains('/') {
            errors.push(ConfigError::error(
                "server.api_version",
                "api_version must be a single non-empty path segment",
            ));
        }
        if self.server.max_concurrent_requests == 0 {
            errors.push(ConfigError::error(
                "server.max_concurrent_requests",
                "must be greater than 0",
            ));
        }

        // Running production on the development key is never intended.
        let (_, dev_key) = self.server.resolve_api_key();
        if dev_key {
            let msg = format!(
                "{} is unset; the development API key is in use",
                self.server.api_key_env
            );
            if self.server.is_production() {
                errors.push(ConfigError::error("server.api_key_env", msg));
            } else {
                errors.push(ConfigError::warning("server.api_key_env", msg));
            }
        }

        if self.server.cors.allowed_origins.iter().any(|o| o == "*") {
            errors.push(ConfigError::warning(
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins (not recommended for production)",
            ));
        }

        if !(0.0..=1.0).contains(&self.observability.sample_rate) {
            errors.push(ConfigError::error(
                "observability.sample_rate",
                "sample_rate must be between 0.0 and 1.0",
            ));
        }

        self.validate_llm(&mut errors);

        if self.cache.enabled {
            errors.push(ConfigError::warning(
                "cache.enabled",
                "response caching is not implemented; the setting is ignored",
            ));
        }

        errors
    }

    fn validate_llm(&self, errors: &mut Vec<ConfigError>) {
        let llm = &self.llm;

        if llm.providers.is_empty() {
            errors.push(ConfigError::warning("llm.providers", "no LLM providers configured"));
        }

        let mut seen = HashSet::new();
        for (i, provider) in llm.providers.iter().enumerate() {
            if provider.id.is_empty() {
                errors.push(ConfigError::error(
                    format!("llm.providers[{i}].id"),
                    "provider id must not be empty",
                ));
            } else if !seen.insert(provider.id.as_str()) {
                errors.push(ConfigError::error(
                    format!("llm.providers[{i}].id"),
                    format!("duplicate provider id '{}'", provider.id),
                ));
            }
            if provider.base_url.is_empty() {
                errors.push(ConfigError::error(
                    format!("llm.providers[{i}].base_url"),
                    "provider base_url must not be empty",
                ));
            }
            if provider.auth.env.is_none() && provider.auth.key.is_none() {
                errors.push(ConfigError::warning(
                    format!("llm.providers[{i}].auth"),
                    "no credentials source; the provider will be skipped",
                ));
            }
            for task in provider.default_models.keys() {
                if task.parse::<TaskKind>().is_err() {
                    errors.push(ConfigError::warning(
                        format!("llm.providers[{i}].default_models.{task}"),
                        "unknown task name; entry is never used",
                    ));
                }
            }
        }

        if !llm.providers.is_empty() && llm.provider(&llm.default_provider).is_none() {
            errors.push(ConfigError::error(
                "llm.default_provider",
                format!("'{}' is not a configured provider", llm.default_provider),
            ));
        }
        if llm.fallback_model.is_empty() {
            errors.push(ConfigError::error("llm.fallback_model", "must not be empty"));
        }
        if llm.request_timeout_ms == 0 {
            errors.push(ConfigError::error("llm.request_timeout_ms", "must be greater than 0"));
        }
        if llm.retry.max_attempts == 0 {
            errors.push(ConfigError::error(
                "llm.retry.max_attempts",
                "must allow at least one attempt",
            ));
        }
        if llm.retry.initial_delay_ms > llm.retry.max_delay_ms {
            errors.push(ConfigError::warning(
                "llm.retry.initial_delay_ms",
                "initial delay exceeds max_delay_ms; every wait is capped",
            ));
        }
    }
}
