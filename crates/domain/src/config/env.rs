//! Environment variable overrides applied on top of the TOML file.
//!
//! Unset or empty variables leave the file value alone. Values that fail
//! to parse are reported and skipped rather than aborting startup.

use super::{Config, LogFormat};
use crate::task::TaskKind;

/// Overrides a deployment can set without touching `config.toml`.
pub const ENV_OVERRIDES: &[&str] = &[
    "HOST",
    "PORT",
    "ENVIRONMENT",
    "API_VERSION",
    "LOG_LEVEL",
    "LOG_FORMAT",
    "ALLOWED_ORIGINS",
    "DEFAULT_PROVIDER",
    "CHAT_MODEL",
    "COMPLETION_MODEL",
    "EMBEDDING_MODEL",
    "SENTIMENT_MODEL",
    "LEAD_MESSAGE_MODEL",
    "OPENAI_ORG_ID",
    "OTEL_EXPORTER_OTLP_ENDPOINT",
    "CACHE_ENABLED",
    "CACHE_TTL",
    "REDIS_URL",
];

/// Names from [`ENV_OVERRIDES`] that `lookup` has a non-empty value for.
pub fn active_env_overrides<F>(lookup: F) -> Vec<&'static str>
where
    F: Fn(&str) -> Option<String>,
{
    ENV_OVERRIDES
        .iter()
        .copied()
        .filter(|key| lookup(key).is_some_and(|v| !v.trim().is_empty()))
        .collect()
}

impl Config {
    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Vec<String> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Returns one message per
    /// value that could not be parsed.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut rejected = Vec::new();

        if let Some(v) = get("HOST") {
            self.server.host = v;
        }
        if let Some(v) = get("PORT") {
            match v.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => rejected.push(format!("PORT: '{v}' is not a valid port")),
            }
        }
        if let Some(v) = get("ENVIRONMENT") {
            self.server.environment = v;
        }
        if let Some(v) = get("API_VERSION") {
            self.server.api_version = v;
        }
        if let Some(v) = get("ALLOWED_ORIGINS") {
            self.server.cors.allowed_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(v) = get("LOG_LEVEL") {
            self.logging.level = v.to_ascii_lowercase();
        }
        if let Some(v) = get("LOG_FORMAT") {
            match v.parse::<LogFormat>() {
                Ok(format) => self.logging.format = format,
                Err(e) => rejected.push(format!("LOG_FORMAT: {e}")),
            }
        }
        if let Some(v) = get("OTEL_EXPORTER_OTLP_ENDPOINT") {
            self.observability.otlp_endpoint = Some(v);
        }

        if let Some(v) = get("DEFAULT_PROVIDER") {
            self.llm.default_provider = v;
        }

        let model_vars = [
            ("CHAT_MODEL", TaskKind::Chat),
            ("COMPLETION_MODEL", TaskKind::Completion),
            ("EMBEDDING_MODEL", TaskKind::Embedding),
            ("SENTIMENT_MODEL", TaskKind::Sentiment),
            ("LEAD_MESSAGE_MODEL", TaskKind::LeadMessage),
        ];
        let default_provider = self.llm.default_provider.clone();
        if let Some(provider) = self.llm.provider_mut(&default_provider) {
            for (var, task) in model_vars {
                if let Some(model) = get(var) {
                    provider.set_default_model(task, model);
                }
            }
        }
        if let Some(org) = get("OPENAI_ORG_ID") {
            if let Some(provider) = self.llm.provider_mut("openai") {
                provider.organization = Some(org);
            }
        }

        if let Some(v) = get("CACHE_ENABLED") {
            match parse_bool(&v) {
                Some(b) => self.cache.enabled = b,
                None => rejected.push(format!("CACHE_ENABLED: '{v}' is not a boolean")),
            }
        }
        if let Some(v) = get("CACHE_TTL") {
            match v.trim().parse() {
                Ok(ttl) => self.cache.ttl_secs = ttl,
                Err(_) => rejected.push(format!("CACHE_TTL: '{v}' is not a number of seconds")),
            }
        }
        if let Some(v) = get("REDIS_URL") {
            self.cache.redis_url = Some(v);
        }

        rejected
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn apply(vars: &[(&str, &str)]) -> (Config, Vec<String>) {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut cfg = Config::default();
        let rejected = cfg.apply_overrides(|k| map.get(k).cloned());
        (cfg, rejected)
    }

    #[test]
    fn no_vars_changes_nothing() {
        let (cfg, rejected) = apply(&[]);
        assert!(rejected.is_empty());
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.llm.default_provider, "openai");
    }

    #[test]
    fn server_and_logging_overrides() {
        let (cfg, rejected) = apply(&[
            ("PORT", "9100"),
            ("ENVIRONMENT", "production"),
            ("LOG_LEVEL", "DEBUG"),
            ("LOG_FORMAT", "pretty"),
            ("ALLOWED_ORIGINS", "https://a.example.com, http://localhost:*"),
        ]);
        assert!(rejected.is_empty());
        assert_eq!(cfg.server.port, 9100);
        assert!(cfg.server.is_production());
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.logging.format, LogFormat::Pretty);
        assert_eq!(
            cfg.server.cors.allowed_origins,
            vec!["https://a.example.com", "http://localhost:*"]
        );
    }

    #[test]
    fn model_overrides_land_on_default_provider() {
        let (cfg, _) = apply(&[("SENTIMENT_MODEL", "gpt-4o"), ("OPENAI_ORG_ID", "org-1")]);
        let openai = cfg.llm.provider("openai").unwrap();
        assert_eq!(openai.default_model_for(TaskKind::Sentiment), Some("gpt-4o"));
        assert_eq!(openai.default_model_for(TaskKind::Chat), Some("gpt-3.5-turbo"));
        assert_eq!(openai.organization.as_deref(), Some("org-1"));
    }

    #[test]
    fn invalid_values_are_rejected_and_skipped() {
        let (cfg, rejected) = apply(&[
            ("PORT", "eighty"),
            ("CACHE_ENABLED", "maybe"),
            ("CACHE_TTL", "60"),
        ]);
        assert_eq!(rejected.len(), 2);
        assert_eq!(cfg.server.port, 8000);
        assert!(!cfg.cache.enabled);
        assert_eq!(cfg.cache.ttl_secs, 60);
    }

    #[test]
    fn active_overrides_lists_only_known_set_names() {
        let vars = [("PORT", "9100"), ("HOST", " "), ("UNRELATED", "x"), ("REDIS_URL", "redis://r")];
        let active = active_env_overrides(|key| {
            vars.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())
        });
        assert_eq!(active, vec!["PORT", "REDIS_URL"]);
    }

    #[test]
    fn empty_values_are_ignored() {
        let (cfg, rejected) = apply(&[("HOST", "  "), ("DEFAULT_PROVIDER", "")]);
        assert!(rejected.is_empty());
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.llm.default_provider, "openai");
    }
}
