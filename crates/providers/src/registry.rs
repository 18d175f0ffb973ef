//! Provider registry.
//!
//! Constructs and holds every configured LLM adapter. The registry is
//! filled once at startup from the [`LlmConfig`] and is read-only after
//! that: callers share it behind an `Arc` and only look things up.

use crate::openai::OpenAiAdapter;
use crate::traits::ProviderAdapter;
use futures_util::future::join_all;
use lm_domain::config::{LlmConfig, ProviderKind};
use lm_domain::error::{Error, Result};
use lm_domain::task::ModelCatalog;
use lm_domain::trace::TraceEvent;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of probing one adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderStatus {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<ModelCatalog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderStatus {
    fn probed(valid: bool, models: ModelCatalog) -> Self {
        Self {
            available: true,
            credentials_valid: Some(valid),
            models: Some(models),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            available: false,
            credentials_valid: None,
            models: None,
            error: Some(error.into()),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ProviderRegistry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn ProviderAdapter>>,
    default_provider: String,
    probe_timeout: Duration,
}

impl ProviderRegistry {
    /// An empty registry whose lookups without a name go to
    /// `default_provider`.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: BTreeMap::new(),
            default_provider: default_provider.into(),
            probe_timeout: Duration::from_secs(10),
        }
    }

    /// Upper bound for a single adapter's credential probe.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Build the registry from the application's [`LlmConfig`].
    ///
    /// Each provider entry is instantiated with the adapter matching its
    /// `kind`. Entries whose credentials cannot be resolved are logged and
    /// skipped rather than aborting startup, so an empty registry is a
    /// valid outcome.
    pub fn from_config(config: &LlmConfig) -> Self {
        let mut registry = Self::new(config.default_provider.clone())
            .with_probe_timeout(Duration::from_millis(config.status_probe_timeout_ms));

        for pc in &config.providers {
            let result: Result<Arc<dyn ProviderAdapter>> = match pc.kind {
                ProviderKind::Openai => OpenAiAdapter::from_config(pc, config)
                    .map(|a| Arc::new(a) as Arc<dyn ProviderAdapter>),
            };

            let adapter = match result {
                Ok(adapter) => adapter,
                Err(e) => {
                    tracing::warn!(
                        provider_id = %pc.id,
                        kind = pc.kind.as_str(),
                        error = %e,
                        "LLM provider not available, skipping"
                    );
                    TraceEvent::ProviderSkipped {
                        provider: pc.id.clone(),
                        reason: e.to_string(),
                    }
                    .emit();
                    continue;
                }
            };

            match registry.register(pc.id.clone(), adapter) {
                Ok(()) => {
                    tracing::info!(
                        provider_id = %pc.id,
                        kind = pc.kind.as_str(),
                        "registered LLM provider"
                    );
                    TraceEvent::ProviderRegistered {
                        provider: pc.id.clone(),
                        kind: pc.kind.as_str().to_string(),
                    }
                    .emit();
                }
                Err(e) => tracing::warn!(provider_id = %pc.id, error = %e, "skipping provider"),
            }
        }

        if registry.is_empty() {
            tracing::warn!(
                "no LLM providers registered; generation endpoints will fail \
                 until credentials are configured"
            );
        } else if !registry.providers.contains_key(&registry.default_provider) {
            tracing::warn!(
                default_provider = %registry.default_provider,
                "default provider is not registered; requests must name a provider"
            );
        }

        registry
    }

    /// Register an adapter under `name`. Names are unique.
    pub fn register(&mut self, name: impl Into<String>, adapter: Arc<dyn ProviderAdapter>) -> Result<()> {
        let name = name.into();
        if self.providers.contains_key(&name) {
            return Err(Error::Config(format!("provider '{name}' is already registered")));
        }
        self.providers.insert(name, adapter);
        Ok(())
    }

    /// Look up a provider by name, or the default provider when `name` is
    /// `None`.
    pub fn get(&self, name: Option<&str>) -> Result<Arc<dyn ProviderAdapter>> {
        let name = name.unwrap_or(self.default_provider.as_str());
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Config(format!("provider '{name}' not configured")))
    }

    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    /// Registered provider names, sorted.
    pub fn list_available(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Probe every adapter concurrently.
    ///
    /// Each probe runs in its own task under the probe timeout, so an
    /// adapter that errors, hangs or panics is reported as unavailable
    /// without affecting the others.
    pub async fn status(&self) -> BTreeMap<String, ProviderStatus> {
        let timeout = self.probe_timeout;
        let probes = self.providers.iter().map(|(name, adapter)| {
            let adapter = Arc::clone(adapter);
            let handle = tokio::spawn(async move {
                match tokio::time::timeout(timeout, adapter.validate_credentials()).await {
                    Ok(Ok(valid)) => ProviderStatus::probed(valid, adapter.available_models().clone()),
                    Ok(Err(e)) => ProviderStatus::failed(e.to_string()),
                    Err(_) => ProviderStatus::failed(format!(
                        "credential probe timed out after {}ms",
                        timeout.as_millis()
                    )),
                }
            });
            let name = name.clone();
            async move {
                let status = match handle.await {
                    Ok(status) => status,
                    Err(e) => ProviderStatus::failed(format!("credential probe aborted: {e}")),
                };
                if let Some(error) = &status.error {
                    tracing::error!(provider = %name, error = %error, "provider status check failed");
                }
                (name, status)
            }
        });

        join_all(probes).await.into_iter().collect()
    }
}
