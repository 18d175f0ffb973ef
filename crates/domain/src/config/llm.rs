use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::task::TaskKind;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM provider system
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider used when a request does not name one.
    #[serde(default = "d_openai")]
    pub default_provider: String,
    /// Model used when neither the caller nor the provider's
    /// `default_models` table names one for a task.
    #[serde(default = "d_chat_model")]
    pub fallback_model: String,
    /// Overall timeout of a single vendor HTTP call.
    #[serde(default = "d_30000u")]
    pub request_timeout_ms: u64,
    /// Upper bound for one adapter's status probe.
    #[serde(default = "d_10000u")]
    pub status_probe_timeout_ms: u64,
    #[serde(default)]
    pub retry: RetryConfig,
    /// Registered LLM providers. Entries whose credentials are missing at
    /// startup are skipped.
    #[serde(default = "d_providers")]
    pub providers: Vec<ProviderConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_provider: d_openai(),
            fallback_model: d_chat_model(),
            request_timeout_ms: 30_000,
            status_probe_timeout_ms: 10_000,
            retry: RetryConfig::default(),
            providers: d_providers(),
        }
    }
}

impl LlmConfig {
    pub fn provider(&self, id: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.id == id)
    }

    pub fn provider_mut(&mut self, id: &str) -> Option<&mut ProviderConfig> {
        self.providers.iter_mut().find(|p| p.id == id)
    }
}

/// Exponential backoff for transient vendor errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    #[serde(default = "d_3")]
    pub max_attempts: u32,
    #[serde(default = "d_2000u")]
    pub initial_delay_ms: u64,
    #[serde(default = "d_10000u")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 2_000,
            max_delay_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    #[serde(default)]
    pub kind: ProviderKind,
    #[serde(default = "d_openai_base_url")]
    pub base_url: String,
    /// Sent as `OpenAI-Organization` when set.
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Task name → default model for that task on this provider.
    #[serde(default)]
    pub default_models: BTreeMap<String, String>,
    /// Overrides the adapter's built-in model catalog (task name → models).
    #[serde(default)]
    pub models: Option<BTreeMap<String, Vec<String>>>,
}

impl ProviderConfig {
    /// The built-in OpenAI entry, keyed from `OPENAI_API_KEY`.
    pub fn openai() -> Self {
        Self {
            id: d_openai(),
            kind: ProviderKind::Openai,
            base_url: d_openai_base_url(),
            organization: None,
            auth: AuthConfig {
                env: Some("OPENAI_API_KEY".into()),
                key: None,
            },
            default_models: d_openai_default_models(),
            models: None,
        }
    }

    pub fn default_model_for(&self, task: TaskKind) -> Option<&str> {
        self.default_models.get(task.as_str()).map(|s| s.as_str())
    }

    pub fn set_default_model(&mut self, task: TaskKind, model: impl Into<String>) {
        self.default_models.insert(task.as_str().to_string(), model.into());
    }
}

/// Known adapter variants. Adding a vendor means adding a variant and the
/// matching constructor arm in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Openai,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Openai => "openai",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Env var containing the key.
    #[serde(default)]
    pub env: Option<String>,
    /// Direct key (for local setups; prefer `env`).
    #[serde(default, skip_serializing)]
    pub key: Option<String>,
}

// ── serde default helpers ───────────────────────────────────────────

fn d_openai() -> String {
    "openai".into()
}
fn d_chat_model() -> String {
    "gpt-3.5-turbo".into()
}
fn d_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn d_providers() -> Vec<ProviderConfig> {
    vec![ProviderConfig::openai()]
}
fn d_openai_default_models() -> BTreeMap<String, String> {
    [
        (TaskKind::Chat, "gpt-3.5-turbo"),
        (TaskKind::Completion, "gpt-3.5-turbo-instruct"),
        (TaskKind::Embedding, "text-embedding-ada-002"),
        (TaskKind::Sentiment, "gpt-4"),
        (TaskKind::LeadMessage, "gpt-3.5-turbo"),
    ]
    .into_iter()
    .map(|(task, model)| (task.as_str().to_string(), model.to_string()))
    .collect()
}
fn d_30000u() -> u64 {
    30_000
}
fn d_10000u() -> u64 {
    10_000
}
fn d_2000u() -> u64 {
    2_000
}
fn d_3() -> u32 {
    3
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
