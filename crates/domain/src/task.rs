//! Task kinds and the option structs that flow from callers to adapters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The operations the service forwards to a provider. Each task has its
/// own default-model slot in the provider configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Completion,
    Chat,
    Embedding,
    Sentiment,
    LeadMessage,
}

impl TaskKind {
    pub const ALL: [TaskKind; 5] = [
        TaskKind::Completion,
        TaskKind::Chat,
        TaskKind::Embedding,
        TaskKind::Sentiment,
        TaskKind::LeadMessage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Completion => "completion",
            TaskKind::Chat => "chat",
            TaskKind::Embedding => "embedding",
            TaskKind::Sentiment => "sentiment",
            TaskKind::LeadMessage => "lead_message",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskKind::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown task '{s}'"))
    }
}

/// Models a provider advertises, grouped by task name (e.g. `"chat"`).
pub type ModelCatalog = BTreeMap<String, Vec<String>>;

/// Output shape hint for chat calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Text,
    /// Ask the provider for a single JSON object.
    Json,
}

/// Caller-supplied overrides for a task. Every field is optional; an
/// explicit `model` or `provider` always wins over configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskOptions {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub response_format: Option<ResponseFormat>,
}

impl TaskOptions {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

/// Options as seen by an adapter: the model is already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOptions {
    pub model: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub response_format: ResponseFormat,
}

impl CallOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
            response_format: ResponseFormat::Text,
        }
    }

    /// Merge the resolved model with the remaining caller overrides.
    pub fn from_task(model: String, opts: &TaskOptions) -> Self {
        Self {
            model,
            temperature: opts.temperature,
            max_tokens: opts.max_tokens,
            response_format: opts.response_format.unwrap_or_default(),
        }
    }
}
