//! Request coordinator.
//!
//! The single entry point used by the HTTP handlers. For every task it
//! takes the `provider` override out of the caller's options, resolves the
//! effective model, forwards to the adapter and returns the result
//! unchanged. It holds no per-request state.

use crate::registry::{ProviderRegistry, ProviderStatus};
use crate::traits::{ChatResponse, ProviderAdapter};
use lm_domain::config::LlmConfig;
use lm_domain::error::Result;
use lm_domain::lead::LeadContext;
use lm_domain::message::{ChatMessage, Usage};
use lm_domain::sentiment::{SentimentAnalysis, SentimentContext};
use lm_domain::task::{CallOptions, TaskKind, TaskOptions};
use lm_domain::trace::TraceEvent;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Default model per task, per provider id.
type DefaultModels = BTreeMap<String, BTreeMap<String, String>>;

pub struct RequestCoordinator {
    registry: Arc<ProviderRegistry>,
    default_models: DefaultModels,
    fallback_model: String,
}

/// A resolved call: which adapter, under which name, with which options.
struct Target {
    adapter: Arc<dyn ProviderAdapter>,
    provider: String,
    call: CallOptions,
}

impl RequestCoordinator {
    /// Build the registry from config and wrap it.
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(ProviderRegistry::from_config(config), config)
    }

    /// Wrap an already-constructed registry (useful for testing).
    pub fn new(registry: ProviderRegistry, config: &LlmConfig) -> Self {
        let default_models = config
            .providers
            .iter()
            .map(|p| (p.id.clone(), p.default_models.clone()))
            .collect();
        Self {
            registry: Arc::new(registry),
            default_models,
            fallback_model: config.fallback_model.clone(),
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Effective model for `task` on `provider`: the caller's explicit
    /// model, else the provider's configured default for the task, else the
    /// global fallback model.
    pub fn resolve_model(&self, task: TaskKind, provider: &str, opts: &TaskOptions) -> String {
        if let Some(model) = opts.model.as_deref().filter(|m| !m.is_empty()) {
            return model.to_string();
        }
        self.default_models
            .get(provider)
            .and_then(|models| models.get(task.as_str()))
            .cloned()
            .unwrap_or_else(|| self.fallback_model.clone())
    }

    fn target(&self, task: TaskKind, mut opts: TaskOptions) -> Result<Target> {
        let provider = opts
            .provider
            .take()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| self.registry.default_provider().to_string());
        let adapter = self.registry.get(Some(provider.as_str()))?;
        let model = self.resolve_model(task, &provider, &opts);

        tracing::info!(
            provider = %provider,
            model = %model,
            task = task.as_str(),
            "dispatching LLM task"
        );

        Ok(Target {
            adapter,
            provider,
            call: CallOptions::from_task(model, &opts),
        })
    }

    fn record(target: &Target, task: TaskKind, start: Instant, usage: Option<Usage>) {
        TraceEvent::LlmRequest {
            provider: target.provider.clone(),
            model: target.call.model.clone(),
            task: task.as_str().to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
            prompt_tokens: usage.map(|u| u.prompt_tokens),
            completion_tokens: usage.map(|u| u.completion_tokens),
        }
        .emit();
    }

    // ── Public task API ────────────────────────────────────────────

    pub async fn completion(&self, prompt: &str, opts: TaskOptions) -> Result<String> {
        let target = self.target(TaskKind::Completion, opts)?;
        let start = Instant::now();
        let result = target.adapter.completion(prompt, &target.call).await;
        Self::record(&target, TaskKind::Completion, start, None);
        result
    }

    pub async fn chat(&self, messages: &[ChatMessage], opts: TaskOptions) -> Result<ChatResponse> {
        let target = self.target(TaskKind::Chat, opts)?;
        let start = Instant::now();
        let result = target.adapter.chat(messages, &target.call).await;
        Self::record(
            &target,
            TaskKind::Chat,
            start,
            result.as_ref().ok().map(|r| r.usage),
        );
        result
    }

    pub async fn embedding(&self, text: &str, opts: TaskOptions) -> Result<Vec<f32>> {
        let target = self.target(TaskKind::Embedding, opts)?;
        let start = Instant::now();
        let result = target.adapter.embedding(text, &target.call).await;
        Self::record(&target, TaskKind::Embedding, start, None);
        result
    }

    pub async fn analyze_sentiment(
        &self,
        text: &str,
        ctx: &SentimentContext,
        opts: TaskOptions,
    ) -> Result<SentimentAnalysis> {
        let target = self.target(TaskKind::Sentiment, opts)?;
        let start = Instant::now();
        let result = target.adapter.analyze_sentiment(text, ctx, &target.call).await;
        Self::record(&target, TaskKind::Sentiment, start, None);
        result
    }

    pub async fn generate_lead_message(&self, ctx: &LeadContext, opts: TaskOptions) -> Result<String> {
        let target = self.target(TaskKind::LeadMessage, opts)?;
        let start = Instant::now();
        let result = target.adapter.generate_lead_message(ctx, &target.call).await;
        Self::record(&target, TaskKind::LeadMessage, start, None);
        result
    }

    /// Status of every registered provider.
    pub async fn provider_status(&self) -> BTreeMap<String, ProviderStatus> {
        self.registry.status().await
    }
}
