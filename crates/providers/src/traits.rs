use lm_domain::error::Result;
use lm_domain::lead::LeadContext;
use lm_domain::message::{ChatMessage, Usage};
use lm_domain::sentiment::{SentimentAnalysis, SentimentContext};
use lm_domain::task::{CallOptions, ModelCatalog};
use serde::Serialize;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A provider-agnostic chat response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatResponse {
    /// The assistant turn produced by the model.
    pub message: ChatMessage,
    /// Token accounting as reported by the vendor.
    pub usage: Usage,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core adapter trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Uniform access to one LLM vendor.
///
/// Every operation receives [`CallOptions`] whose `model` has already been
/// resolved by the coordinator. Implementations must be safe to call from
/// many requests at once; they hold no per-call state.
#[async_trait::async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Plain text completion. `max_tokens` defaults to 100 and
    /// `temperature` to 0.7 when the caller leaves them unset.
    async fn completion(&self, prompt: &str, opts: &CallOptions) -> Result<String>;

    /// Chat completion over an ordered message list.
    async fn chat(&self, messages: &[ChatMessage], opts: &CallOptions) -> Result<ChatResponse>;

    /// Embedding vector for a single input text.
    async fn embedding(&self, text: &str, opts: &CallOptions) -> Result<Vec<f32>>;

    /// Structured sentiment analysis of a lead's message.
    async fn analyze_sentiment(
        &self,
        text: &str,
        ctx: &SentimentContext,
        opts: &CallOptions,
    ) -> Result<SentimentAnalysis>;

    /// Write a message for a lead. Persona contexts never fail: they fall
    /// back to a fixed greeting when the vendor call errors.
    async fn generate_lead_message(&self, ctx: &LeadContext, opts: &CallOptions) -> Result<String>;

    /// Lightweight credential probe. Implementations report vendor errors
    /// as `Ok(false)`; an `Err` is treated as the adapter being unavailable.
    async fn validate_credentials(&self) -> Result<bool>;

    /// The name this adapter reports for itself.
    fn provider_name(&self) -> &str;

    /// Models this adapter can serve, grouped by task name.
    fn available_models(&self) -> &ModelCatalog;
}
