//! OpenAI adapter.
//!
//! Talks to `/completions`, `/chat/completions`, `/embeddings` and `/models`
//! of any endpoint that follows the OpenAI REST contract. Transport calls
//! run under the configured [`RetryPolicy`], except lead-message
//! generation which is a single attempt.

use crate::lead;
use crate::prompts::{self, SENTIMENT_TEMPERATURE};
use crate::retry::RetryPolicy;
use crate::traits::{ChatResponse, ProviderAdapter};
use crate::util::{from_reqwest, from_status, resolve_api_key};
use lm_domain::config::{LlmConfig, ProviderConfig};
use lm_domain::error::{Error, Result};
use lm_domain::lead::LeadContext;
use lm_domain::message::{ChatMessage, Role, Usage};
use lm_domain::sentiment::{SentimentAnalysis, SentimentContext};
use lm_domain::task::{CallOptions, ModelCatalog, ResponseFormat, TaskKind};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_COMPLETION_MAX_TOKENS: u32 = 100;
const DEFAULT_TEMPERATURE: f64 = 0.7;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct OpenAiAdapter {
    id: String,
    base_url: String,
    api_key: String,
    organization: Option<String>,
    models: ModelCatalog,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl OpenAiAdapter {
    /// Build the adapter from its provider entry. Fails with
    /// [`Error::Auth`] when no API key can be resolved.
    pub fn from_config(cfg: &ProviderConfig, llm: &LlmConfig) -> Result<Self> {
        let api_key = resolve_api_key(&cfg.auth)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(llm.request_timeout_ms))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: cfg.id.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            organization: cfg.organization.clone(),
            models: cfg.models.clone().unwrap_or_else(default_catalog),
            retry: RetryPolicy::from_config(&llm.retry),
            client,
        })
    }

    /// Replace the retry policy (tests use a zero-delay policy).
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    // ── Internal: authenticated requests ───────────────────────────

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.bearer_auth(&self.api_key);
        match &self.organization {
            Some(org) => builder.header("OpenAI-Organization", org),
            None => builder,
        }
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(provider = %self.id, url = %url, "openai request");

        let resp = self
            .authed(self.client.post(&url))
            .json(body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let text = resp.text().await.map_err(from_reqwest)?;
        if !status.is_success() {
            return Err(from_status(&self.id, status, &text));
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// One chat round-trip, no retry.
    async fn send_chat(&self, messages: &[ChatMessage], opts: &CallOptions) -> Result<ChatResponse> {
        let body = build_chat_body(messages, opts);
        let json = self.post_json("/chat/completions", &body).await?;
        parse_chat_response(&self.id, &json)
    }

    fn malformed(&self, what: &str) -> Error {
        Error::Provider {
            provider: self.id.clone(),
            message: format!("malformed response: {what}"),
        }
    }
}

/// The catalog advertised when the provider entry does not override it.
pub fn default_catalog() -> ModelCatalog {
    let mut catalog = ModelCatalog::new();
    catalog.insert(
        TaskKind::Chat.as_str().into(),
        vec![
            "gpt-4".into(),
            "gpt-4-turbo".into(),
            "gpt-3.5-turbo".into(),
            "gpt-3.5-turbo-16k".into(),
        ],
    );
    catalog.insert(
        TaskKind::Completion.as_str().into(),
        vec![
            "gpt-3.5-turbo-instruct".into(),
            "babbage-002".into(),
            "davinci-002".into(),
        ],
    );
    catalog.insert(
        TaskKind::Embedding.as_str().into(),
        vec!["text-embedding-ada-002".into()],
    );
    catalog
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn build_chat_body(messages: &[ChatMessage], opts: &CallOptions) -> Value {
    let messages: Vec<Value> = messages
        .iter()
        .map(|m| serde_json::json!({ "role": m.role.as_str(), "content": m.content }))
        .collect();

    let mut body = serde_json::json!({
        "model": opts.model,
        "messages": messages,
        "temperature": opts.temperature.unwrap_or(DEFAULT_TEMPERATURE),
    });
    if let Some(max) = opts.max_tokens {
        body["max_tokens"] = serde_json::json!(max);
    }
    if opts.response_format == ResponseFormat::Json {
        body["response_format"] = serde_json::json!({ "type": "json_object" });
    }
    body
}

fn parse_role(s: &str) -> Role {
    match s {
        "system" => Role::System,
        "user" => Role::User,
        _ => Role::Assistant,
    }
}

fn parse_chat_response(provider: &str, body: &Value) -> Result<ChatResponse> {
    let message = body
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .and_then(|c| c.get("message"))
        .ok_or_else(|| Error::Provider {
            provider: provider.to_string(),
            message: "no message in response choices".into(),
        })?;

    let role = message
        .get("role")
        .and_then(|v| v.as_str())
        .map(parse_role)
        .unwrap_or(Role::Assistant);
    let content = message
        .get("content")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let usage = body.get("usage").map(parse_usage).unwrap_or_default();

    Ok(ChatResponse {
        message: ChatMessage { role, content },
        usage,
    })
}

fn parse_usage(v: &Value) -> Usage {
    let field = |name: &str| v.get(name).and_then(|n| n.as_u64()).unwrap_or(0) as u32;
    Usage {
        prompt_tokens: field("prompt_tokens"),
        completion_tokens: field("completion_tokens"),
        total_tokens: field("total_tokens"),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl ProviderAdapter for OpenAiAdapter {
    async fn completion(&self, prompt: &str, opts: &CallOptions) -> Result<String> {
        let body = serde_json::json!({
            "model": opts.model,
            "prompt": prompt,
            "max_tokens": opts.max_tokens.unwrap_or(DEFAULT_COMPLETION_MAX_TOKENS),
            "temperature": opts.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        });

        let json = self
            .retry
            .execute(&self.id, "completion", || self.post_json("/completions", &body))
            .await?;

        json.get("choices")
            .and_then(|c| c.as_array())
            .and_then(|a| a.first())
            .and_then(|c| c.get("text"))
            .and_then(|t| t.as_str())
            .map(|t| t.trim().to_string())
            .ok_or_else(|| self.malformed("no text in completion choices"))
    }

    async fn chat(&self, messages: &[ChatMessage], opts: &CallOptions) -> Result<ChatResponse> {
        self.retry
            .execute(&self.id, "chat", || self.send_chat(messages, opts))
            .await
    }

    async fn embedding(&self, text: &str, opts: &CallOptions) -> Result<Vec<f32>> {
        let body = serde_json::json!({ "model": opts.model, "input": text });

        let json = self
            .retry
            .execute(&self.id, "embedding", || self.post_json("/embeddings", &body))
            .await?;

        let vector = json
            .get("data")
            .and_then(|d| d.as_array())
            .and_then(|a| a.first())
            .and_then(|item| item.get("embedding"))
            .and_then(|e| e.as_array())
            .ok_or_else(|| self.malformed("missing 'data[0].embedding'"))?;

        Ok(vector
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect())
    }

    async fn analyze_sentiment(
        &self,
        text: &str,
        ctx: &SentimentContext,
        opts: &CallOptions,
    ) -> Result<SentimentAnalysis> {
        let messages = prompts::sentiment_messages(text, ctx);
        let call = CallOptions {
            model: opts.model.clone(),
            temperature: Some(opts.temperature.unwrap_or(SENTIMENT_TEMPERATURE)),
            max_tokens: opts.max_tokens,
            response_format: ResponseFormat::Json,
        };

        let resp = self
            .retry
            .execute(&self.id, "sentiment", || self.send_chat(&messages, &call))
            .await?;

        SentimentAnalysis::from_reply(&resp.message.content)
    }

    async fn generate_lead_message(&self, ctx: &LeadContext, opts: &CallOptions) -> Result<String> {
        lead::compose(&self.id, ctx, opts, |messages, call| async move {
            self.send_chat(&messages, &call).await
        })
        .await
    }

    async fn validate_credentials(&self) -> Result<bool> {
        let url = format!("{}/models", self.base_url);
        match self.authed(self.client.get(&url)).send().await {
            Ok(resp) if resp.status().is_success() => Ok(true),
            Ok(resp) => {
                tracing::warn!(
                    provider = %self.id,
                    status = resp.status().as_u16(),
                    "credential probe rejected"
                );
                Ok(false)
            }
            Err(e) => {
                tracing::warn!(provider = %self.id, error = %e, "credential probe failed");
                Ok(false)
            }
        }
    }

    fn provider_name(&self) -> &str {
        &self.id
    }

    fn available_models(&self) -> &ModelCatalog {
        &self.models
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_body_includes_json_hint_only_when_asked() {
        let msgs = [ChatMessage::user("oi")];
        let mut opts = CallOptions::new("gpt-4");
        let body = build_chat_body(&msgs, &opts);
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["messages"][0]["role"], "user");
        assert!(body.get("response_format").is_none());
        assert!(body.get("max_tokens").is_none());

        opts.response_format = ResponseFormat::Json;
        opts.max_tokens = Some(64);
        let body = build_chat_body(&msgs, &opts);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["max_tokens"], 64);
    }

    #[test]
    fn parse_chat_response_reads_message_and_usage() {
        let body = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "Olá!" } }],
            "usage": { "prompt_tokens": 9, "completion_tokens": 3, "total_tokens": 12 }
        });
        let resp = parse_chat_response("openai", &body).unwrap();
        assert_eq!(resp.message, ChatMessage::assistant("Olá!"));
        assert_eq!(resp.usage.total_tokens, 12);
    }

    #[test]
    fn parse_chat_response_without_choices_fails() {
        let body = serde_json::json!({ "choices": [] });
        assert!(matches!(
            parse_chat_response("openai", &body),
            Err(Error::Provider { .. })
        ));
    }

    #[test]
    fn default_catalog_groups_models_by_task() {
        let catalog = default_catalog();
        assert_eq!(catalog["chat"][0], "gpt-4");
        assert_eq!(catalog["completion"].len(), 3);
        assert_eq!(catalog["embedding"], vec!["text-embedding-ada-002".to_string()]);
    }
}
