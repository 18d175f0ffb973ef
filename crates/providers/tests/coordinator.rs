//! Coordinator and registry behaviour against in-process stub adapters.

use lm_domain::config::{LlmConfig, ProviderConfig};
use lm_domain::error::{Error, Result};
use lm_domain::lead::{LeadContext, MessageDirection, MessageInfo};
use lm_domain::message::{ChatMessage, Usage};
use lm_domain::sentiment::{LeadStatus, SentimentAnalysis, SentimentContext};
use lm_domain::task::{CallOptions, ModelCatalog, TaskOptions};
use lm_providers::prompts::PERSONA_FALLBACK;
use lm_providers::{lead, ChatResponse, ProviderAdapter, ProviderRegistry, RequestCoordinator};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Stub adapter
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone, Copy)]
enum Probe {
    Valid,
    Errors,
    Panics,
    Hangs,
}

#[derive(Debug, Clone)]
struct Call {
    op: &'static str,
    messages: Vec<ChatMessage>,
    options: CallOptions,
}

struct StubAdapter {
    name: String,
    reply: String,
    fail: bool,
    probe: Probe,
    models: ModelCatalog,
    calls: Mutex<Vec<Call>>,
}

impl StubAdapter {
    fn new(name: &str) -> Self {
        let mut models = ModelCatalog::new();
        models.insert("chat".into(), vec![format!("{name}-chat")]);
        Self {
            name: name.into(),
            reply: format!("reply from {name}"),
            fail: false,
            probe: Probe::Valid,
            models,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    fn probe(mut self, probe: Probe) -> Self {
        self.probe = probe;
        self
    }

    fn record(&self, op: &'static str, messages: &[ChatMessage], options: &CallOptions) {
        self.calls.lock().unwrap().push(Call {
            op,
            messages: messages.to_vec(),
            options: options.clone(),
        });
    }

    fn last_call(&self) -> Call {
        self.calls.lock().unwrap().last().cloned().expect("no call recorded")
    }

    fn respond(&self) -> Result<ChatResponse> {
        if self.fail {
            return Err(Error::Provider {
                provider: self.name.clone(),
                message: "HTTP 500 - upstream down".into(),
            });
        }
        Ok(ChatResponse {
            message: ChatMessage::assistant(self.reply.clone()),
            usage: Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
        })
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for StubAdapter {
    async fn completion(&self, prompt: &str, opts: &CallOptions) -> Result<String> {
        self.record("completion", &[ChatMessage::user(prompt)], opts);
        self.respond().map(|r| r.message.content)
    }

    async fn chat(&self, messages: &[ChatMessage], opts: &CallOptions) -> Result<ChatResponse> {
        self.record("chat", messages, opts);
        self.respond()
    }

    async fn embedding(&self, text: &str, opts: &CallOptions) -> Result<Vec<f32>> {
        self.record("embedding", &[ChatMessage::user(text)], opts);
        self.respond().map(|_| vec![0.1, 0.2, 0.3])
    }

    async fn analyze_sentiment(
        &self,
        text: &str,
        _ctx: &SentimentContext,
        opts: &CallOptions,
    ) -> Result<SentimentAnalysis> {
        self.record("sentiment", &[ChatMessage::user(text)], opts);
        self.respond()?;
        SentimentAnalysis::from_reply(
            r#"{"sentiment_score": 0.5, "intent": "pergunta",
                "lead_status": "interessado", "lead_score": 80}"#,
        )
    }

    async fn generate_lead_message(&self, ctx: &LeadContext, opts: &CallOptions) -> Result<String> {
        lead::compose(&self.name, ctx, opts, |messages, call| async move {
            self.record("lead_message", &messages, &call);
            self.respond()
        })
        .await
    }

    async fn validate_credentials(&self) -> Result<bool> {
        match self.probe {
            Probe::Valid => Ok(true),
            Probe::Errors => Err(Error::Http("connection reset".into())),
            Probe::Panics => panic!("probe exploded"),
            Probe::Hangs => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(true)
            }
        }
    }

    fn provider_name(&self) -> &str {
        &self.name
    }

    fn available_models(&self) -> &ModelCatalog {
        &self.models
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Fixtures
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `openai` with the stock default models plus a `local` provider that has
/// no per-task defaults.
fn llm_config() -> LlmConfig {
    let local = ProviderConfig {
        id: "local".into(),
        default_models: BTreeMap::new(),
        ..ProviderConfig::openai()
    };
    LlmConfig {
        providers: vec![ProviderConfig::openai(), local],
        ..LlmConfig::default()
    }
}

fn coordinator(openai: Arc<StubAdapter>, local: Arc<StubAdapter>) -> RequestCoordinator {
    let mut registry = ProviderRegistry::new("openai");
    registry.register("openai", openai).unwrap();
    registry.register("local", local).unwrap();
    RequestCoordinator::new(registry, &llm_config())
}

fn history(n: usize) -> Vec<MessageInfo> {
    (0..n)
        .map(|i| MessageInfo {
            direction: if i % 2 == 0 {
                MessageDirection::Incoming
            } else {
                MessageDirection::Outgoing
            },
            content: format!("turn {i}"),
            timestamp: format!("2024-05-0{}T10:00:00Z", i + 1),
        })
        .collect()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Registry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn get_by_name_and_default() {
    let mut registry = ProviderRegistry::new("openai");
    registry.register("openai", Arc::new(StubAdapter::new("openai"))).unwrap();
    registry.register("local", Arc::new(StubAdapter::new("local"))).unwrap();

    assert_eq!(registry.get(Some("local")).unwrap().provider_name(), "local");
    let by_default = registry.get(None).unwrap();
    let by_name = registry.get(Some("openai")).unwrap();
    assert_eq!(by_default.provider_name(), "openai");
    assert!(Arc::ptr_eq(&by_default, &by_name));
    assert_eq!(registry.list_available(), vec!["local", "openai"]);
}

#[test]
fn unknown_provider_is_config_error() {
    let mut registry = ProviderRegistry::new("openai");
    registry.register("openai", Arc::new(StubAdapter::new("openai"))).unwrap();

    let err = registry.get(Some("nonexistent")).err().unwrap();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("provider 'nonexistent' not configured"));
}

#[test]
fn unregistered_default_is_config_error() {
    let mut registry = ProviderRegistry::new("anthropic");
    registry.register("openai", Arc::new(StubAdapter::new("openai"))).unwrap();
    assert!(matches!(registry.get(None), Err(Error::Config(_))));
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut registry = ProviderRegistry::new("openai");
    registry.register("openai", Arc::new(StubAdapter::new("openai"))).unwrap();
    let err = registry
        .register("openai", Arc::new(StubAdapter::new("openai")))
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(registry.len(), 1);
}

#[test]
fn from_config_skips_providers_without_credentials() {
    let mut config = LlmConfig::default();
    config.providers[0].auth.env = Some("LM_TEST_MISSING_OPENAI_KEY_5150".into());
    let registry = ProviderRegistry::from_config(&config);
    assert!(registry.is_empty());
    assert!(matches!(registry.get(None), Err(Error::Config(_))));
}

#[test]
fn from_config_registers_provider_with_direct_key() {
    let mut config = LlmConfig::default();
    config.providers[0].auth.key = Some("sk-test".into());
    let registry = ProviderRegistry::from_config(&config);
    assert_eq!(registry.list_available(), vec!["openai"]);
    let adapter = registry.get(None).unwrap();
    assert_eq!(adapter.provider_name(), "openai");
    assert!(adapter.available_models().contains_key("embedding"));
}

#[tokio::test]
async fn status_isolates_failing_adapters() {
    let mut registry =
        ProviderRegistry::new("ok").with_probe_timeout(Duration::from_millis(50));
    registry.register("ok", Arc::new(StubAdapter::new("ok"))).unwrap();
    registry
        .register("erroring", Arc::new(StubAdapter::new("erroring").probe(Probe::Errors)))
        .unwrap();
    registry
        .register("panicking", Arc::new(StubAdapter::new("panicking").probe(Probe::Panics)))
        .unwrap();
    registry
        .register("hanging", Arc::new(StubAdapter::new("hanging").probe(Probe::Hangs)))
        .unwrap();

    let status = registry.status().await;
    assert_eq!(status.len(), 4);

    let ok = &status["ok"];
    assert!(ok.available);
    assert_eq!(ok.credentials_valid, Some(true));
    assert_eq!(ok.models.as_ref().unwrap()["chat"], vec!["ok-chat".to_string()]);
    assert!(ok.error.is_none());

    for name in ["erroring", "panicking", "hanging"] {
        let entry = &status[name];
        assert!(!entry.available, "{name} should be unavailable");
        assert!(entry.error.is_some(), "{name} should carry an error");
        assert!(entry.models.is_none());
    }
    assert!(status["erroring"].error.as_deref().unwrap().contains("connection reset"));
    assert!(status["hanging"].error.as_deref().unwrap().contains("timed out"));
}

#[tokio::test]
async fn status_serializes_like_the_http_payload() {
    let mut registry = ProviderRegistry::new("bad");
    registry
        .register("bad", Arc::new(StubAdapter::new("bad").probe(Probe::Errors)))
        .unwrap();
    let json = serde_json::to_value(registry.status().await).unwrap();
    assert_eq!(json["bad"]["available"], false);
    assert!(json["bad"].get("credentials_valid").is_none());
    assert!(json["bad"]["error"].is_string());
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Coordinator
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn chat_with_empty_options_uses_task_default() {
    let openai = Arc::new(StubAdapter::new("openai"));
    let coord = coordinator(openai.clone(), Arc::new(StubAdapter::new("local")));

    let resp = coord
        .chat(&[ChatMessage::user("oi")], TaskOptions::default())
        .await
        .unwrap();
    assert_eq!(resp.message.content, "reply from openai");
    assert_eq!(resp.usage.total_tokens, 15);

    let call = openai.last_call();
    assert_eq!(call.op, "chat");
    assert_eq!(call.options.model, "gpt-3.5-turbo");
}

#[tokio::test]
async fn explicit_model_beats_task_default() {
    let openai = Arc::new(StubAdapter::new("openai"));
    let coord = coordinator(openai.clone(), Arc::new(StubAdapter::new("local")));

    coord
        .analyze_sentiment("caro", &SentimentContext::default(), TaskOptions::default())
        .await
        .unwrap();
    assert_eq!(openai.last_call().options.model, "gpt-4");

    let analysis = coord
        .analyze_sentiment(
            "caro",
            &SentimentContext::default(),
            TaskOptions::default().with_model("gpt-4o-mini"),
        )
        .await
        .unwrap();
    assert_eq!(openai.last_call().options.model, "gpt-4o-mini");
    assert_eq!(analysis.lead_status, LeadStatus::Interested);
}

#[tokio::test]
async fn provider_without_task_default_uses_fallback_model() {
    let local = Arc::new(StubAdapter::new("local"));
    let coord = coordinator(Arc::new(StubAdapter::new("openai")), local.clone());

    coord
        .embedding("texto", TaskOptions::default().with_provider("local"))
        .await
        .unwrap();
    let call = local.last_call();
    assert_eq!(call.op, "embedding");
    assert_eq!(call.options.model, "gpt-3.5-turbo");
}

#[tokio::test]
async fn per_task_defaults_differ() {
    let openai = Arc::new(StubAdapter::new("openai"));
    let coord = coordinator(openai.clone(), Arc::new(StubAdapter::new("local")));

    coord.completion("Era uma vez", TaskOptions::default()).await.unwrap();
    assert_eq!(openai.last_call().options.model, "gpt-3.5-turbo-instruct");

    coord.embedding("texto", TaskOptions::default()).await.unwrap();
    assert_eq!(openai.last_call().options.model, "text-embedding-ada-002");
}

#[tokio::test]
async fn unknown_provider_override_fails_without_calling_anything() {
    let openai = Arc::new(StubAdapter::new("openai"));
    let coord = coordinator(openai.clone(), Arc::new(StubAdapter::new("local")));

    let err = coord
        .completion("x", TaskOptions::default().with_provider("mistral"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(openai.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn blank_provider_override_means_default() {
    let openai = Arc::new(StubAdapter::new("openai"));
    let local = Arc::new(StubAdapter::new("local"));
    let coord = coordinator(openai.clone(), local.clone());

    coord
        .completion("x", TaskOptions::default().with_provider("  "))
        .await
        .unwrap();
    assert_eq!(openai.calls.lock().unwrap().len(), 1);
    assert!(local.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn caller_overrides_flow_through() {
    let openai = Arc::new(StubAdapter::new("openai"));
    let coord = coordinator(openai.clone(), Arc::new(StubAdapter::new("local")));

    let opts = TaskOptions {
        temperature: Some(0.1),
        max_tokens: Some(32),
        ..Default::default()
    };
    coord.chat(&[ChatMessage::user("oi")], opts).await.unwrap();
    let call = openai.last_call();
    assert_eq!(call.options.temperature, Some(0.1));
    assert_eq!(call.options.max_tokens, Some(32));
}

#[tokio::test]
async fn persona_failure_degrades_to_fallback_text() {
    let openai = Arc::new(StubAdapter::new("openai").failing());
    let coord = coordinator(openai.clone(), Arc::new(StubAdapter::new("local")));

    let text = coord
        .generate_lead_message(&LeadContext::persona("oi", history(2)), TaskOptions::default())
        .await
        .unwrap();
    assert_eq!(text, PERSONA_FALLBACK);
    assert_eq!(openai.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn generic_failure_surfaces_as_error() {
    let openai = Arc::new(StubAdapter::new("openai").failing());
    let coord = coordinator(openai, Arc::new(StubAdapter::new("local")));

    let err = coord
        .generate_lead_message(&LeadContext::default(), TaskOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Provider { .. }));
}

#[tokio::test]
async fn persona_forwards_last_five_history_entries() {
    let openai = Arc::new(StubAdapter::new("openai"));
    let coord = coordinator(openai.clone(), Arc::new(StubAdapter::new("local")));

    let text = coord
        .generate_lead_message(
            &LeadContext::persona("quero saber o preço", history(8)),
            TaskOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(text, "reply from openai");

    let call = openai.last_call();
    assert_eq!(call.op, "lead_message");
    assert_eq!(call.options.model, "gpt-3.5-turbo");
    let history: Vec<&str> = call.messages[1..6].iter().map(|m| m.content.as_str()).collect();
    assert_eq!(history, vec!["turn 3", "turn 4", "turn 5", "turn 6", "turn 7"]);
    assert_eq!(call.messages.last().unwrap().content, "quero saber o preço");
}

#[tokio::test]
async fn coordinator_reports_registry_status() {
    let coord = coordinator(
        Arc::new(StubAdapter::new("openai")),
        Arc::new(StubAdapter::new("local").probe(Probe::Errors)),
    );
    let status = coord.provider_status().await;
    assert!(status["openai"].available);
    assert!(!status["local"].available);
}
