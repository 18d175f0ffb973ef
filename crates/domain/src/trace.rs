use serde::Serialize;

/// Structured trace events emitted across all leadmsg crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ProviderRegistered {
        provider: String,
        kind: String,
    },
    ProviderSkipped {
        provider: String,
        reason: String,
    },
    LlmRequest {
        provider: String,
        model: String,
        task: String,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    LlmRetry {
        provider: String,
        operation: String,
        attempt: u32,
        delay_ms: u64,
        error: String,
    },
    PersonaFallback {
        provider: String,
        model: String,
        error: String,
    },
    LeadMessageGenerated {
        provider: String,
        model: String,
        persona: bool,
        chars: usize,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "lm_event");
    }
}
