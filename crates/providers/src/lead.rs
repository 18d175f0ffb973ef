//! Lead-message generation on top of a single chat round-trip.
//!
//! Adapters hand [`compose`] a closure performing one vendor chat call
//! without retry. Persona contexts absorb any error of that call into
//! [`PERSONA_FALLBACK`]; generic contexts propagate it.

use crate::prompts::{
    self, LEAD_TEMPERATURE, PERSONA_FALLBACK, PERSONA_MAX_TOKENS, PERSONA_TEMPERATURE,
};
use crate::traits::ChatResponse;
use lm_domain::error::Result;
use lm_domain::lead::LeadContext;
use lm_domain::message::ChatMessage;
use lm_domain::task::{CallOptions, ResponseFormat};
use lm_domain::trace::TraceEvent;
use std::future::Future;

pub async fn compose<F, Fut>(
    provider: &str,
    ctx: &LeadContext,
    opts: &CallOptions,
    send: F,
) -> Result<String>
where
    F: FnOnce(Vec<ChatMessage>, CallOptions) -> Fut,
    Fut: Future<Output = Result<ChatResponse>>,
{
    let persona = ctx.is_persona();
    let (messages, call) = if persona {
        (prompts::persona_messages(ctx), persona_options(opts))
    } else {
        (prompts::lead_messages(ctx), lead_options(opts))
    };
    let model = call.model.clone();

    tracing::info!(
        provider = %provider,
        model = %model,
        persona,
        messages = messages.len(),
        "generating lead message"
    );

    let text = match send(messages, call).await {
        Ok(resp) => resp.message.content.trim().to_string(),
        Err(e) if persona => {
            tracing::error!(
                provider = %provider,
                model = %model,
                error = %e,
                "persona message failed, using fallback reply"
            );
            TraceEvent::PersonaFallback {
                provider: provider.to_string(),
                model,
                error: e.to_string(),
            }
            .emit();
            return Ok(PERSONA_FALLBACK.to_string());
        }
        Err(e) => {
            tracing::error!(
                provider = %provider,
                model = %model,
                error = %e,
                "lead message generation failed"
            );
            return Err(e);
        }
    };

    TraceEvent::LeadMessageGenerated {
        provider: provider.to_string(),
        model,
        persona,
        chars: text.chars().count(),
    }
    .emit();
    Ok(text)
}

fn persona_options(opts: &CallOptions) -> CallOptions {
    CallOptions {
        model: opts.model.clone(),
        temperature: Some(opts.temperature.unwrap_or(PERSONA_TEMPERATURE)),
        max_tokens: Some(opts.max_tokens.unwrap_or(PERSONA_MAX_TOKENS)),
        response_format: ResponseFormat::Text,
    }
}

fn lead_options(opts: &CallOptions) -> CallOptions {
    CallOptions {
        model: opts.model.clone(),
        temperature: Some(opts.temperature.unwrap_or(LEAD_TEMPERATURE)),
        max_tokens: opts.max_tokens,
        response_format: ResponseFormat::Text,
    }
}
