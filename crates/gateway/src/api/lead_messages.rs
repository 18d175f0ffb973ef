//! Lead message endpoints.
//!
//! `generate` covers every event-driven or inactivity-driven message and
//! also the persona when `chatbot_type = "ruth"`; `ruth` is the dedicated
//! persona route used by the live chat.

use axum::extract::State;
use axum::Json;
use lm_domain::lead::{
    EventContext, InactivityContext, LeadContext, LeadInfo, MessageInfo, SuggestedTiming,
    PERSONA_CHATBOT,
};
use lm_domain::task::TaskOptions;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ApiError;
use crate::state::AppState;

// ── Request / response bodies ──────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub lead_info: LeadInfo,
    #[serde(default)]
    pub user_message: Option<String>,
    #[serde(default)]
    pub conversation_history: Option<Vec<MessageInfo>>,
    #[serde(default)]
    pub event_context: Option<EventContext>,
    #[serde(default)]
    pub inactivity_context: Option<InactivityContext>,
    #[serde(default)]
    pub personalization_hints: Option<Vec<String>>,
    #[serde(default)]
    pub chatbot_type: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RuthRequest {
    pub user_message: String,
    #[serde(default)]
    pub conversation_history: Option<Vec<MessageInfo>>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_timing: Option<SuggestedTiming>,
    pub metadata: Map<String, Value>,
}

impl GenerateRequest {
    /// Metadata echoed back with the generated message.
    fn metadata(&self) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("lead_id".into(), self.lead_info.id.clone().into());
        metadata.insert(
            "sentiment_status".into(),
            self.lead_info.sentiment_status.clone().into(),
        );
        metadata.insert("lead_score".into(), self.lead_info.lead_score.into());
        if let Some(event) = &self.event_context {
            metadata.insert("event_type".into(), event.event_type.clone().into());
        }
        if let Some(inactivity) = &self.inactivity_context {
            metadata.insert("inactivity_level".into(), inactivity.level.as_str().into());
            metadata.insert("days_inactive".into(), inactivity.days_inactive.into());
        }
        metadata
    }

    fn into_parts(self) -> (LeadContext, TaskOptions) {
        let ctx = LeadContext {
            lead_info: self.lead_info,
            chatbot_type: self.chatbot_type,
            user_message: self.user_message,
            conversation_history: self.conversation_history.unwrap_or_default(),
            event: self.event_context,
            inactivity: self.inactivity_context,
            personalization_hints: self.personalization_hints.unwrap_or_default(),
        };
        let opts = TaskOptions {
            model: self.model,
            provider: self.provider,
            ..Default::default()
        };
        (ctx, opts)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /{api_version}/lead-messages/generate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let metadata = req.metadata();
    let (ctx, opts) = req.into_parts();
    let suggested_timing = SuggestedTiming::for_context(&ctx);

    tracing::info!(
        lead_id = %ctx.lead_info.id,
        event_type = ctx.event_type().unwrap_or("none"),
        persona = ctx.is_persona(),
        "lead message requested"
    );

    let message = state
        .coordinator
        .generate_lead_message(&ctx, opts)
        .await
        .map_err(|e| ApiError::internal("generate message", e))?;

    Ok(Json(MessageResponse {
        message,
        suggested_timing: Some(suggested_timing),
        metadata,
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /{api_version}/lead-messages/ruth
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn ruth(
    State(state): State<AppState>,
    Json(req): Json<RuthRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let ctx = LeadContext::persona(req.user_message, req.conversation_history.unwrap_or_default());
    let opts = TaskOptions {
        model: req.model,
        ..Default::default()
    };

    let message = state
        .coordinator
        .generate_lead_message(&ctx, opts)
        .await
        .map_err(|e| ApiError::internal("generate message", e))?;

    let mut metadata = Map::new();
    metadata.insert("chatbot".into(), PERSONA_CHATBOT.into());
    Ok(Json(MessageResponse {
        message,
        suggested_timing: None,
        metadata,
    }))
}
