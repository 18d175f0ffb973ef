//! Lead-message generation context.
//!
//! These are the typed shapes of what upstream callers send about a lead:
//! who they are, what happened (event), how long they have been silent
//! (inactivity) and what was said so far (history). Absent fields fall back
//! to neutral values so adapters never have to guess.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The chatbot type that selects the persona generation mode.
pub const PERSONA_CHATBOT: &str = "ruth";

/// Sentiment status used when the caller does not know it.
pub const DEFAULT_SENTIMENT_STATUS: &str = "indeterminado";

/// Lead score used when the caller does not know it.
pub const DEFAULT_LEAD_SCORE: u8 = 50;

/// Event type that asks for an immediate follow-up.
pub const EVENT_ABANDONED_CART: &str = "carrinho_abandonado";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadInfo {
    pub id: String,
    pub name: String,
    #[serde(default = "d_sentiment_status", deserialize_with = "status_or_default")]
    pub sentiment_status: String,
    /// Accepts any JSON number (the sentiment endpoint reports floats) and
    /// clamps it to 0..=100.
    #[serde(default = "d_lead_score", deserialize_with = "score_or_default")]
    pub lead_score: u8,
    #[serde(default)]
    pub project_name: Option<String>,
}

impl Default for LeadInfo {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            sentiment_status: d_sentiment_status(),
            lead_score: d_lead_score(),
            project_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageDirection {
    /// Sent by the lead.
    Incoming,
    /// Sent by us (operator or bot).
    Outgoing,
}

/// One entry of the conversation history, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageInfo {
    pub direction: MessageDirection,
    pub content: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventContext {
    pub event_type: String,
    #[serde(default)]
    pub event_data: Map<String, Value>,
    #[serde(default)]
    pub message_purpose: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InactivityLevel {
    Short,
    Medium,
    Long,
}

impl InactivityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            InactivityLevel::Short => "short",
            InactivityLevel::Medium => "medium",
            InactivityLevel::Long => "long",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InactivityContext {
    pub level: InactivityLevel,
    pub days_inactive: u32,
    #[serde(default)]
    pub last_interaction: Option<Map<String, Value>>,
}

/// Everything an adapter may inspect when writing a message for a lead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadContext {
    #[serde(default)]
    pub lead_info: LeadInfo,
    #[serde(default)]
    pub chatbot_type: Option<String>,
    #[serde(default)]
    pub user_message: Option<String>,
    #[serde(default)]
    pub conversation_history: Vec<MessageInfo>,
    #[serde(default)]
    pub event: Option<EventContext>,
    #[serde(default)]
    pub inactivity: Option<InactivityContext>,
    #[serde(default)]
    pub personalization_hints: Vec<String>,
}

impl LeadContext {
    /// Context for a persona conversation turn.
    pub fn persona(user_message: impl Into<String>, history: Vec<MessageInfo>) -> Self {
        Self {
            chatbot_type: Some(PERSONA_CHATBOT.into()),
            user_message: Some(user_message.into()),
            conversation_history: history,
            ..Default::default()
        }
    }

    pub fn is_persona(&self) -> bool {
        self.chatbot_type.as_deref() == Some(PERSONA_CHATBOT)
    }

    pub fn event_type(&self) -> Option<&str> {
        self.event.as_ref().map(|e| e.event_type.as_str())
    }

    /// The last `n` history entries, in their original order.
    pub fn recent_history(&self, n: usize) -> &[MessageInfo] {
        let len = self.conversation_history.len();
        &self.conversation_history[len.saturating_sub(n)..]
    }
}

/// When the generated message should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedTiming {
    Immediate,
    Morning,
    BusinessHours,
}

impl SuggestedTiming {
    /// Abandoned carts go out right away, long-silent leads get a morning
    /// nudge, everything else waits for business hours.
    pub fn for_context(ctx: &LeadContext) -> Self {
        if ctx.event_type() == Some(EVENT_ABANDONED_CART) {
            SuggestedTiming::Immediate
        } else if ctx
            .inactivity
            .as_ref()
            .is_some_and(|i| i.level == InactivityLevel::Long)
        {
            SuggestedTiming::Morning
        } else {
            SuggestedTiming::BusinessHours
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_sentiment_status() -> String {
    DEFAULT_SENTIMENT_STATUS.into()
}
fn status_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(d_sentiment_status))
}

fn score_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
    Ok(match Option::<f64>::deserialize(d)? {
        Some(score) if score.is_finite() => score.round().clamp(0.0, 100.0) as u8,
        _ => d_lead_score(),
    })
}

fn d_lead_score() -> u8 {
    DEFAULT_LEAD_SCORE
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
