//! Sentiment analysis result envelope.
//!
//! The provider is asked for a JSON object with exactly these keys; the
//! reply is parsed and range-checked here so every adapter shares the same
//! acceptance rules.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lead status vocabulary the analysis may classify into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadStatus {
    #[serde(rename = "interessado")]
    Interested,
    #[serde(rename = "sem interesse")]
    NotInterested,
    #[serde(rename = "achou caro")]
    TooExpensive,
    #[serde(rename = "quer desconto")]
    WantsDiscount,
    #[serde(rename = "parcelamento")]
    Installments,
    #[serde(rename = "compra futura")]
    FuturePurchase,
    #[serde(rename = "indeterminado")]
    Undetermined,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 7] = [
        LeadStatus::Interested,
        LeadStatus::NotInterested,
        LeadStatus::TooExpensive,
        LeadStatus::WantsDiscount,
        LeadStatus::Installments,
        LeadStatus::FuturePurchase,
        LeadStatus::Undetermined,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::Interested => "interessado",
            LeadStatus::NotInterested => "sem interesse",
            LeadStatus::TooExpensive => "achou caro",
            LeadStatus::WantsDiscount => "quer desconto",
            LeadStatus::Installments => "parcelamento",
            LeadStatus::FuturePurchase => "compra futura",
            LeadStatus::Undetermined => "indeterminado",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySentiment {
    pub name: String,
    pub sentiment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    /// -1.0 (very negative) to 1.0 (very positive).
    pub sentiment_score: f64,
    pub intent: String,
    #[serde(default)]
    pub entities: Vec<EntitySentiment>,
    pub lead_status: LeadStatus,
    /// 0 to 100, closeness to conversion.
    pub lead_score: f64,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Extra context for the analysis instruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentContext {
    /// Product or service the conversation is about.
    #[serde(default)]
    pub product: Option<String>,
}

impl SentimentAnalysis {
    /// Parse and validate a provider reply.
    pub fn from_reply(reply: &str) -> Result<Self> {
        let analysis: SentimentAnalysis = serde_json::from_str(reply.trim())
            .map_err(|e| Error::Parse(format!("sentiment reply is not a valid envelope: {e}")))?;
        analysis.validate()?;
        Ok(analysis)
    }

    fn validate(&self) -> Result<()> {
        if !(-1.0..=1.0).contains(&self.sentiment_score) {
            return Err(Error::Parse(format!(
                "sentiment_score {} outside [-1, 1]",
                self.sentiment_score
            )));
        }
        if !(0.0..=100.0).contains(&self.lead_score) {
            return Err(Error::Parse(format!(
                "lead_score {} outside [0, 100]",
                self.lead_score
            )));
        }
        if let Some(entity) = self
            .entities
            .iter()
            .find(|e| !(-1.0..=1.0).contains(&e.sentiment))
        {
            return Err(Error::Parse(format!(
                "entity '{}' sentiment {} outside [-1, 1]",
                entity.name, entity.sentiment
            )));
        }
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "sentiment_score": 0.6,
        "intent": "pergunta",
        "entities": [{"name": "Método Blindado", "sentiment": 0.8}],
        "lead_status": "interessado",
        "lead_score": 72,
        "recommendations": ["Apresentar o cronograma do curso"]
    }"#;

    #[test]
    fn parses_valid_reply() {
        let a = SentimentAnalysis::from_reply(VALID).unwrap();
        assert_eq!(a.lead_status, LeadStatus::Interested);
        assert_eq!(a.intent, "pergunta");
        assert_eq!(a.entities.len(), 1);
        assert!((a.lead_score - 72.0).abs() < f64::EPSILON);
    }

    #[test]
    fn optional_lists_default_to_empty() {
        let reply = r#"{"sentiment_score": 0, "intent": "informação",
                        "lead_status": "indeterminado", "lead_score": 50}"#;
        let a = SentimentAnalysis::from_reply(reply).unwrap();
        assert!(a.entities.is_empty());
        assert!(a.recommendations.is_empty());
    }

    #[test]
    fn rejects_non_json() {
        let err = SentimentAnalysis::from_reply("Claro! O sentimento é positivo.").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn rejects_unknown_status() {
        let reply = VALID.replace("interessado", "animado");
        assert!(matches!(
            SentimentAnalysis::from_reply(&reply),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_scores() {
        let reply = VALID.replace("0.6", "1.7");
        assert!(matches!(
            SentimentAnalysis::from_reply(&reply),
            Err(Error::Parse(_))
        ));
        let reply = VALID.replace("72", "140");
        assert!(matches!(
            SentimentAnalysis::from_reply(&reply),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn status_strings_match_serde_names() {
        for status in LeadStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
