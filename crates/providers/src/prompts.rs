//! Instruction text and message assembly for the prompt-driven tasks.
//!
//! All builders are pure: they turn a typed context into the ordered
//! message list an adapter forwards to its chat endpoint.

use lm_domain::lead::{InactivityLevel, LeadContext, MessageDirection, MessageInfo};
use lm_domain::message::ChatMessage;
use lm_domain::sentiment::SentimentContext;

/// System instruction of the persona chatbot.
pub const PERSONA_PROMPT: &str = include_str!("../prompts/ruth.xml");

/// Reply used when the persona's vendor call fails.
pub const PERSONA_FALLBACK: &str = "Oi! Sou a Ruth, da equipe da professora Milla Borges. \
Estou aqui pra te ajudar com qualquer dúvida sobre os nossos cursos de redação. Em que posso ajudar?";

/// History entries forwarded with a persona turn.
pub const PERSONA_HISTORY_LIMIT: usize = 5;

/// History entries rendered into the generic lead-message instruction.
pub const LEAD_HISTORY_LIMIT: usize = 5;

pub const PERSONA_TEMPERATURE: f64 = 0.7;
pub const PERSONA_MAX_TOKENS: u32 = 150;
pub const LEAD_TEMPERATURE: f64 = 0.7;
pub const SENTIMENT_TEMPERATURE: f64 = 0.3;

const SENTIMENT_INSTRUCTION: &str = "\
Analise o sentimento do texto a seguir e forneça:
1. Uma pontuação de sentimento de -1 (muito negativo) a 1 (muito positivo)
2. A intenção principal (pergunta, reclamação, elogio, solicitação, informação)
3. Entidades relevantes mencionadas e o sentimento associado a cada uma
4. Status do lead (interessado, sem interesse, achou caro, quer desconto, parcelamento, compra futura, indeterminado)
5. Lead score (0-100) indicando proximidade de conversão
6. Recomendações para abordagem

Responda apenas com um objeto JSON com as chaves: \"sentiment_score\" (número), \
\"intent\" (texto), \"entities\" (lista de objetos com \"name\" e \"sentiment\"), \
\"lead_status\" (um dos status acima, exatamente como escrito), \
\"lead_score\" (número) e \"recommendations\" (lista de textos).";

// ── persona ─────────────────────────────────────────────────────────

/// System instruction, then the last [`PERSONA_HISTORY_LIMIT`] history
/// entries oldest first, then the lead's current message (omitted when
/// empty).
pub fn persona_messages(ctx: &LeadContext) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(PERSONA_HISTORY_LIMIT + 2);
    messages.push(ChatMessage::system(PERSONA_PROMPT));
    messages.extend(ctx.recent_history(PERSONA_HISTORY_LIMIT).iter().map(history_turn));

    if let Some(text) = ctx.user_message.as_deref().map(str::trim) {
        if !text.is_empty() {
            messages.push(ChatMessage::user(text));
        }
    }
    messages
}

fn history_turn(entry: &MessageInfo) -> ChatMessage {
    match entry.direction {
        MessageDirection::Outgoing => ChatMessage::assistant(entry.content.as_str()),
        MessageDirection::Incoming => ChatMessage::user(entry.content.as_str()),
    }
}

// ── generic lead message ────────────────────────────────────────────

pub fn lead_messages(ctx: &LeadContext) -> Vec<ChatMessage> {
    let event_type = ctx.event_type().unwrap_or_default();
    vec![
        ChatMessage::system(lead_system_prompt(ctx)),
        ChatMessage::user(format!(
            "Gere uma mensagem para este lead sobre o evento {event_type}."
        )),
    ]
}

pub fn lead_system_prompt(ctx: &LeadContext) -> String {
    let lead = &ctx.lead_info;
    let name = if lead.name.trim().is_empty() {
        "Cliente"
    } else {
        lead.name.as_str()
    };
    let event_type = ctx.event_type().unwrap_or_default();
    let purpose = ctx
        .event
        .as_ref()
        .and_then(|e| e.message_purpose.as_deref())
        .unwrap_or_default();

    let mut p = String::with_capacity(2048);
    p.push_str(
        "Você é um assistente de vendas profissional que está gerando uma mensagem \
         personalizada para um lead.\n\n",
    );

    p.push_str("INFORMAÇÕES DO LEAD:\n");
    p.push_str(&format!("- Nome: {name}\n"));
    p.push_str(&format!("- Status de sentimento: {}\n", lead.sentiment_status));
    p.push_str(&format!("- Lead score: {}/100\n", lead.lead_score));
    if let Some(project) = lead.project_name.as_deref().filter(|s| !s.is_empty()) {
        p.push_str(&format!("- Projeto: {project}\n"));
    }

    p.push_str("\nCONTEXTO:\n");
    p.push_str(&format!("- Tipo de evento: {event_type}\n"));
    p.push_str(&format!("- Propósito da mensagem: {purpose}\n"));
    if let Some(event) = ctx.event.as_ref().filter(|e| !e.event_data.is_empty()) {
        let data = serde_json::to_string(&event.event_data).unwrap_or_default();
        p.push_str(&format!("- Dados do evento: {data}\n"));
    }
    if let Some(inactivity) = &ctx.inactivity {
        p.push_str(&format!(
            "- Inatividade: {} ({} dias sem interação)\n",
            inactivity.level.as_str(),
            inactivity.days_inactive
        ));
    }

    p.push_str(
        "\nDIRETRIZES:\n\
         - Seja amigável, profissional e empático\n\
         - Personalize a mensagem com base no status de sentimento do lead\n\
         - Mantenha a mensagem concisa (máximo 300 caracteres)\n\
         - Use linguagem clara e direta\n\
         - Inclua uma pergunta ou chamada para ação no final\n\
         - Evite linguagem promocional exagerada\n\
         - Não use emojis\n",
    );

    if let Some(guidance) = event_guidance(event_type) {
        p.push_str("\nINSTRUÇÕES ESPECÍFICAS:\n");
        p.push_str(guidance);
    }
    if let Some(guidance) = sentiment_guidance(&lead.sentiment_status) {
        p.push('\n');
        p.push_str(guidance);
    }
    if let Some(inactivity) = &ctx.inactivity {
        p.push_str("\nPARA LEADS INATIVOS:\n");
        p.push_str(inactivity_guidance(inactivity.level));
    }

    if !ctx.personalization_hints.is_empty() {
        p.push_str("\nDICAS DE PERSONALIZAÇÃO:\n");
        for hint in &ctx.personalization_hints {
            p.push_str(&format!("- {hint}\n"));
        }
    }

    let history = ctx.recent_history(LEAD_HISTORY_LIMIT);
    if !history.is_empty() {
        p.push_str("\nHISTÓRICO RECENTE (mais antigo primeiro):\n");
        for entry in history {
            let who = match entry.direction {
                MessageDirection::Incoming => "Lead",
                MessageDirection::Outgoing => "Nós",
            };
            p.push_str(&format!("- {who}: {}\n", entry.content));
        }
    }

    if let Some(text) = ctx.user_message.as_deref().filter(|s| !s.trim().is_empty()) {
        p.push_str(&format!("\nÚLTIMA MENSAGEM DO LEAD:\n{text}\n"));
    }

    p
}

fn event_guidance(event_type: &str) -> Option<&'static str> {
    match event_type {
        "carrinho_abandonado" => Some(
            "- Mencione os itens que o lead deixou no carrinho\n\
             - Ofereça ajuda para finalizar a compra\n\
             - Pergunte se há alguma dúvida impedindo a finalização\n",
        ),
        "visualizou_propriedade" => Some(
            "- Mencione a propriedade específica que o lead visualizou\n\
             - Destaque um benefício ou característica importante dessa propriedade\n\
             - Ofereça mais informações ou uma visita/demonstração\n",
        ),
        "dias_sem_resposta" => Some(
            "- Inicie com um lembrete sutil sobre a última interação\n\
             - Ofereça uma informação nova ou valor adicional\n\
             - Pergunte se ainda há interesse\n",
        ),
        _ => None,
    }
}

fn sentiment_guidance(status: &str) -> Option<&'static str> {
    match status {
        "achou caro" => Some(
            "PARA LEADS QUE \"ACHARAM CARO\":\n\
             - Enfatize o valor e benefícios de longo prazo\n\
             - Mencione opções de financiamento ou parcelamento, se aplicável\n\
             - Destaque o retorno sobre o investimento\n",
        ),
        "interessado" => Some(
            "PARA LEADS \"INTERESSADOS\":\n\
             - Seja mais direto e ofereça próximos passos concretos\n\
             - Crie um senso de urgência leve\n\
             - Ofereça facilitar o processo de compra/aquisição\n",
        ),
        _ => None,
    }
}

fn inactivity_guidance(level: InactivityLevel) -> &'static str {
    match level {
        InactivityLevel::Short => "- Retome o contato de forma leve, sem cobrar uma resposta\n",
        InactivityLevel::Medium => {
            "- Relembre o interesse anterior do lead\n\
             - Traga uma novidade ou um conteúdo útil\n"
        }
        InactivityLevel::Long => {
            "- Reapresente-se brevemente\n\
             - Pergunte se o interesse ainda existe, sem pressionar\n"
        }
    }
}

// ── sentiment ───────────────────────────────────────────────────────

pub fn sentiment_messages(text: &str, ctx: &SentimentContext) -> Vec<ChatMessage> {
    let mut system = SENTIMENT_INSTRUCTION.to_string();
    if let Some(product) = ctx.product.as_deref().filter(|s| !s.is_empty()) {
        system.push_str(&format!(
            "\n\nContexto: O produto/serviço em questão é {product}."
        ));
    }
    vec![ChatMessage::system(system), ChatMessage::user(text)]
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use lm_domain::lead::{EventContext, InactivityContext, LeadInfo};
    use lm_domain::message::Role;
    use serde_json::{json, Map};

    fn history(n: usize) -> Vec<MessageInfo> {
        (0..n)
            .map(|i| MessageInfo {
                direction: if i % 2 == 0 {
                    MessageDirection::Incoming
                } else {
                    MessageDirection::Outgoing
                },
                content: format!("msg {i}"),
                timestamp: String::new(),
            })
            .collect()
    }

    #[test]
    fn persona_forwards_last_five_history_entries_in_order() {
        let ctx = LeadContext::persona("quanto custa?", history(8));
        let messages = persona_messages(&ctx);

        assert_eq!(messages.len(), 7);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("<nome>Ruth</nome>"));

        let forwarded: Vec<&str> = messages[1..6].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(forwarded, vec!["msg 3", "msg 4", "msg 5", "msg 6", "msg 7"]);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[2].role, Role::User);

        assert_eq!(messages[6], ChatMessage::user("quanto custa?"));
    }

    #[test]
    fn persona_skips_empty_user_message() {
        let ctx = LeadContext::persona("   ", history(1));
        let messages = persona_messages(&ctx);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "msg 0");
    }

    #[test]
    fn persona_prompt_has_no_markup_comments() {
        assert!(!PERSONA_PROMPT.contains("<!--"));
        assert!(PERSONA_PROMPT.trim_end().ends_with("</assistente>"));
    }

    #[test]
    fn lead_prompt_uses_neutral_defaults() {
        let prompt = lead_system_prompt(&LeadContext::default());
        assert!(prompt.contains("- Nome: Cliente"));
        assert!(prompt.contains("- Status de sentimento: indeterminado"));
        assert!(prompt.contains("- Lead score: 50/100"));
        assert!(!prompt.contains("INSTRUÇÕES ESPECÍFICAS"));
        assert!(!prompt.contains("HISTÓRICO RECENTE"));
    }

    #[test]
    fn lead_prompt_includes_event_and_sentiment_guidance() {
        let mut data = Map::new();
        data.insert("items".into(), json!(["Método Blindado"]));
        let ctx = LeadContext {
            lead_info: LeadInfo {
                id: "42".into(),
                name: "Ana".into(),
                sentiment_status: "achou caro".into(),
                lead_score: 70,
                project_name: Some("Método Blindado".into()),
            },
            event: Some(EventContext {
                event_type: "carrinho_abandonado".into(),
                event_data: data,
                message_purpose: Some("recuperar venda".into()),
            }),
            personalization_hints: vec!["prefere mensagens curtas".into()],
            ..Default::default()
        };
        let prompt = lead_system_prompt(&ctx);
        assert!(prompt.contains("- Nome: Ana"));
        assert!(prompt.contains("- Projeto: Método Blindado"));
        assert!(prompt.contains("- Propósito da mensagem: recuperar venda"));
        assert!(prompt.contains("Dados do evento: {\"items\":[\"Método Blindado\"]}"));
        assert!(prompt.contains("deixou no carrinho"));
        assert!(prompt.contains("ACHARAM CARO"));
        assert!(prompt.contains("- prefere mensagens curtas"));

        let messages = lead_messages(&ctx);
        assert_eq!(
            messages[1].content,
            "Gere uma mensagem para este lead sobre o evento carrinho_abandonado."
        );
    }

    #[test]
    fn lead_prompt_renders_inactivity_and_recent_history() {
        let ctx = LeadContext {
            inactivity: Some(InactivityContext {
                level: InactivityLevel::Long,
                days_inactive: 20,
                last_interaction: None,
            }),
            conversation_history: history(7),
            user_message: Some("ainda tenho interesse".into()),
            ..Default::default()
        };
        let prompt = lead_system_prompt(&ctx);
        assert!(prompt.contains("- Inatividade: long (20 dias sem interação)"));
        assert!(prompt.contains("PARA LEADS INATIVOS"));
        assert!(!prompt.contains("msg 1\n"));
        assert!(prompt.contains("- Lead: msg 2"));
        assert!(prompt.contains("- Lead: msg 6"));
        assert!(prompt.contains("ÚLTIMA MENSAGEM DO LEAD:\nainda tenho interesse"));
    }

    #[test]
    fn sentiment_instruction_mentions_product() {
        let ctx = SentimentContext {
            product: Some("Mestres da UERJ".into()),
        };
        let messages = sentiment_messages("achei caro demais", &ctx);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.contains("\"lead_status\""));
        assert!(messages[0].content.ends_with("O produto/serviço em questão é Mestres da UERJ."));
        assert_eq!(messages[1], ChatMessage::user("achei caro demais"));
    }
}
