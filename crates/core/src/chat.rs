//! # Chat
//!
//! One assistant exchange: analyse the user message, pull the most relevant
//! past turns from memory, prepend them to the prompt, ask the model, and
//! remember the new turn.
//!
//! A model failure propagates and nothing is stored.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::{ChatMessage, CompletionError, CompletionService, SamplingParams};
use crate::memory::{ConversationMemory, MemoryError};
use crate::nlp::{EntitySummary, IntentAnalysis, NlpError, NlpService, SentimentAnalysis};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Nlp(#[from] NlpError),

    #[error("Language model failed: {0}")]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

impl ChatError {
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::Nlp(e) => e.kind(),
            ChatError::Completion(e) => e.kind(),
            ChatError::Memory(e) => e.kind(),
        }
    }
}

/// Everything produced by one chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatExchange {
    pub turn_id: String,
    pub response: String,
    /// Past turns prepended to the prompt, most relevant first
    pub context: Vec<String>,
    pub sentiment: SentimentAnalysis,
    pub intent: IntentAnalysis,
    pub entities: EntitySummary,
}

/// `"{context}\nUser: {message}"`, with context documents joined by newlines
pub fn compose_prompt(context: &[String], message: &str) -> String {
    format!("{}\nUser: {}", context.join("\n"), message)
}

/// Run one exchange against `memory`
pub async fn handle_message(
    memory: &mut ConversationMemory,
    nlp: &NlpService,
    llm: &dyn CompletionService,
    message: &str,
    top_k: usize,
) -> Result<ChatExchange, ChatError> {
    let sentiment = nlp.analyze_sentiment(message, None)?;
    let intent = nlp.analyze_conversation_intent(message, true)?;
    let entities = nlp.extract_key_entities(message)?;

    let context = memory.retrieve_relevant_context(message, top_k)?;
    let prompt = compose_prompt(&context, message);

    let response = llm
        .complete(&[ChatMessage::user(prompt)], &SamplingParams::default())
        .await
        .map_err(|e| {
            tracing::warn!(model = %llm.model_name(), error = %e, "Chat completion failed");
            e
        })?;

    let turn_id = memory.add_conversation(message, &response)?;
    tracing::debug!(
        collection = %memory.collection(),
        context = context.len(),
        intents = intent.detected_intents.len(),
        "Chat exchange stored"
    );

    Ok(ChatExchange {
        turn_id,
        response,
        context,
        sentiment,
        intent,
        entities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedCompletion;
    use crate::memory::{HashingEmbedder, InMemoryVectorIndex};
    use std::sync::Arc;
    use tokio_test::assert_err;

    fn memory() -> ConversationMemory {
        ConversationMemory::new(
            "chat-test",
            Arc::new(HashingEmbedder::default()),
            Arc::new(InMemoryVectorIndex::new()),
            10,
        )
        .unwrap()
    }

    #[test]
    fn test_compose_prompt() {
        assert_eq!(compose_prompt(&[], "Hi"), "\nUser: Hi");
        let context = vec!["User: a\nAI: b".to_string(), "User: c\nAI: d".to_string()];
        assert_eq!(
            compose_prompt(&context, "Hi"),
            "User: a\nAI: b\nUser: c\nAI: d\nUser: Hi"
        );
    }

    #[tokio::test]
    async fn test_exchange_is_stored_and_reused() {
        let mut memory = memory();
        let nlp = NlpService::default();
        let llm = ScriptedCompletion::replying("Try the night markets.")
            .then_reply("Lisbon is lovely in May.");

        let first = handle_message(&mut memory, &nlp, &llm, "When should I visit Lisbon?", 3)
            .await
            .unwrap();
        assert_eq!(first.response, "Lisbon is lovely in May.");
        assert!(first.context.is_empty());
        assert_eq!(memory.len(), 1);
        assert_eq!(memory.ids(), vec![first.turn_id.clone()]);

        let second = handle_message(&mut memory, &nlp, &llm, "What's the budget for this trip?", 3)
            .await
            .unwrap();
        assert!(second.intent.has_intent("budget_inquiry"));
        assert_eq!(second.context.len(), 1);
        assert_eq!(memory.len(), 2);

        let requests = llm.requests();
        assert_eq!(
            requests[1].0[0].content,
            "User: When should I visit Lisbon?\nAI: Lisbon is lovely in May.\nUser: What's the budget for this trip?"
        );
        assert_eq!(requests[1].1, SamplingParams::default());
    }

    #[tokio::test]
    async fn test_model_failure_stores_nothing() {
        let mut memory = memory();
        let llm = ScriptedCompletion::failing();

        let err = handle_message(&mut memory, &NlpService::default(), &llm, "Hello there", 3)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Completion(_)));
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn test_empty_message_rejected_before_model() {
        let mut memory = memory();
        let llm = ScriptedCompletion::replying("unused");

        assert_err!(handle_message(&mut memory, &NlpService::default(), &llm, "   ", 3).await);
        assert!(llm.requests().is_empty());
        assert!(memory.is_empty());
    }
}
