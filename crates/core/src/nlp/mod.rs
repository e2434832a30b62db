//! # NLP Module
//!
//! Lightweight text analysis run on every chat message: sentiment, keyword
//! intents, named entities, and language.

pub mod entities;
pub mod error;
pub mod intent;
pub mod language;
pub mod sentiment;

pub use entities::{extract_key_entities, Entity, EntityCount, EntitySummary};
pub use error::NlpError;
pub use intent::{analyze_conversation_intent, DetectedIntent, IntentAnalysis, INTENT_KEYWORDS};
pub use language::{detect_language, LanguageGuess};
pub use sentiment::{analyze_sentiment, SentimentAnalysis, SentimentCategory, SentimentThresholds};

/// Analysis helpers bound to one set of sentiment thresholds
#[derive(Debug, Clone, Default)]
pub struct NlpService {
    thresholds: SentimentThresholds,
}

impl NlpService {
    pub fn new(thresholds: SentimentThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &SentimentThresholds {
        &self.thresholds
    }

    /// Sentiment with this service's thresholds, or `overrides` when given
    pub fn analyze_sentiment(
        &self,
        text: &str,
        overrides: Option<&SentimentThresholds>,
    ) -> Result<SentimentAnalysis, NlpError> {
        analyze_sentiment(text, overrides.unwrap_or(&self.thresholds))
    }

    pub fn analyze_conversation_intent(
        &self,
        text: &str,
        use_keywords: bool,
    ) -> Result<IntentAnalysis, NlpError> {
        analyze_conversation_intent(text, use_keywords, &self.thresholds)
    }

    pub fn extract_key_entities(&self, text: &str) -> Result<EntitySummary, NlpError> {
        extract_key_entities(text)
    }

    pub fn detect_language(&self, text: &str) -> Result<LanguageGuess, NlpError> {
        detect_language(text)
    }
}
