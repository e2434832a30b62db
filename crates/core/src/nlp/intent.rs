//! # Intent Detection
//!
//! Keyword intents over lowercased text. Matching is by substring, so
//! "planning" hits the `plan` keyword and "helpful" hits `help`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::error::{require_text, NlpError};
use super::sentiment::{analyze_sentiment, SentimentAnalysis, SentimentThresholds};

/// Fixed intent vocabulary, in reporting order
pub const INTENT_KEYWORDS: &[(&str, &[&str])] = &[
    ("travel_planning", &["trip", "vacation", "travel", "destination", "plan"]),
    ("budget_inquiry", &["cost", "price", "budget", "expense", "money"]),
    ("recommendation", &["suggest", "recommend", "advice", "help"]),
    ("complaint", &["problem", "issue", "bad", "terrible", "wrong"]),
    ("praise", &["great", "awesome", "amazing", "wonderful", "excellent"]),
];

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct DetectedIntent {
    pub intent: String,
    pub keywords_matched: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct IntentAnalysis {
    pub detected_intents: Vec<DetectedIntent>,
    pub sentiment: SentimentAnalysis,
}

impl IntentAnalysis {
    pub fn has_intent(&self, intent: &str) -> bool {
        self.detected_intents.iter().any(|d| d.intent == intent)
    }
}

/// Keyword intents plus sentiment of `text`.
///
/// With `use_keywords` off only the sentiment is computed.
pub fn analyze_conversation_intent(
    text: &str,
    use_keywords: bool,
    thresholds: &SentimentThresholds,
) -> Result<IntentAnalysis, NlpError> {
    let text = require_text(text)?;

    let mut detected_intents = Vec::new();
    if use_keywords {
        let lowered = text.to_lowercase();
        for (intent, keywords) in INTENT_KEYWORDS {
            let keywords_matched: Vec<String> = keywords
                .iter()
                .filter(|kw| lowered.contains(*kw))
                .map(|kw| kw.to_string())
                .collect();
            if !keywords_matched.is_empty() {
                detected_intents.push(DetectedIntent {
                    intent: intent.to_string(),
                    keywords_matched,
                });
            }
        }
    }

    Ok(IntentAnalysis {
        detected_intents,
        sentiment: analyze_sentiment(text, thresholds)?,
    })
}
