//! # Entity Extraction
//!
//! Rule-based named-entity recognition. Recognizers run in priority order and
//! a later recognizer never claims text already claimed by an earlier one.
//!
//! Labels: `MONEY`, `PERCENT`, `TIME`, `DATE`, `CARDINAL`, `GPE` (a capitalised
//! name after a place preposition such as "in" or "to"), and `PROPN` (any other
//! capitalised name). A `PROPN` whose text was also seen as a `GPE` is
//! relabelled `GPE`.

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::error::{require_text, NlpError};

const MONTHS: &str =
    "January|February|March|April|May|June|July|August|September|October|November|December";

/// (label, pattern, capture group holding the entity)
fn patterns() -> Vec<(&'static str, String, usize)> {
    vec![
        (
            "MONEY",
            r"[$€£¥]\s?\d[\d,]*(?:\.\d+)?(?:\s?(?:k|K|million|billion)\b)?|\b\d[\d,]*(?:\.\d+)?\s?(?i:dollars?|usd|euros?|eur|pounds?|gbp|yen|bucks)\b"
                .to_string(),
            0,
        ),
        (
            "PERCENT",
            r"\b\d+(?:\.\d+)?(?:\s?%|\s?percent\b)".to_string(),
            0,
        ),
        (
            "TIME",
            r"\b\d{1,2}(?::\d{2})?\s?(?i:am|pm)\b|\b\d{1,2}:\d{2}\b|(?i:\b(?:tonight|noon|midnight)\b)"
                .to_string(),
            0,
        ),
        (
            "DATE",
            format!(
                r"(?i:\b(?:\d+|an?|one|two|three|four|five|six|seven|eight|nine|ten|few|couple of)(?:\s+|-)(?:days?|nights?|weeks?|weekends?|months?|years?)\b)|\b(?:{m})(?:\s+\d{{1,2}}(?:st|nd|rd|th)?)?(?:,?\s+\d{{4}})?\b|\b\d{{1,2}}(?:st|nd|rd|th)?\s+(?:of\s+)?(?:{m})(?:,?\s+\d{{4}})?\b|\b(?:Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday)s?\b|(?i:\b(?:today|tomorrow|yesterday|(?:next|this|last)\s+(?:week|weekend|month|year|summer|winter|spring|fall|autumn))\b)|\b\d{{4}}-\d{{2}}-\d{{2}}\b|\b(?:19|20)\d{{2}}\b",
                m = MONTHS
            ),
            0,
        ),
        (
            "CARDINAL",
            r"\b\d[\d,]*(?:\.\d+)?\b|(?i:\b(?:one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|twenty|thirty|hundred|thousand|dozen)\b)"
                .to_string(),
            0,
        ),
        (
            "GPE",
            r"\b(?i:in|to|from|at|visit|visiting|near|around|for)[ \t]+([A-Z][\p{L}'-]*(?:[ \t]+[A-Z][\p{L}'-]*)*)"
                .to_string(),
            1,
        ),
        (
            "PROPN",
            r"\b[A-Z][\p{L}'-]*(?:[ \t]+[A-Z][\p{L}'-]*)*".to_string(),
            0,
        ),
    ]
}

/// Capitalised words that start sentences or questions rather than name things
const NON_NAMES: &[&str] = &[
    "A", "After", "Also", "An", "And", "Any", "Are", "As", "At", "Before", "But", "Can", "Could",
    "Did", "Do", "Does", "Find", "For", "From", "Give", "Hello", "Hey", "Hi", "How", "I", "I'd",
    "I'll", "I'm", "I've", "If", "In", "Is", "It", "It's", "Let", "Let's", "Me", "My", "No", "Of",
    "On", "Our", "Please", "Recommend", "Should", "Show", "So", "Some", "Suggest", "Tell", "Thank",
    "Thanks", "That", "The", "There", "These", "This", "Those", "To", "We", "We're", "What",
    "What's", "When", "Where", "Which", "Who", "Why", "Will", "With", "Would", "Yes", "You",
    "Your",
];

struct Recognizer {
    label: &'static str,
    pattern: Regex,
    group: usize,
}

fn recognizers() -> &'static [Recognizer] {
    static RECOGNIZERS: OnceLock<Vec<Recognizer>> = OnceLock::new();
    RECOGNIZERS.get_or_init(|| {
        patterns()
            .into_iter()
            .filter_map(|(label, pattern, group)| match Regex::new(&pattern) {
                Ok(pattern) => Some(Recognizer {
                    label,
                    pattern,
                    group,
                }),
                Err(e) => {
                    tracing::warn!(label, error = %e, "Skipping entity recognizer");
                    None
                }
            })
            .collect()
    })
}

/// A recognised span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Entity {
    pub label: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// One entity text with its number of occurrences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EntityCount {
    pub entity: String,
    pub count: usize,
}

/// Entities grouped by label, each group in first-appearance order
pub type EntitySummary = BTreeMap<String, Vec<EntityCount>>;

/// Drop leading words that only start a sentence, plus a trailing possessive
fn trim_name(text: &str, start: usize) -> Option<(String, usize)> {
    let mut offset = 0;
    let mut rest = text;
    loop {
        let word_end = rest.find([' ', '\t']).unwrap_or(rest.len());
        let word = &rest[..word_end];
        if !NON_NAMES.contains(&word) {
            break;
        }
        let remainder = rest[word_end..].trim_start_matches([' ', '\t']);
        if remainder.is_empty() {
            return None;
        }
        offset += rest.len() - remainder.len();
        rest = remainder;
    }

    let rest = rest
        .strip_suffix("'s")
        .unwrap_or(rest)
        .trim_end_matches(['\'', '-']);
    if rest.is_empty() {
        None
    } else {
        Some((rest.to_string(), start + offset))
    }
}

fn at_sentence_start(text: &str, start: usize) -> bool {
    let before = text[..start].trim_end_matches([' ', '\t']);
    before.is_empty() || before.ends_with(['.', '!', '?', '\n', ':', '"'])
}

/// All entities in `text`, ordered by position
pub fn recognize(text: &str) -> Vec<Entity> {
    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut found: Vec<(Entity, bool)> = Vec::new();

    for recognizer in recognizers() {
        for caps in recognizer.pattern.captures_iter(text) {
            let Some(m) = caps.get(recognizer.group) else {
                continue;
            };

            let (entity_text, start) = if recognizer.group > 0 || recognizer.label == "PROPN" {
                match trim_name(m.as_str(), m.start()) {
                    Some(trimmed) => trimmed,
                    None => continue,
                }
            } else {
                (m.as_str().to_string(), m.start())
            };
            let end = start + entity_text.len();

            if claimed.iter().any(|(s, e)| start < *e && *s < end) {
                continue;
            }
            claimed.push((start, end));

            let tentative = recognizer.label == "PROPN"
                && !entity_text.contains([' ', '\t'])
                && at_sentence_start(text, start);
            found.push((
                Entity {
                    label: recognizer.label.to_string(),
                    text: entity_text,
                    start,
                    end,
                },
                tentative,
            ));
        }
    }

    // A lone capitalised word opening a sentence only counts if it is named elsewhere
    let firm: Vec<String> = found
        .iter()
        .filter(|(_, tentative)| !tentative)
        .map(|(e, _)| e.text.clone())
        .collect();
    let mut entities: Vec<Entity> = found
        .into_iter()
        .filter(|(e, tentative)| !tentative || firm.contains(&e.text))
        .map(|(e, _)| e)
        .collect();

    let places: Vec<String> = entities
        .iter()
        .filter(|e| e.label == "GPE")
        .map(|e| e.text.clone())
        .collect();
    for entity in entities.iter_mut() {
        if entity.label == "PROPN" && places.contains(&entity.text) {
            entity.label = "GPE".to_string();
        }
    }

    entities.sort_by_key(|e| e.start);
    entities
}

/// Group entities by label and count repeated `(label, text)` pairs
pub fn extract_key_entities(text: &str) -> Result<EntitySummary, NlpError> {
    require_text(text)?;

    let mut summary = EntitySummary::new();
    for entity in recognize(text) {
        let group = summary.entry(entity.label).or_default();
        match group.iter_mut().find(|c| c.entity == entity.text) {
            Some(existing) => existing.count += 1,
            None => group.push(EntityCount {
                entity: entity.text,
                count: 1,
            }),
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(summary: &EntitySummary, label: &str) -> Vec<(String, usize)> {
        summary
            .get(label)
            .map(|group| group.iter().map(|c| (c.entity.clone(), c.count)).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_all_patterns_compile() {
        assert_eq!(recognizers().len(), patterns().len());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(extract_key_entities(""), Err(NlpError::EmptyInput));
        assert_eq!(extract_key_entities("   "), Err(NlpError::EmptyInput));
    }

    #[test]
    fn test_trip_message() {
        let summary = extract_key_entities(
            "I have $2000 for a 5 day trip to Paris in June with 2 friends. Paris is lovely.",
        )
        .unwrap();

        assert_eq!(texts(&summary, "MONEY"), vec![("$2000".to_string(), 1)]);
        assert_eq!(
            texts(&summary, "DATE"),
            vec![("5 day".to_string(), 1), ("June".to_string(), 1)]
        );
        assert_eq!(texts(&summary, "CARDINAL"), vec![("2".to_string(), 1)]);
        assert_eq!(texts(&summary, "GPE"), vec![("Paris".to_string(), 2)]);
        assert!(!summary.contains_key("PROPN"));
    }

    #[test]
    fn test_multi_word_place_and_possessive() {
        let summary =
            extract_key_entities("Flights from New York to Rome's airport cost 650 dollars").unwrap();
        assert_eq!(
            texts(&summary, "GPE"),
            vec![("New York".to_string(), 1), ("Rome".to_string(), 1)]
        );
        assert_eq!(texts(&summary, "MONEY"), vec![("650 dollars".to_string(), 1)]);
    }

    #[test]
    fn test_question_words_are_not_names() {
        let summary = extract_key_entities("What should I see near the Eiffel Tower?").unwrap();
        assert_eq!(texts(&summary, "PROPN"), vec![("Eiffel Tower".to_string(), 1)]);
        assert!(!summary.contains_key("GPE"));
    }

    #[test]
    fn test_time_percent_and_dates() {
        let summary =
            extract_key_entities("Check-in is at 3pm next week, with 15% off on Mondays").unwrap();
        assert_eq!(texts(&summary, "TIME"), vec![("3pm".to_string(), 1)]);
        assert_eq!(texts(&summary, "PERCENT"), vec![("15%".to_string(), 1)]);
        assert_eq!(
            texts(&summary, "DATE"),
            vec![("next week".to_string(), 1), ("Mondays".to_string(), 1)]
        );
    }

    #[test]
    fn test_sentence_opening_words_are_ignored() {
        let summary = extract_key_entities("Flights are cheap. Museums open late.").unwrap();
        assert!(summary.is_empty());
    }

    #[test]
    fn test_plain_sentence_has_no_entities() {
        let summary = extract_key_entities("what is the weather like there").unwrap();
        assert!(summary.is_empty());
    }

    #[test]
    fn test_recognize_is_ordered_and_disjoint() {
        let entities = recognize("Visit Kyoto in April for 3 weeks");
        let labels: Vec<&str> = entities.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["GPE", "DATE", "DATE"]);
        assert!(entities.windows(2).all(|w| w[0].end <= w[1].start));
    }
}
