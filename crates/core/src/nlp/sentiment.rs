//! # Sentiment
//!
//! Lexicon-based polarity and subjectivity scoring.
//!
//! Every lexicon word found in the text is scored. A preceding intensifier
//! ("very", "really", ...) multiplies its scores, and a negation within the
//! previous three tokens multiplies its polarity by -0.5. The text's polarity
//! and subjectivity are the means over all scored words; text with no scored
//! words is neutral (0.0, 0.0).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::error::{require_text, NlpError};
use crate::memory::embedder::tokenize;

/// Category cut-offs, compared against polarity from the top down
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct SentimentThresholds {
    pub very_positive: f64,
    pub positive: f64,
    pub negative: f64,
}

impl Default for SentimentThresholds {
    fn default() -> Self {
        Self {
            very_positive: 0.5,
            positive: 0.0,
            negative: -0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum SentimentCategory {
    #[serde(rename = "Very Positive")]
    VeryPositive,
    Positive,
    Neutral,
    Negative,
    #[serde(rename = "Very Negative")]
    VeryNegative,
}

impl SentimentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentCategory::VeryPositive => "Very Positive",
            SentimentCategory::Positive => "Positive",
            SentimentCategory::Neutral => "Neutral",
            SentimentCategory::Negative => "Negative",
            SentimentCategory::VeryNegative => "Very Negative",
        }
    }

    /// Display colour hint for renderers
    pub fn color(&self) -> &'static str {
        match self {
            SentimentCategory::VeryPositive => "#2ecc71",
            SentimentCategory::Positive => "#27ae60",
            SentimentCategory::Neutral => "#f39c12",
            SentimentCategory::Negative => "#e74c3c",
            SentimentCategory::VeryNegative => "#c0392b",
        }
    }

    /// Bucket a polarity score
    pub fn from_polarity(polarity: f64, thresholds: &SentimentThresholds) -> Self {
        if polarity > thresholds.very_positive {
            SentimentCategory::VeryPositive
        } else if polarity > thresholds.positive {
            SentimentCategory::Positive
        } else if polarity == 0.0 {
            SentimentCategory::Neutral
        } else if polarity > thresholds.negative {
            SentimentCategory::Negative
        } else {
            SentimentCategory::VeryNegative
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SentimentAnalysis {
    /// In [-1, 1]
    pub polarity: f64,
    /// In [0, 1]
    pub subjectivity: f64,
    pub sentiment_category: SentimentCategory,
}

/// (word, polarity, subjectivity)
const LEXICON: &[(&str, f64, f64)] = &[
    ("amazing", 0.6, 0.9),
    ("awesome", 1.0, 1.0),
    ("awful", -1.0, 1.0),
    ("bad", -0.7, 0.667),
    ("beautiful", 0.85, 1.0),
    ("best", 1.0, 0.3),
    ("better", 0.5, 0.5),
    ("boring", -1.0, 1.0),
    ("breathtaking", 0.8, 0.9),
    ("calm", 0.3, 0.75),
    ("charming", 0.5, 0.7),
    ("cheap", 0.4, 0.7),
    ("clean", 0.367, 0.683),
    ("comfortable", 0.4, 0.8),
    ("cozy", 0.5, 0.8),
    ("crowded", -0.4, 0.6),
    ("dangerous", -0.6, 0.9),
    ("delicious", 1.0, 1.0),
    ("delightful", 0.8, 0.9),
    ("dirty", -0.6, 0.8),
    ("disappointed", -0.75, 0.75),
    ("disappointing", -0.6, 0.7),
    ("easy", 0.433, 0.833),
    ("enjoy", 0.4, 0.5),
    ("enjoyed", 0.4, 0.5),
    ("excellent", 1.0, 1.0),
    ("excited", 0.375, 0.75),
    ("exciting", 0.3, 0.8),
    ("expensive", -0.5, 0.7),
    ("fantastic", 0.4, 0.9),
    ("fine", 0.417, 0.5),
    ("friendly", 0.375, 0.5),
    ("fun", 0.3, 0.2),
    ("good", 0.7, 0.6),
    ("gorgeous", 0.7, 1.0),
    ("great", 0.8, 0.75),
    ("happy", 0.8, 1.0),
    ("hate", -0.8, 0.9),
    ("horrible", -1.0, 1.0),
    ("incredible", 0.9, 0.9),
    ("interesting", 0.5, 0.5),
    ("like", 0.1, 0.2),
    ("lost", -0.2, 0.4),
    ("love", 0.5, 0.6),
    ("lovely", 0.5, 0.75),
    ("nice", 0.6, 1.0),
    ("noisy", -0.3, 0.6),
    ("perfect", 1.0, 1.0),
    ("pleasant", 0.733, 0.967),
    ("poor", -0.4, 0.6),
    ("relaxing", 0.5, 0.7),
    ("rude", -0.3, 0.6),
    ("sad", -0.5, 1.0),
    ("safe", 0.5, 0.5),
    ("scary", -0.5, 1.0),
    ("slow", -0.3, 0.4),
    ("stressful", -0.5, 0.8),
    ("stunning", 0.5, 1.0),
    ("terrible", -1.0, 1.0),
    ("tired", -0.4, 0.7),
    ("ugly", -0.7, 1.0),
    ("unfortunately", -0.5, 1.0),
    ("unhappy", -0.6, 0.9),
    ("unsafe", -0.5, 0.5),
    ("wonderful", 1.0, 1.0),
    ("worse", -0.4, 0.6),
    ("worst", -1.0, 1.0),
    ("wrong", -0.5, 0.9),
];

/// (word, multiplier)
const INTENSIFIERS: &[(&str, f64)] = &[
    ("absolutely", 1.4),
    ("extremely", 1.5),
    ("incredibly", 1.4),
    ("quite", 1.1),
    ("really", 1.3),
    ("so", 1.3),
    ("super", 1.3),
    ("too", 1.2),
    ("totally", 1.3),
    ("very", 1.3),
];

const NEGATIONS: &[&str] = &["not", "no", "never", "nothing", "nowhere", "neither", "nor", "without"];

const NEGATION_WINDOW: usize = 3;

fn lookup(word: &str) -> Option<(f64, f64)> {
    LEXICON
        .binary_search_by(|(w, _, _)| w.cmp(&word))
        .ok()
        .map(|i| (LEXICON[i].1, LEXICON[i].2))
}

fn intensity(word: &str) -> Option<f64> {
    INTENSIFIERS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, m)| *m)
}

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word) || word.ends_with("n't")
}

/// Raw (polarity, subjectivity) of a text without validation
pub fn score(text: &str) -> (f64, f64) {
    let mut assessments: Vec<(f64, f64)> = Vec::new();
    let mut multiplier: Option<f64> = None;
    let mut negation_age: Option<usize> = None;

    for token in tokenize(text) {
        if is_negation(&token) {
            negation_age = Some(0);
            continue;
        }
        if let Some(m) = intensity(&token) {
            multiplier = Some(multiplier.unwrap_or(1.0) * m);
            continue;
        }

        if let Some((polarity, subjectivity)) = lookup(&token) {
            let m = multiplier.unwrap_or(1.0);
            let mut p = polarity * m;
            let s = (subjectivity * m).min(1.0);
            if negation_age.is_some() {
                p *= -0.5;
            }
            assessments.push((p.clamp(-1.0, 1.0), s));
            negation_age = None;
        } else if let Some(age) = negation_age {
            negation_age = if age + 1 >= NEGATION_WINDOW {
                None
            } else {
                Some(age + 1)
            };
        }
        multiplier = None;
    }

    if assessments.is_empty() {
        return (0.0, 0.0);
    }

    let n = assessments.len() as f64;
    let polarity = assessments.iter().map(|(p, _)| p).sum::<f64>() / n;
    let subjectivity = assessments.iter().map(|(_, s)| s).sum::<f64>() / n;
    (polarity, subjectivity)
}

/// Polarity, subjectivity, and bucketed category of `text`
pub fn analyze_sentiment(
    text: &str,
    thresholds: &SentimentThresholds,
) -> Result<SentimentAnalysis, NlpError> {
    let text = require_text(text)?;
    let (polarity, subjectivity) = score(text);

    Ok(SentimentAnalysis {
        polarity,
        subjectivity,
        sentiment_category: SentimentCategory::from_polarity(polarity, thresholds),
    })
}
