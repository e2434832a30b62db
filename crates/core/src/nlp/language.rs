//! # Language Detection
//!
//! Stop-word profile matching for a handful of European languages. The
//! language whose stop words cover the most tokens wins; ties and texts with
//! no stop words fall back to English.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::error::{require_text, NlpError};
use crate::memory::embedder::tokenize;

const PROFILES: &[(&str, &str, &[&str])] = &[
    (
        "en",
        "English",
        &[
            "the", "and", "is", "are", "to", "of", "in", "for", "what", "with", "this", "that",
            "i", "you", "my", "it", "we", "be", "on", "can", "how", "where",
        ],
    ),
    (
        "es",
        "Spanish",
        &[
            "el", "la", "los", "las", "de", "que", "y", "en", "un", "una", "es", "por", "para",
            "con", "qué", "dónde", "cómo", "mi", "quiero", "viaje",
        ],
    ),
    (
        "fr",
        "French",
        &[
            "le", "la", "les", "de", "des", "et", "est", "un", "une", "pour", "dans", "avec",
            "je", "vous", "où", "quel", "quelle", "mon", "voyage", "c'est",
        ],
    ),
    (
        "de",
        "German",
        &[
            "der", "die", "das", "und", "ist", "ein", "eine", "ich", "nicht", "mit", "für", "wie",
            "wo", "was", "nach", "reise", "auf", "zu", "den",
        ],
    ),
    (
        "it",
        "Italian",
        &[
            "il", "lo", "gli", "della", "di", "che", "e", "è", "un", "una", "per", "con", "dove",
            "come", "sono", "viaggio", "mio", "voglio",
        ],
    ),
    (
        "pt",
        "Portuguese",
        &[
            "o", "os", "as", "do", "da", "dos", "que", "e", "é", "um", "uma", "para", "com",
            "onde", "como", "não", "viagem", "meu", "quero",
        ],
    ),
];

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct LanguageGuess {
    /// ISO 639-1 code
    pub code: String,
    pub name: String,
    /// Share of tokens that are stop words of the chosen language
    pub confidence: f64,
}

/// Best-matching language of `text`
pub fn detect_language(text: &str) -> Result<LanguageGuess, NlpError> {
    let text = require_text(text)?;
    let tokens = tokenize(text);

    let mut best = (PROFILES[0].0, PROFILES[0].1, 0usize);
    for (code, name, stopwords) in PROFILES {
        let hits = tokens
            .iter()
            .filter(|t| stopwords.contains(&t.as_str()))
            .count();
        if hits > best.2 {
            best = (*code, *name, hits);
        }
    }

    let confidence = if tokens.is_empty() {
        0.0
    } else {
        best.2 as f64 / tokens.len() as f64
    };

    Ok(LanguageGuess {
        code: best.0.to_string(),
        name: best.1.to_string(),
        confidence,
    })
}
