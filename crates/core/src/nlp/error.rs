use thiserror::Error;

/// Errors from the text-analysis helpers
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NlpError {
    #[error("Input text is empty or invalid.")]
    EmptyInput,
}

impl NlpError {
    pub fn kind(&self) -> &'static str {
        match self {
            NlpError::EmptyInput => "empty_input",
        }
    }
}

/// Reject empty or whitespace-only text
pub(crate) fn require_text(text: &str) -> Result<&str, NlpError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(NlpError::EmptyInput)
    } else {
        Ok(trimmed)
    }
}
