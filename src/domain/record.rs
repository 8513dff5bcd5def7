use thiserror::Error;

use super::types::ClassificationResult;

/// Outcome of language normalization. Every variant carries usable text;
/// a failed translation is the `Fallback` case, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalization {
    Unchanged {
        text: String,
    },
    Translated {
        text: String,
        source_language: String,
    },
    Fallback {
        text: String,
        reason: String,
    },
}

impl Normalization {
    pub fn text(&self) -> &str {
        match self {
            Normalization::Unchanged { text }
            | Normalization::Translated { text, .. }
            | Normalization::Fallback { text, .. } => text,
        }
    }

    pub fn is_translated(&self) -> bool {
        matches!(self, Normalization::Translated { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedRecord {
    pub original: String,
    pub normalization: Normalization,
    pub classification: ClassificationResult,
    pub phishing: bool,
}

impl AnnotatedRecord {
    pub fn normalized(&self) -> &str {
        self.normalization.text()
    }
}

/// A batch row that could not be turned into a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("missing value in column `{column}`")]
    MissingValue { column: String },
    #[error("value in column `{column}` is not valid UTF-8 text")]
    NotText { column: String },
}

pub type RowOutcome = Result<AnnotatedRecord, RowError>;
