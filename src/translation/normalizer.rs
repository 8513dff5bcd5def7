use std::{sync::Arc, time::Duration};

use tokio::time::timeout;

use crate::domain::Normalization;

use super::{Detection, TranslationError, Translator};

/// Brings text into the target language before classification.
/// Best effort: any failure yields the original text as a `Fallback`.
#[derive(Clone)]
pub struct LanguageNormalizer {
    translator: Option<Arc<dyn Translator>>,
    target_language: String,
    call_timeout: Duration,
}

impl LanguageNormalizer {
    pub fn new(
        translator: Arc<dyn Translator>,
        target_language: impl Into<String>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            translator: Some(translator),
            target_language: target_language.into(),
            call_timeout,
        }
    }

    /// A normalizer that never calls out and returns every text unchanged.
    pub fn disabled() -> Self {
        Self {
            translator: None,
            target_language: String::new(),
            call_timeout: Duration::ZERO,
        }
    }

    pub async fn normalize(&self, text: &str) -> Normalization {
        let Some(translator) = self.translator.as_deref() else {
            return Normalization::Unchanged {
                text: text.to_string(),
            };
        };
        if text.trim().is_empty() {
            return Normalization::Unchanged {
                text: text.to_string(),
            };
        }

        match self.try_translate(translator, text).await {
            Ok(Detection {
                translation: None, ..
            }) => Normalization::Unchanged {
                text: text.to_string(),
            },
            Ok(Detection {
                language,
                translation: Some(translated),
            }) => {
                tracing::debug!(target: "translation", source = %language, target_language = %self.target_language, "message translated");
                Normalization::Translated {
                    text: translated,
                    source_language: language,
                }
            }
            Err(err) => {
                tracing::warn!(target: "translation", error = %err, "translation failed; keeping original text");
                Normalization::Fallback {
                    text: text.to_string(),
                    reason: err.to_string(),
                }
            }
        }
    }

    /// One bounded exchange with the service, however many requests the
    /// translator needs for it.
    async fn try_translate(
        &self,
        translator: &dyn Translator,
        text: &str,
    ) -> Result<Detection, TranslationError> {
        timeout(
            self.call_timeout,
            translator.detect_and_translate(text, &self.target_language),
        )
        .await
        .map_err(|_| TranslationError::Timeout(self.call_timeout))?
    }
}
