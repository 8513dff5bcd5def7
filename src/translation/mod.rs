mod client;
mod normalizer;
mod response;

use futures::{future::BoxFuture, FutureExt};
use thiserror::Error;

pub use client::GoogleTranslator;
pub use normalizer::LanguageNormalizer;

#[cfg(test)]
pub(crate) use normalizer::fakes;

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("translation request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("translation service did not answer within {0:?}")]
    Timeout(std::time::Duration),
    #[error("unexpected translation response: {0}")]
    Malformed(String),
}

/// Source language of a text, plus its translation when that language is
/// not already the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub language: String,
    pub translation: Option<String>,
}

/// Remote language detection and translation.
pub trait Translator: Send + Sync {
    /// Returns the language code of `text`, e.g. `"en"` or `"es"`.
    fn detect<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<String, TranslationError>>;

    fn translate<'a>(
        &'a self,
        text: &'a str,
        target: &'a str,
    ) -> BoxFuture<'a, Result<String, TranslationError>>;

    /// Detects, then translates only when the detected language differs
    /// from `target`. Services that answer both in one round trip override this.
    fn detect_and_translate<'a>(
        &'a self,
        text: &'a str,
        target: &'a str,
    ) -> BoxFuture<'a, Result<Detection, TranslationError>> {
        async move {
            let language = self.detect(text).await?;
            let translation = if same_language(&language, target) {
                None
            } else {
                Some(self.translate(text, target).await?)
            };
            Ok(Detection {
                language,
                translation,
            })
        }
        .boxed()
    }
}

/// Compares language codes on their primary subtag, ignoring case.
pub(crate) fn same_language(detected: &str, target: &str) -> bool {
    let primary = |code: &str| {
        code.split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    };
    primary(detected) == primary(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes_compare_on_primary_subtag() {
        assert!(same_language("en-US", "en"));
        assert!(same_language("EN", "en"));
        assert!(same_language("zh_CN", "zh-TW"));
        assert!(!same_language("es", "en"));
    }
}
