pub mod table;

use std::sync::Arc;

use futures::{stream, StreamExt};

use crate::{
    classifier::SpamClassifier,
    domain::{AnnotatedRecord, Normalization, RowError, RowOutcome},
    phishing::has_phishing_url,
    translation::LanguageNormalizer,
};

pub use table::{BatchSummary, MessageTable};

/// Normalizes, classifies and phishing-checks messages.
pub struct AnnotationPipeline {
    normalizer: LanguageNormalizer,
    classifier: Arc<SpamClassifier>,
    concurrency: usize,
}

impl AnnotationPipeline {
    pub fn new(
        normalizer: LanguageNormalizer,
        classifier: Arc<SpamClassifier>,
        concurrency: usize,
    ) -> Self {
        Self {
            normalizer,
            classifier,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn annotate(&self, text: &str) -> AnnotatedRecord {
        let normalization = self.normalizer.normalize(text).await;
        let classification = self.classifier.predict(normalization.text());
        // links are inspected on the original text, translation may rewrite them
        let phishing = has_phishing_url(text);
        AnnotatedRecord {
            original: text.to_string(),
            normalization,
            classification,
            phishing,
        }
    }

    /// One outcome per input row, in input order. Rows that arrive as errors
    /// stay errors; they never abort the rest of the batch.
    pub async fn annotate_batch(&self, rows: Vec<Result<String, RowError>>) -> Vec<RowOutcome> {
        let normalized: Vec<Result<(String, Normalization), RowError>> = stream::iter(rows)
            .map(|row| async move {
                match row {
                    Ok(text) => {
                        let normalization = self.normalizer.normalize(&text).await;
                        Ok((text, normalization))
                    }
                    Err(err) => Err(err),
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let texts: Vec<&str> = normalized
            .iter()
            .filter_map(|row| row.as_ref().ok().map(|(_, n)| n.text()))
            .collect();
        let mut classifications = self.classifier.predict_batch(&texts[..]).into_iter();

        let outcomes: Vec<RowOutcome> = normalized
            .into_iter()
            .map(|row| {
                let (original, normalization) = row?;
                let classification = classifications
                    .next()
                    .expect("one classification per normalized row");
                let phishing = has_phishing_url(&original);
                Ok(AnnotatedRecord {
                    original,
                    normalization,
                    classification,
                    phishing,
                })
            })
            .collect();

        tracing::debug!(
            target: "pipeline",
            rows = outcomes.len(),
            errors = outcomes.iter().filter(|o| o.is_err()).count(),
            "batch annotated"
        );
        outcomes
    }
}
