pub mod dataset;
mod naive_bayes;
mod tfidf;
mod tokenizer;

use thiserror::Error;

use crate::domain::{ClassificationResult, Label, LabeledMessage};

pub use dataset::load_dataset;

use naive_bayes::MultinomialNb;
use tfidf::TfidfVectorizer;

const SMOOTHING_ALPHA: f64 = 1.0;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("training dataset is empty")]
    Empty,
    #[error("training dataset has no `{0}` messages")]
    MissingClass(Label),
    #[error("training dataset yields an empty vocabulary")]
    EmptyVocabulary,
}

/// Tf-idf + multinomial naive Bayes spam model. Built once, then only read.
#[derive(Debug, Clone)]
pub struct SpamClassifier {
    vectorizer: TfidfVectorizer,
    model: MultinomialNb,
}

impl SpamClassifier {
    pub fn train(dataset: &[LabeledMessage]) -> Result<Self, TrainError> {
        if dataset.is_empty() {
            return Err(TrainError::Empty);
        }
        for label in Label::ALL {
            if !dataset.iter().any(|m| m.label == label) {
                return Err(TrainError::MissingClass(label));
            }
        }

        let vectorizer = TfidfVectorizer::fit(dataset.iter().map(|m| m.text.as_str()))
            .ok_or(TrainError::EmptyVocabulary)?;
        let samples: Vec<_> = dataset.iter().map(|m| vectorizer.transform(&m.text)).collect();
        let labels: Vec<_> = dataset.iter().map(|m| m.label).collect();
        let model = MultinomialNb::fit(&samples, &labels, vectorizer.num_features(), SMOOTHING_ALPHA);

        tracing::info!(
            target: "classifier",
            messages = dataset.len(),
            spam = labels.iter().filter(|l| **l == Label::Spam).count(),
            vocabulary = vectorizer.num_features(),
            "spam model trained"
        );

        Ok(Self { vectorizer, model })
    }

    pub fn predict(&self, text: &str) -> ClassificationResult {
        let proba = self.model.predict_proba(&self.vectorizer.transform(text));
        let label = if proba[Label::Spam.index()] > proba[Label::Ham.index()] {
            Label::Spam
        } else {
            Label::Ham
        };
        ClassificationResult {
            label,
            confidence: round_percentage(proba[label.index()]),
        }
    }

    pub fn predict_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<ClassificationResult> {
        texts.iter().map(|text| self.predict(text.as_ref())).collect()
    }
}

fn round_percentage(probability: f64) -> f64 {
    (probability * 100.0 * 100.0).round() / 100.0
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::domain::{Label, LabeledMessage};

    use super::SpamClassifier;

    const SPAM: &[&str] = &[
        "WIN a FREE prize now! Claim your cash reward today",
        "Congratulations you have won a free vacation, call to claim",
        "URGENT! Your account has been selected to win a prize",
        "Free entry to win cash, text WIN to 80086",
        "You are a winner! Claim your free gift card now",
        "Verify your bank account to claim the prize money",
    ];

    const HAM: &[&str] = &[
        "Let's meet for lunch tomorrow",
        "Are we still meeting for lunch today?",
        "Can you pick up milk on your way home",
        "See you at the meeting tomorrow morning",
        "Thanks for dinner last night, it was lovely",
        "I'll call you after work, lunch was great",
        "Running late, meet me at the cafe",
    ];

    pub fn dataset() -> Vec<LabeledMessage> {
        SPAM.iter()
            .map(|t| LabeledMessage::new(Label::Spam, *t))
            .chain(HAM.iter().map(|t| LabeledMessage::new(Label::Ham, *t)))
            .collect()
    }

    pub fn classifier() -> SpamClassifier {
        SpamClassifier::train(&dataset()).expect("fixture dataset trains")
    }
}
