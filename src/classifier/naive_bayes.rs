use crate::domain::Label;

use super::tfidf::SparseVector;

const NUM_CLASSES: usize = 2;

/// Multinomial naive Bayes over tf-idf features with additive smoothing.
#[derive(Debug, Clone)]
pub struct MultinomialNb {
    class_log_prior: [f64; NUM_CLASSES],
    feature_log_prob: [Vec<f64>; NUM_CLASSES],
}

impl MultinomialNb {
    /// Fits the model. Callers guarantee both classes are present and that
    /// `samples` and `labels` have the same length.
    pub fn fit(samples: &[SparseVector], labels: &[Label], num_features: usize, alpha: f64) -> Self {
        let mut class_count = [0usize; NUM_CLASSES];
        let mut feature_count = [vec![0.0; num_features], vec![0.0; num_features]];

        for (sample, label) in samples.iter().zip(labels) {
            let class = label.index();
            class_count[class] += 1;
            for (&idx, &value) in sample {
                feature_count[class][idx] += value;
            }
        }

        let total = class_count.iter().sum::<usize>() as f64;
        let class_log_prior = class_count.map(|count| (count as f64 / total).ln());
        let feature_log_prob = feature_count.map(|counts| {
            let denominator = (counts.iter().sum::<f64>() + alpha * num_features as f64).ln();
            counts
                .into_iter()
                .map(|count| (count + alpha).ln() - denominator)
                .collect::<Vec<f64>>()
        });

        Self {
            class_log_prior,
            feature_log_prob,
        }
    }

    /// Posterior probability of each class, indexed by `Label::index`.
    pub fn predict_proba(&self, sample: &SparseVector) -> [f64; NUM_CLASSES] {
        let mut joint = self.class_log_prior;
        for (class, log_prob) in joint.iter_mut().enumerate() {
            for (&idx, &value) in sample {
                *log_prob += value * self.feature_log_prob[class][idx];
            }
        }

        let max = joint.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let log_norm = max + joint.iter().map(|jll| (jll - max).exp()).sum::<f64>().ln();
        joint.map(|jll| (jll - log_norm).exp())
    }
}
