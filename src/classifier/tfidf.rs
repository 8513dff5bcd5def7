use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::tokenizer::tokenize;

/// Sparse document vector keyed by feature index. Ordered so that every
/// reduction over it sums in the same order.
pub type SparseVector = BTreeMap<usize, f64>;

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Builds the vocabulary and smoothed idf weights from `documents`.
    /// Returns `None` when no document yields a single token.
    pub fn fit<'a, I>(documents: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut total = 0usize;
        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            total += 1;
            let unique: BTreeSet<String> = tokenize(doc).into_iter().collect();
            for term in unique {
                *document_frequency.entry(term).or_default() += 1;
            }
        }

        if document_frequency.is_empty() {
            return None;
        }

        let sorted: BTreeMap<String, usize> = document_frequency.into_iter().collect();
        let n = total as f64;
        let mut vocabulary = HashMap::with_capacity(sorted.len());
        let mut idf = Vec::with_capacity(sorted.len());
        for (idx, (term, df)) in sorted.into_iter().enumerate() {
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
            vocabulary.insert(term, idx);
        }

        Some(Self { vocabulary, idf })
    }

    pub fn num_features(&self) -> usize {
        self.idf.len()
    }

    /// L2-normalised tf-idf vector for `text`. Terms outside the vocabulary
    /// are dropped.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut vector = SparseVector::new();
        for token in tokenize(text) {
            if let Some(&idx) = self.vocabulary.get(&token) {
                *vector.entry(idx).or_default() += 1.0;
            }
        }
        for (idx, value) in vector.iter_mut() {
            *value *= self.idf[*idx];
        }
        let norm = vector.values().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in vector.values_mut() {
                *value /= norm;
            }
        }
        vector
    }
}
