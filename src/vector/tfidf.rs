//! Local TF-IDF embedding model.
//!
//! Produces fixed-dimension vectors without any network dependency. The
//! vocabulary is learned once from the first corpus handed to
//! [`TfIdfEmbedder::embed_documents`] and is then frozen for the lifetime of
//! the instance: later documents with unseen terms contribute zero weight
//! for those terms instead of growing the vocabulary.

use std::collections::HashMap;

use tracing::debug;

use crate::vector::{EmbeddingGenerator, VectorDimension, VectorError};

/// Tokens this short or shorter carry too little signal to index.
const MIN_TOKEN_LEN: usize = 3;

/// Frozen term statistics learned from the first corpus.
#[derive(Debug, Default, Clone)]
struct Vocabulary {
    /// term -> position in the output vector
    index: HashMap<String, usize>,
    /// idf for every term seen while building, not only the indexed ones
    idf: HashMap<String, f32>,
}

/// TF-IDF embedder over a bounded vocabulary.
#[derive(Debug, Clone)]
pub struct TfIdfEmbedder {
    dimension: VectorDimension,
    vocabulary: Vocabulary,
}

impl TfIdfEmbedder {
    /// Create an embedder producing vectors of `dimension` entries.
    pub fn new(dimension: VectorDimension) -> Self {
        Self {
            dimension,
            vocabulary: Vocabulary::default(),
        }
    }

    /// Whether the vocabulary has been learned.
    #[must_use]
    pub fn is_built(&self) -> bool {
        !self.vocabulary.index.is_empty()
    }

    /// Number of terms mapped to vector positions.
    #[must_use]
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.index.len()
    }

    /// Vector position assigned to `term`, if it made the vocabulary.
    #[must_use]
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.index.get(term).copied()
    }

    /// Inverse document frequency recorded for `term` while building.
    #[must_use]
    pub fn idf(&self, term: &str) -> Option<f32> {
        self.vocabulary.idf.get(term).copied()
    }

    /// Learn document frequencies and keep the top terms.
    ///
    /// Terms are ranked by document frequency, descending; equal frequencies
    /// keep the order in which the terms were first seen.
    fn build_vocabulary(&mut self, texts: &[&str]) {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut first_seen: Vec<String> = Vec::new();

        for text in texts {
            let mut unique: Vec<String> = tokenize(text);
            let mut seen_in_doc = std::collections::HashSet::new();
            unique.retain(|t| seen_in_doc.insert(t.clone()));

            for term in unique {
                match doc_freq.get_mut(&term) {
                    Some(count) => *count += 1,
                    None => {
                        doc_freq.insert(term.clone(), 1);
                        first_seen.push(term);
                    }
                }
            }
        }

        let total_docs = texts.len() as f32;
        let idf: HashMap<String, f32> = doc_freq
            .iter()
            .map(|(term, df)| (term.clone(), (total_docs / *df as f32).ln()))
            .collect();

        // Stable sort keeps first-seen order among equal frequencies
        let mut ranked = first_seen;
        ranked.sort_by(|a, b| doc_freq[b].cmp(&doc_freq[a]));
        ranked.truncate(self.dimension.get());

        let index = ranked
            .into_iter()
            .enumerate()
            .map(|(i, term)| (term, i))
            .collect();

        self.vocabulary = Vocabulary { index, idf };
        debug!(
            terms = self.vocabulary.index.len(),
            documents = texts.len(),
            "built TF-IDF vocabulary"
        );
    }

    /// Encode a single text against the frozen vocabulary.
    fn encode(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension.get()];

        let tokens = tokenize(text);
        if tokens.is_empty() {
            return vector;
        }

        let total = tokens.len() as f32;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for token in &tokens {
            *counts.entry(token.as_str()).or_default() += 1;
        }

        for (term, count) in counts {
            let (Some(&index), Some(&idf)) = (
                self.vocabulary.index.get(term),
                self.vocabulary.idf.get(term),
            ) else {
                continue;
            };
            vector[index] = (count as f32 / total) * idf;
        }

        normalize(&mut vector);
        vector
    }
}

impl EmbeddingGenerator for TfIdfEmbedder {
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        if !self.is_built() {
            self.build_vocabulary(texts);
        }
        Ok(texts.iter().map(|text| self.encode(text)).collect())
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        Ok(self.encode(text))
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn name(&self) -> &str {
        "local-tfidf"
    }
}

/// Lower-case, keep only word characters and whitespace, split, drop short tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    cleaned
        .split_whitespace()
        .filter(|token| token.len() >= MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}

/// L2-normalize in place; zero vectors are left untouched.
fn normalize(vector: &mut [f32]) {
    let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for value in vector.iter_mut() {
            *value /= magnitude;
        }
    }
}
