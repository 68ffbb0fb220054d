//! Brute-force vector index over embedded documents.
//!
//! Every query is compared against every stored vector, so rankings are
//! exact cosine rankings.

use tracing::debug;

use crate::storage::ContentCache;
use crate::types::{Document, SearchResult};
use crate::vector::{Score, VectorDimension, VectorError};

/// Raw candidates fetched per requested result, leaving room for the
/// similarity threshold and unreadable files to drop some.
const CANDIDATE_MULTIPLIER: usize = 2;

/// In-memory index of (document, embedding) pairs.
#[derive(Debug)]
pub struct VectorIndex {
    entries: Vec<(Document, Vec<f32>)>,
    dimension: VectorDimension,
}

impl VectorIndex {
    /// Creates an empty index for vectors of `dimension`.
    #[must_use]
    pub fn new(dimension: VectorDimension) -> Self {
        Self {
            entries: Vec::new(),
            dimension,
        }
    }

    /// Builds an index from an ordered batch of embedded documents.
    pub fn build(
        dimension: VectorDimension,
        batch: Vec<(Document, Vec<f32>)>,
    ) -> Result<Self, VectorError> {
        let mut index = Self::new(dimension);
        index.append(batch)?;
        Ok(index)
    }

    /// Appends embedded documents after validating every vector.
    ///
    /// The batch is rejected as a whole if any vector has the wrong dimension.
    pub fn append(&mut self, batch: Vec<(Document, Vec<f32>)>) -> Result<(), VectorError> {
        for (_, vector) in &batch {
            self.dimension.validate_vector(vector)?;
        }
        self.entries.extend(batch);
        Ok(())
    }

    /// Returns the `limit` stored entries closest to `query`.
    ///
    /// Similarity is `1 - cosine_distance`; entries whose similarity falls
    /// outside [0, 1] (opposing vectors) are not candidates. Equal scores keep
    /// insertion order.
    pub fn nearest(&self, query: &[f32], limit: usize) -> Result<Vec<(usize, Score)>, VectorError> {
        self.dimension.validate_vector(query)?;

        let mut candidates: Vec<(usize, Score)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(i, (_, vector))| {
                let distance = 1.0 - cosine_similarity(query, vector);
                Score::from_distance(distance).ok().map(|score| (i, score))
            })
            .collect();

        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        candidates.truncate(limit);
        Ok(candidates)
    }

    /// Answers a top-k query.
    ///
    /// Fetches `top_k * 2` raw candidates, drops those under `threshold`,
    /// resolves each survivor's content (cache first, then disk) and stops
    /// once `top_k` results are collected. Files that can no longer be read
    /// are skipped.
    pub fn search(
        &self,
        query: &[f32],
        top_k: usize,
        threshold: f32,
        cache: &ContentCache,
    ) -> Result<Vec<SearchResult>, VectorError> {
        let candidates = self.nearest(query, top_k.saturating_mul(CANDIDATE_MULTIPLIER))?;
        let raw = candidates.len();

        let mut results = Vec::with_capacity(top_k.min(raw));
        for (i, score) in candidates {
            if results.len() >= top_k {
                break;
            }
            if score.get() < threshold {
                continue;
            }

            let document = &self.entries[i].0;
            let Some(content) = cache.resolve(&document.path) else {
                continue;
            };

            results.push(SearchResult {
                path: document.path.clone(),
                content,
                truncated: document.truncated,
                size: document.size,
                relevance_score: score.get(),
            });
        }

        debug!(raw, kept = results.len(), threshold, "vector search complete");
        Ok(results)
    }

    /// Looks up a stored document by path.
    #[must_use]
    pub fn document(&self, path: &str) -> Option<&Document> {
        self.entries
            .iter()
            .find(|(doc, _)| doc.path == path)
            .map(|(doc, _)| doc)
    }

    /// Gets the number of indexed documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Gets the vector dimension.
    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
