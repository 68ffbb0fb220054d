//! Splits documents into request-sized batches for budgeted providers.
//!
//! Token counts are estimated at four characters per token. A document whose
//! estimate exceeds [`MAX_DOC_TOKENS`] is cut to 90% of that budget before
//! batching.

use tracing::debug;

use crate::types::Document;

/// Characters assumed per token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Largest estimated size of a single document in a batch.
pub const MAX_DOC_TOKENS: usize = 1500;

/// Documents per embedding request.
pub const BATCH_SIZE: usize = 5;

/// Corpora at or below this size go out in one request.
pub const BATCHING_MIN_DOCS: usize = 10;

/// Characters kept when a document exceeds [`MAX_DOC_TOKENS`]: 5400.
pub const BATCH_TRUNCATE_CHARS: usize = MAX_DOC_TOKENS * CHARS_PER_TOKEN * 9 / 10;

/// Estimated token count of `text`.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Whether a build of `doc_count` documents must be batched.
pub fn needs_batching(token_budget: Option<usize>, doc_count: usize) -> bool {
    token_budget.is_some() && doc_count > BATCHING_MIN_DOCS
}

/// Cut oversized documents and split into batches of [`BATCH_SIZE`].
pub fn plan_batches(documents: Vec<Document>) -> Vec<Vec<Document>> {
    let mut batches: Vec<Vec<Document>> = Vec::new();
    for mut doc in documents {
        if estimate_tokens(&doc.content) > MAX_DOC_TOKENS {
            if let Some((cut, _)) = doc.content.char_indices().nth(BATCH_TRUNCATE_CHARS) {
                doc.content.truncate(cut);
            }
            doc.batch_truncated = true;
            debug!(path = %doc.path, "truncated document to fit token budget");
        }

        match batches.last_mut() {
            Some(batch) if batch.len() < BATCH_SIZE => batch.push(doc),
            _ => batches.push(vec![doc]),
        }
    }
    batches
}
