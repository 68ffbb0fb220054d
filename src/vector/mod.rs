//! Vector search functionality for code retrieval.
//!
//! This module turns file contents into embeddings and answers nearest
//! neighbour queries over them.
//!
//! # Architecture
//! An [`EmbeddingProvider`] (local TF-IDF or a hosted API) produces one vector
//! per document. Vectors live in a flat [`VectorIndex`] that is scanned in full
//! on every query; similarity is `1 - cosine_distance`.

mod embedding;
mod engine;
mod remote;
mod tfidf;
mod types;

// Re-export core types for public API
#[cfg(test)]
pub use embedding::MockEmbeddingGenerator;
pub use embedding::{EmbeddingGenerator, EmbeddingProvider};
pub use engine::{VectorIndex, cosine_similarity};
pub use remote::{RemoteEmbedder, RemoteKind};
pub use tfidf::{TfIdfEmbedder, tokenize};
pub use types::{DEFAULT_LOCAL_DIMENSION, Score, VectorDimension, VectorError};
