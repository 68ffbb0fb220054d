//! Hybrid code retrieval.
//!
//! Builds an in-memory semantic index over a set of files and answers top-k
//! queries, fusing vector similarity with proximity in a file dependency
//! graph. Embeddings come from a local TF-IDF model or a hosted API.

pub mod config;
pub mod display;
pub mod error;
pub mod graph;
pub mod indexing;
pub mod retrieval;
pub mod storage;
pub mod types;
pub mod vector;

// Explicit exports for better API clarity
pub use config::Settings;
pub use error::{IndexError, IndexResult};
pub use graph::{DependencyGraph, ImportEdge, ImportKind, Module};
pub use indexing::{IndexStats, ProgressEvent, ProgressPhase, ProgressSink};
pub use retrieval::{IndexState, RetrievalEngine, SearchOptions};
pub use storage::ContentCache;
pub use types::{Document, DocumentMetadata, SearchResult};
pub use vector::{EmbeddingGenerator, EmbeddingProvider, VectorDimension, VectorError};
