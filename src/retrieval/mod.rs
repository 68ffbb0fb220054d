//! Query-side orchestration: the engine and graph-aware fusion.

pub mod engine;
pub mod fusion;

pub use engine::{IndexState, RetrievalEngine, SearchOptions, corpus_identity};
pub use fusion::{IMPORT_WEIGHT, IMPORTER_WEIGHT, SAME_MODULE_WEIGHT, fuse, related_scores};
