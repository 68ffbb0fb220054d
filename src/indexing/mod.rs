//! Ingestion: selecting, loading and batching files for embedding.

pub mod batch;
pub mod filter;
pub mod loader;
pub mod progress;
pub mod walker;

pub use batch::{estimate_tokens, needs_batching, plan_batches};
pub use filter::{FileFilter, is_test_file};
pub use loader::{DocumentLoader, LoadOutcome};
pub use progress::{IndexStats, ProgressEvent, ProgressPhase, ProgressSink};
pub use walker::FileWalker;
