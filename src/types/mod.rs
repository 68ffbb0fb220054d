//! Documents flowing through ingestion and the results returned by search.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Path-derived facts about a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub filename: String,
    pub extension: String,
    pub directory: String,
}

impl DocumentMetadata {
    pub fn from_path(path: &str) -> Self {
        let p = Path::new(path);
        Self {
            filename: p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            extension: p
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default(),
            directory: p
                .parent()
                .map(|d| d.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

/// A loaded file ready for embedding.
///
/// Documents are immutable once created; the vector index owns them after
/// embedding. `content` may be shorter than the file on disk when
/// `truncated` or `batch_truncated` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub path: String,
    pub content: String,
    /// Size of the file on disk in bytes
    pub size: u64,
    /// Content was cut to the configured maximum file size
    pub truncated: bool,
    /// Content was cut further to fit a remote provider's token budget
    #[serde(default)]
    pub batch_truncated: bool,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(path: impl Into<String>, content: String, size: u64, truncated: bool) -> Self {
        let path = path.into();
        let metadata = DocumentMetadata::from_path(&path);
        Self {
            path,
            content,
            size,
            truncated,
            batch_truncated: false,
            metadata,
        }
    }
}

/// A ranked file returned from a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub path: String,
    pub content: String,
    pub truncated: bool,
    pub size: u64,
    /// Cosine similarity for vector matches, accumulated graph weight for
    /// structurally related files
    pub relevance_score: f32,
}
