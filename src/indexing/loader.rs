//! Reads candidate files into [`Document`]s.

use std::path::PathBuf;

use tracing::debug;

use crate::error::{IndexError, IndexResult};
use crate::storage::ContentCache;
use crate::types::Document;

/// Outcome of loading one candidate.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(Document),
    /// Larger on disk than twice the character limit
    TooLarge { size: u64 },
}

#[derive(Debug, Clone, Copy)]
pub struct DocumentLoader {
    max_file_size: usize,
}

impl DocumentLoader {
    pub fn new(max_file_size: usize) -> Self {
        Self { max_file_size }
    }

    /// Load `path`, caching its full content.
    ///
    /// Files over `2 * max_file_size` bytes are not read. Content longer than
    /// `max_file_size` characters is cut to exactly that many characters and
    /// the document is marked truncated; the cache still receives the whole
    /// file.
    pub fn load(&self, path: &str, cache: &ContentCache) -> IndexResult<LoadOutcome> {
        let file_read = |source| IndexError::FileRead {
            path: PathBuf::from(path),
            source,
        };

        let size = std::fs::metadata(path).map_err(file_read)?.len();
        let limit = self.max_file_size as u64;
        if size > limit.saturating_mul(2) {
            debug!(path, size, "skipping oversized file");
            return Ok(LoadOutcome::TooLarge { size });
        }

        let content = std::fs::read_to_string(path).map_err(file_read)?;
        cache.put(path, content.clone());

        let (content, truncated) = match content.char_indices().nth(self.max_file_size) {
            Some((cut, _)) => (content[..cut].to_string(), true),
            None => (content, false),
        };
        if truncated {
            debug!(path, max = self.max_file_size, "truncated file content");
        }

        Ok(LoadOutcome::Loaded(Document::new(path, content, size, truncated)))
    }
}
