//! In-memory storage shared by the index and the search path.

mod content_cache;

pub use content_cache::{ContentCache, DEFAULT_CACHE_ENTRIES};
