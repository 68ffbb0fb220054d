//! Bounded cache of file contents keyed by path.
//!
//! Eviction is first-in-first-out: once the cache is full, inserting a new
//! path drops the oldest inserted one. Reads do not refresh an entry and
//! re-inserting a present path only replaces its value, keeping its place in
//! the eviction queue.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use tracing::trace;

/// Default capacity, in entries.
pub const DEFAULT_CACHE_ENTRIES: usize = 100;

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, String>,
    order: VecDeque<String>,
}

/// Thread-safe FIFO content cache.
#[derive(Debug)]
pub struct ContentCache {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl ContentCache {
    /// Create a cache holding at most `capacity` entries.
    ///
    /// A capacity of zero yields a cache that never stores anything.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity,
        }
    }

    /// Get the cached content for `path`.
    pub fn get(&self, path: &str) -> Option<String> {
        self.inner.lock().entries.get(path).cloned()
    }

    /// Store `content` for `path`, evicting the oldest entry when full.
    pub fn put(&self, path: &str, content: String) {
        if self.capacity == 0 {
            return;
        }

        let mut inner = self.inner.lock();
        if let Some(existing) = inner.entries.get_mut(path) {
            *existing = content;
            return;
        }

        while inner.order.len() >= self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            trace!(path = %oldest, "evicted from content cache");
        }

        inner.order.push_back(path.to_string());
        inner.entries.insert(path.to_string(), content);
    }

    /// Content for `path`, from the cache or else from disk.
    ///
    /// Disk reads do not populate the cache. Returns `None` when the file can
    /// no longer be read.
    pub fn resolve(&self, path: &str) -> Option<String> {
        if let Some(content) = self.get(path) {
            return Some(content);
        }
        match std::fs::read_to_string(path) {
            Ok(content) => Some(content),
            Err(e) => {
                trace!(path, error = %e, "content unavailable");
                None
            }
        }
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.inner.lock().entries.contains_key(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_ENTRIES)
    }
}
