//! Progress reporting for indexing operations

use crossbeam_channel::Sender;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Statistics collected during indexing
#[derive(Debug, Default, Clone)]
pub struct IndexStats {
    /// Number of candidate files that passed filtering
    pub files_attempted: usize,

    /// Number of files loaded and embedded
    pub files_loaded: usize,

    /// Number of files skipped (oversized or unreadable)
    pub files_skipped: usize,

    /// Number of loaded files cut to the maximum size
    pub files_truncated: usize,

    /// Number of embedding requests made
    pub batches: usize,

    /// Time elapsed during indexing
    pub elapsed: Duration,

    /// Errors encountered (limited to first N errors)
    pub errors: Vec<(PathBuf, String)>,

    /// Start time of indexing
    start_time: Option<Instant>,
}

impl IndexStats {
    /// Create new stats and start timing
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Stop timing and record elapsed time
    pub fn stop_timing(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed = start.elapsed();
            self.start_time = None;
        }
    }

    /// Record a skipped file (errors limited to first 100)
    pub fn add_error(&mut self, path: PathBuf, error: String) {
        if self.errors.len() < 100 {
            self.errors.push((path, error));
        }
        self.files_skipped += 1;
    }

    /// Display the statistics in a human-readable format
    pub fn display(&self) {
        eprintln!("\nIndexing Complete:");
        eprintln!("  Files attempted: {}", self.files_attempted);
        eprintln!("  Files loaded: {}", self.files_loaded);
        eprintln!("  Files skipped: {}", self.files_skipped);
        eprintln!("  Files truncated: {}", self.files_truncated);
        eprintln!("  Embedding requests: {}", self.batches);
        eprintln!("  Time elapsed: {:.2}s", self.elapsed.as_secs_f64());

        if self.files_loaded > 0 && self.elapsed.as_secs_f64() > 0.0 {
            let files_per_sec = self.files_loaded as f64 / self.elapsed.as_secs_f64();
            eprintln!("  Performance: {files_per_sec:.0} files/second");
        }

        if !self.errors.is_empty() {
            eprintln!("\nErrors (showing first {}):", self.errors.len().min(5));
            for (path, error) in &self.errors[..5.min(self.errors.len())] {
                eprintln!("  {}: {}", path.display(), error);
            }
            if self.errors.len() > 5 {
                eprintln!("  ... and {} more errors", self.errors.len() - 5);
            }
        }
    }
}

/// Stage of an index build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    /// Reading candidate files
    Loading,
    /// Submitting embedding request `batch` of `batches` (1-based)
    Embedding { batch: usize, batches: usize },
    /// Build finished
    Complete,
}

/// Snapshot of build progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,
    pub attempted: usize,
    pub loaded: usize,
    pub skipped: usize,
    /// Candidate files after filtering
    pub total: usize,
}

impl ProgressEvent {
    /// Completion of the current phase, 0 to 100.
    pub fn percent(&self) -> u8 {
        let (done, total) = match self.phase {
            ProgressPhase::Loading => (self.attempted, self.total),
            ProgressPhase::Embedding { batch, batches } => (batch, batches),
            ProgressPhase::Complete => return 100,
        };
        if total == 0 {
            return 100;
        }
        ((done.min(total) * 100) / total) as u8
    }
}

/// Receiver of build progress events.
pub enum ProgressSink {
    Channel(Sender<ProgressEvent>),
    Callback(Box<dyn FnMut(&ProgressEvent) + Send>),
}

impl ProgressSink {
    /// Wrap a closure as a sink.
    pub fn callback(f: impl FnMut(&ProgressEvent) + Send + 'static) -> Self {
        Self::Callback(Box::new(f))
    }

    /// Deliver an event. A disconnected channel is ignored.
    pub fn emit(&mut self, event: ProgressEvent) {
        match self {
            Self::Channel(tx) => {
                let _ = tx.send(event);
            }
            Self::Callback(f) => f(&event),
        }
    }
}

impl From<Sender<ProgressEvent>> for ProgressSink {
    fn from(tx: Sender<ProgressEvent>) -> Self {
        Self::Channel(tx)
    }
}

impl std::fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Channel(_) => f.write_str("ProgressSink::Channel"),
            Self::Callback(_) => f.write_str("ProgressSink::Callback"),
        }
    }
}
