//! The retrieval engine: index lifecycle, ingestion and search.

use std::path::PathBuf;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{IndexError, IndexResult};
use crate::graph::DependencyGraph;
use crate::indexing::{
    DocumentLoader, FileFilter, IndexStats, LoadOutcome, ProgressEvent, ProgressPhase,
    ProgressSink, needs_batching, plan_batches,
};
use crate::retrieval::fusion;
use crate::storage::ContentCache;
use crate::types::{Document, SearchResult};
use crate::vector::{EmbeddingGenerator, EmbeddingProvider, VectorError, VectorIndex};

/// Lifecycle of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Uninitialized,
    Initializing,
    Ready,
}

/// Per-query overrides; unset fields use the configured values.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    pub top_k: Option<usize>,
    pub similarity_threshold: Option<f32>,
}

impl SearchOptions {
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = Some(threshold);
        self
    }
}

/// Hybrid code retrieval over one corpus at a time.
///
/// Build with [`initialize`](Self::initialize), query with
/// [`search_files`](Self::search_files), reset with [`clear`](Self::clear).
pub struct RetrievalEngine {
    settings: Settings,
    provider: Box<dyn EmbeddingGenerator>,
    cache: ContentCache,
    index: Option<VectorIndex>,
    graph: Option<DependencyGraph>,
    state: IndexState,
    corpus_id: Option<String>,
    last_stats: Option<IndexStats>,
}

impl std::fmt::Debug for RetrievalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalEngine")
            .field("provider", &self.provider.name())
            .field("state", &self.state)
            .field("documents", &self.document_count())
            .field("corpus_id", &self.corpus_id)
            .finish()
    }
}

impl RetrievalEngine {
    /// Create an engine with the provider named in `settings.embedding`.
    ///
    /// # Errors
    /// Invalid settings, an unknown provider or a missing API key.
    pub fn new(settings: Settings) -> IndexResult<Self> {
        settings.validate()?;
        let provider = EmbeddingProvider::from_config(&settings.embedding)?;
        Self::with_provider(settings, provider)
    }

    /// Create an engine around an already constructed embedding generator.
    pub fn with_provider(
        settings: Settings,
        provider: impl EmbeddingGenerator + 'static,
    ) -> IndexResult<Self> {
        settings.validate()?;
        let cache = ContentCache::new(settings.cache.max_entries);
        Ok(Self {
            settings,
            provider: Box::new(provider),
            cache,
            index: None,
            graph: None,
            state: IndexState::Uninitialized,
            corpus_id: None,
            last_stats: None,
        })
    }

    /// Build the index over `paths`.
    ///
    /// Calling this again for the same set of paths once the index is ready
    /// returns the stats of the existing build. A different set of paths
    /// requires [`clear`](Self::clear) first. Any embedding failure rolls the
    /// engine back to [`IndexState::Uninitialized`].
    pub fn initialize(
        &mut self,
        paths: &[String],
        graph: Option<DependencyGraph>,
        mut progress: Option<ProgressSink>,
    ) -> IndexResult<IndexStats> {
        let corpus_id = corpus_identity(paths);

        if self.state == IndexState::Ready {
            return match (&self.corpus_id, &self.last_stats) {
                (Some(current), Some(stats)) if *current == corpus_id => {
                    debug!(corpus = %corpus_id, "index already built for this corpus");
                    Ok(stats.clone())
                }
                (current, _) => Err(IndexError::CorpusMismatch {
                    current: current.clone().unwrap_or_default(),
                    requested: corpus_id,
                }),
            };
        }

        self.state = IndexState::Initializing;
        info!(
            candidates = paths.len(),
            provider = self.provider.name(),
            "building index"
        );

        match self.build(paths, &mut progress) {
            Ok((index, stats)) => {
                self.index = Some(index);
                self.graph = graph;
                self.corpus_id = Some(corpus_id);
                self.last_stats = Some(stats.clone());
                self.state = IndexState::Ready;
                Ok(stats)
            }
            Err(e) => {
                warn!(error = %e, "index build failed, rolling back");
                self.clear();
                Err(e)
            }
        }
    }

    fn build(
        &mut self,
        paths: &[String],
        progress: &mut Option<ProgressSink>,
    ) -> IndexResult<(VectorIndex, IndexStats)> {
        let mut stats = IndexStats::new();
        let filter = FileFilter::from_config(&self.settings.indexing);
        let candidates = filter.apply(paths);
        let total = candidates.len();
        debug!(total, filtered_out = paths.len() - total, "selected candidate files");

        let loader = DocumentLoader::new(self.settings.indexing.max_file_size);
        let mut documents: Vec<Document> = Vec::with_capacity(total);

        for path in candidates {
            stats.files_attempted += 1;
            match loader.load(path, &self.cache) {
                Ok(LoadOutcome::Loaded(doc)) => {
                    if doc.truncated {
                        stats.files_truncated += 1;
                    }
                    stats.files_loaded += 1;
                    documents.push(doc);
                }
                Ok(LoadOutcome::TooLarge { size }) => {
                    warn!(path, size, "skipping file over twice the size limit");
                    stats.add_error(PathBuf::from(path), format!("file too large ({size} bytes)"));
                }
                Err(e) => {
                    warn!(path, error = %e, "skipping unreadable file");
                    stats.add_error(PathBuf::from(path), e.to_string());
                }
            }
            emit(progress, ProgressPhase::Loading, &stats, total);
        }

        let dimension = self.provider.dimension();
        let mut index = VectorIndex::new(dimension);

        if documents.is_empty() {
            warn!(attempted = stats.files_attempted, "no documents loaded, index is empty");
        } else if needs_batching(self.provider.token_budget(), documents.len()) {
            let batches = plan_batches(documents);
            let count = batches.len();
            info!(batches = count, "embedding in token-bounded batches");

            for (i, batch) in batches.into_iter().enumerate() {
                let number = i + 1;
                stats.files_truncated += batch
                    .iter()
                    .filter(|d| d.batch_truncated && !d.truncated)
                    .count();
                emit(
                    progress,
                    ProgressPhase::Embedding {
                        batch: number,
                        batches: count,
                    },
                    &stats,
                    total,
                );
                debug!(batch = number, of = count, size = batch.len(), "submitting batch");

                let embedded = embed(self.provider.as_mut(), batch).and_then(|pairs| {
                    index.append(pairs)
                });
                embedded.map_err(|source| IndexError::BatchEmbedding {
                    batch: number,
                    total: count,
                    source,
                })?;
                stats.batches += 1;
            }
        } else {
            emit(
                progress,
                ProgressPhase::Embedding {
                    batch: 1,
                    batches: 1,
                },
                &stats,
                total,
            );
            let pairs = embed(self.provider.as_mut(), documents)?;
            index.append(pairs)?;
            stats.batches = 1;
        }

        stats.stop_timing();
        emit(progress, ProgressPhase::Complete, &stats, total);
        info!(
            loaded = stats.files_loaded,
            skipped = stats.files_skipped,
            requests = stats.batches,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "index ready"
        );
        Ok((index, stats))
    }

    /// Find the files most relevant to `query`.
    ///
    /// Vector matches are expanded with their dependency-graph neighbours when
    /// a graph was supplied at build time, so up to `2 * top_k` results may
    /// come back.
    ///
    /// # Errors
    /// [`IndexError::NotInitialized`] before a successful build,
    /// [`IndexError::ConfigError`] for a threshold outside [0, 1].
    pub fn search_files(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> IndexResult<Vec<SearchResult>> {
        let index = match (&self.state, &self.index) {
            (IndexState::Ready, Some(index)) => index,
            _ => return Err(IndexError::NotInitialized),
        };

        let top_k = options.top_k.unwrap_or(self.settings.search.top_k);
        let threshold = options
            .similarity_threshold
            .unwrap_or(self.settings.search.similarity_threshold);
        if threshold.is_nan() || !(0.0..=1.0).contains(&threshold) {
            return Err(IndexError::ConfigError {
                reason: format!("similarity threshold must be in [0.0, 1.0], got {threshold}"),
            });
        }

        if index.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.provider.embed_query(query)?;
        let primary = index.search(&query_vector, top_k, threshold, &self.cache)?;
        debug!(query, primary = primary.len(), top_k, threshold, "vector matches");

        Ok(fusion::fuse(
            primary,
            self.graph.as_ref(),
            index,
            &self.cache,
            top_k,
        ))
    }

    /// Drop the index, the graph and all cached content.
    pub fn clear(&mut self) {
        self.index = None;
        self.graph = None;
        self.corpus_id = None;
        self.last_stats = None;
        self.cache.clear();
        self.state = IndexState::Uninitialized;
    }

    #[must_use]
    pub fn state(&self) -> IndexState {
        self.state
    }

    /// Number of indexed documents, zero when not built.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.index.as_ref().map_or(0, VectorIndex::len)
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Name of the embedding model in use.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Identity of the indexed corpus, when built.
    pub fn corpus_id(&self) -> Option<&str> {
        self.corpus_id.as_deref()
    }
}

/// Embed `documents` in one request and pair each with its vector.
fn embed(
    provider: &mut dyn EmbeddingGenerator,
    documents: Vec<Document>,
) -> Result<Vec<(Document, Vec<f32>)>, VectorError> {
    let texts: Vec<&str> = documents.iter().map(|d| d.content.as_str()).collect();
    let vectors = provider.embed_documents(&texts)?;
    if vectors.len() != documents.len() {
        return Err(VectorError::CountMismatch {
            expected: documents.len(),
            actual: vectors.len(),
        });
    }
    Ok(documents.into_iter().zip(vectors).collect())
}

fn emit(
    progress: &mut Option<ProgressSink>,
    phase: ProgressPhase,
    stats: &IndexStats,
    total: usize,
) {
    if let Some(sink) = progress.as_mut() {
        sink.emit(ProgressEvent {
            phase,
            attempted: stats.files_attempted,
            loaded: stats.files_loaded,
            skipped: stats.files_skipped,
            total,
        });
    }
}

/// SHA-256 over the sorted path list.
pub fn corpus_identity(paths: &[String]) -> String {
    let mut sorted: Vec<&str> = paths.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    for path in sorted {
        hasher.update(path.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
