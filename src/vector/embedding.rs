//! Embedding generation for the retrieval index.
//!
//! [`EmbeddingGenerator`] is the seam between the index and whatever turns
//! text into vectors. [`EmbeddingProvider`] is the closed set of generators
//! the engine can be configured with, chosen once at construction time.

use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::{IndexError, IndexResult};
use crate::vector::{RemoteEmbedder, RemoteKind, TfIdfEmbedder, VectorDimension, VectorError};

/// Trait for generating embeddings from text.
///
/// Implementations must be thread-safe. Document embedding takes `&mut self`
/// because some models learn corpus statistics on their first batch.
pub trait EmbeddingGenerator: Send + Sync {
    /// Generate embeddings for multiple texts.
    ///
    /// # Returns
    /// One vector per input text, in input order, or an error
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError>;

    /// Generate the embedding of a search query.
    fn embed_query(&self, text: &str) -> Result<Vec<f32>, VectorError>;

    /// Get the dimension of embeddings produced by this generator.
    #[must_use]
    fn dimension(&self) -> VectorDimension;

    /// Human-readable model name, used in logs.
    fn name(&self) -> &str;

    /// Total token budget of a single request, for providers that enforce one.
    fn token_budget(&self) -> Option<usize> {
        None
    }
}

/// The embedding backends the engine can be configured with.
#[derive(Debug)]
pub enum EmbeddingProvider {
    /// Offline TF-IDF model
    Local(TfIdfEmbedder),
    /// Hosted embedding API
    Remote(RemoteEmbedder),
}

impl EmbeddingProvider {
    /// Build the provider named in `config`.
    ///
    /// Remote providers read their key from `config.api_key`, falling back to
    /// the provider's environment variable.
    ///
    /// # Errors
    /// `MissingCredential` for a remote provider without a key,
    /// `UnsupportedProvider` for names outside the supported set.
    pub fn from_config(config: &EmbeddingConfig) -> IndexResult<Self> {
        Self::from_config_with_env(config, |name| std::env::var(name).ok())
    }

    /// Same as [`from_config`](Self::from_config) with an explicit environment lookup.
    pub fn from_config_with_env(
        config: &EmbeddingConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> IndexResult<Self> {
        let name = config.provider.trim().to_lowercase();
        let kind = match name.as_str() {
            "local" | "tfidf" => {
                let dimension = VectorDimension::new(config.dimensions)?;
                return Ok(Self::Local(TfIdfEmbedder::new(dimension)));
            }
            "openai" => RemoteKind::OpenAi,
            "voyage" => RemoteKind::Voyage,
            "transformers" => {
                return Err(IndexError::UnsupportedProvider {
                    provider: config.provider.clone(),
                    capability: "in-process transformer inference".to_string(),
                });
            }
            _ => {
                return Err(IndexError::UnsupportedProvider {
                    provider: config.provider.clone(),
                    capability: "an embedding backend for this name".to_string(),
                });
            }
        };

        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| env(kind.credential_env()).filter(|key| !key.trim().is_empty()))
            .ok_or_else(|| IndexError::MissingCredential {
                provider: kind.provider_name().to_string(),
            })?;

        let embedder = RemoteEmbedder::new(
            kind,
            api_key,
            config.model.clone(),
            config.endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self::Remote(embedder))
    }

    fn inner(&self) -> &dyn EmbeddingGenerator {
        match self {
            Self::Local(e) => e,
            Self::Remote(e) => e,
        }
    }
}

impl EmbeddingGenerator for EmbeddingProvider {
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        match self {
            Self::Local(e) => e.embed_documents(texts),
            Self::Remote(e) => e.embed_documents(texts),
        }
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        self.inner().embed_query(text)
    }

    fn dimension(&self) -> VectorDimension {
        self.inner().dimension()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn token_budget(&self) -> Option<usize> {
        self.inner().token_budget()
    }
}

/// Mock embedding generator for testing.
///
/// Generates deterministic embeddings based on keywords in the text and can
/// be told to fail on a given call, to exercise error paths.
#[cfg(test)]
pub struct MockEmbeddingGenerator {
    dimension: VectorDimension,
    token_budget: Option<usize>,
    fail_on_call: Option<usize>,
    pub calls: Vec<usize>,
}

#[cfg(test)]
impl MockEmbeddingGenerator {
    /// Create a mock producing 8-dimensional vectors.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dimension: VectorDimension::new(8).unwrap(),
            token_budget: None,
            fail_on_call: None,
            calls: Vec::new(),
        }
    }

    /// Pretend to be a provider with a per-request token budget.
    #[must_use]
    pub fn with_token_budget(mut self, budget: usize) -> Self {
        self.token_budget = Some(budget);
        self
    }

    /// Fail the n-th (1-based) `embed_documents` call.
    #[must_use]
    pub fn failing_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let dim = self.dimension.get();
        let mut embedding = vec![0.0; dim];
        let keywords = ["parse", "json", "error", "async", "cache", "graph", "http", "test"];
        for (i, keyword) in keywords.iter().enumerate().take(dim) {
            if text.to_lowercase().contains(keyword) {
                embedding[i] = 1.0;
            }
        }
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for val in &mut embedding {
                *val /= magnitude;
            }
        }
        embedding
    }
}

#[cfg(test)]
impl EmbeddingGenerator for MockEmbeddingGenerator {
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        self.calls.push(texts.len());
        if self.fail_on_call == Some(self.calls.len()) {
            return Err(VectorError::EmbeddingFailed("mock failure".to_string()));
        }
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        Ok(self.vector_for(text))
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn token_budget(&self) -> Option<usize> {
        self.token_budget
    }
}
