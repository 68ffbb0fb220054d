//! Error types for the retrieval engine
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use crate::vector::VectorError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for index build and query operations
#[derive(Error, Debug)]
pub enum IndexError {
    /// A remote provider was selected but no API key is configured
    #[error(
        "No API key configured for embedding provider '{provider}'. Set embedding.api_key or the provider's environment variable"
    )]
    MissingCredential { provider: String },

    /// The configured provider is unknown or its capability is not available
    #[error("Embedding provider '{provider}' is not supported: {capability} is not available")]
    UnsupportedProvider {
        provider: String,
        capability: String,
    },

    /// Query issued before the index was built
    #[error("Index is not initialized. Call initialize() before searching")]
    NotInitialized,

    /// A remote embedding batch failed; the build was rolled back
    #[error("Embedding batch {batch} of {total} failed: {source}")]
    BatchEmbedding {
        batch: usize,
        total: usize,
        source: VectorError,
    },

    /// Embedding generation failed outside of batched ingestion
    #[error("Embedding failed: {0}")]
    Embedding(#[from] VectorError),

    /// File system errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Build requested for a different corpus while the index is ready
    #[error(
        "Index is already built for corpus {current}; clear it before building corpus {requested}"
    )]
    CorpusMismatch { current: String, requested: String },

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },
}

impl IndexError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::MissingCredential { .. } => "MISSING_CREDENTIAL",
            Self::UnsupportedProvider { .. } => "UNSUPPORTED_PROVIDER",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::BatchEmbedding { .. } => "BATCH_EMBEDDING_FAILED",
            Self::Embedding(_) => "EMBEDDING_FAILED",
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::CorpusMismatch { .. } => "CORPUS_MISMATCH",
            Self::ConfigError { .. } => "CONFIG_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::MissingCredential { .. } => vec![
                "Set embedding.api_key in .coderank/settings.toml",
                "Or export OPENAI_API_KEY / VOYAGE_API_KEY for the selected provider",
                "Use embedding.provider = \"local\" for offline TF-IDF embeddings",
            ],
            Self::UnsupportedProvider { .. } => vec![
                "Supported providers: local, openai, voyage",
            ],
            Self::NotInitialized => vec!["Build the index with initialize() before searching"],
            Self::BatchEmbedding { .. } => vec![
                "The build was rolled back, the index is uninitialized",
                "Check the provider's rate limits and retry the build",
            ],
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
                "Ensure the file is not locked by another process",
            ],
            Self::CorpusMismatch { .. } => vec!["Call clear() before indexing a different corpus"],
            _ => vec![],
        }
    }
}

/// Result type alias for index operations
pub type IndexResult<T> = Result<T, IndexError>;
