//! Remote embedding providers.
//!
//! Blocking HTTP clients for hosted embedding APIs. Both supported services
//! accept `{ model, input: [..] }` and answer with `{ data: [{ embedding, index }] }`.
//! Requests are never retried here; retry policy belongs to the caller.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::vector::{EmbeddingGenerator, VectorDimension, VectorError};

/// Hosted embedding services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteKind {
    /// OpenAI `text-embedding-3-small`, the primary cloud provider.
    OpenAi,
    /// Voyage AI `voyage-code-3`, the secondary cloud provider.
    Voyage,
}

impl RemoteKind {
    /// Configuration name of the provider.
    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Voyage => "voyage",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "text-embedding-3-small",
            Self::Voyage => "voyage-code-3",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1/embeddings",
            Self::Voyage => "https://api.voyageai.com/v1/embeddings",
        }
    }

    pub fn default_dimension(&self) -> usize {
        match self {
            Self::OpenAi => 1536,
            Self::Voyage => 1024,
        }
    }

    /// Environment variable consulted when no key is configured.
    pub fn credential_env(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Voyage => "VOYAGE_API_KEY",
        }
    }

    pub fn max_texts_per_request(&self) -> usize {
        match self {
            Self::OpenAi => 2048,
            Self::Voyage => 128,
        }
    }

    /// Total tokens accepted across all inputs of one request.
    ///
    /// Both services also cap each single input, so documents sent to them
    /// always go through the per-document token cap.
    pub fn token_budget(&self) -> Option<usize> {
        match self {
            Self::OpenAi => Some(300_000),
            Self::Voyage => Some(120_000),
        }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_type: Option<&'static str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

/// Blocking client for one hosted embedding service.
pub struct RemoteEmbedder {
    kind: RemoteKind,
    client: reqwest::blocking::Client,
    api_key: String,
    endpoint: String,
    model: String,
    dimension: VectorDimension,
}

impl std::fmt::Debug for RemoteEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteEmbedder")
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl RemoteEmbedder {
    /// Create a client for `kind`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        kind: RemoteKind,
        api_key: String,
        model: Option<String>,
        endpoint: Option<String>,
        timeout: Duration,
    ) -> Result<Self, VectorError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VectorError::EmbeddingFailed(format!("Failed to build HTTP client: {e}")))?;

        // Dimension is fixed by the default model of each service
        let dimension = VectorDimension::new(kind.default_dimension())?;

        Ok(Self {
            kind,
            client,
            api_key,
            endpoint: endpoint.unwrap_or_else(|| kind.default_endpoint().to_string()),
            model: model.unwrap_or_else(|| kind.default_model().to_string()),
            dimension,
        })
    }

    #[must_use]
    pub fn kind(&self) -> RemoteKind {
        self.kind
    }

    fn input_type(&self, query: bool) -> Option<&'static str> {
        match (self.kind, query) {
            (RemoteKind::Voyage, true) => Some("query"),
            (RemoteKind::Voyage, false) => Some("document"),
            (RemoteKind::OpenAi, _) => None,
        }
    }

    /// Send one request and return vectors in input order.
    fn request(&self, texts: &[&str], query: bool) -> Result<Vec<Vec<f32>>, VectorError> {
        let max = self.kind.max_texts_per_request();
        if texts.len() > max {
            return Err(VectorError::TooManyTexts {
                count: texts.len(),
                max,
            });
        }

        let body = EmbedRequest {
            model: &self.model,
            input: texts.to_vec(),
            input_type: self.input_type(query),
        };

        debug!(
            provider = self.kind.provider_name(),
            texts = texts.len(),
            "sending embedding request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                VectorError::EmbeddingFailed(format!(
                    "Request to {} failed: {e}",
                    self.kind.provider_name()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(VectorError::EmbeddingFailed(match status.as_u16() {
                401 | 403 => format!(
                    "{} rejected the API key ({status})",
                    self.kind.provider_name()
                ),
                429 => format!("Rate limited by {} ({status})", self.kind.provider_name()),
                _ => format!("{} returned {status}: {detail}", self.kind.provider_name()),
            }));
        }

        let parsed: EmbedResponse = response.json().map_err(|e| {
            VectorError::EmbeddingFailed(format!("Failed to parse embedding response: {e}"))
        })?;

        order_embeddings(parsed.data, texts.len(), self.dimension)
    }
}

/// Put response rows back into request order and validate their shape.
fn order_embeddings(
    mut data: Vec<EmbedData>,
    expected: usize,
    dimension: VectorDimension,
) -> Result<Vec<Vec<f32>>, VectorError> {
    if data.len() != expected {
        return Err(VectorError::CountMismatch {
            expected,
            actual: data.len(),
        });
    }

    if data.iter().all(|d| d.index.is_some()) {
        data.sort_by_key(|d| d.index);
    }

    data.into_iter()
        .map(|d| {
            dimension.validate_vector(&d.embedding)?;
            Ok(d.embedding)
        })
        .collect()
}

impl EmbeddingGenerator for RemoteEmbedder {
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.kind.max_texts_per_request()) {
            all.extend(self.request(chunk, false)?);
        }
        Ok(all)
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        self.request(&[text], true)?
            .into_iter()
            .next()
            .ok_or(VectorError::CountMismatch {
                expected: 1,
                actual: 0,
            })
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model
    }

    fn token_budget(&self) -> Option<usize> {
        self.kind.token_budget()
    }
}
