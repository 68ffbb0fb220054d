//! Shared fixtures for integration tests

use coderank::{EmbeddingGenerator, VectorDimension, VectorError};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const KEYWORDS: &[&str] = &["parse", "json", "cache", "graph", "http", "error"];

/// Deterministic embedder: one vector slot per keyword present in the text.
///
/// Every `embed_documents` call is recorded as the list of text lengths it
/// received, in characters.
pub struct KeywordEmbedder {
    budget: Option<usize>,
    fail_on_call: Option<usize>,
    pub calls: Arc<Mutex<Vec<Vec<usize>>>>,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self {
            budget: None,
            fail_on_call: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_token_budget(mut self, budget: usize) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn failing_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    fn vector_for(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut v: Vec<f32> = KEYWORDS
            .iter()
            .map(|k| if lower.contains(k) { 1.0 } else { 0.0 })
            .collect();
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

impl EmbeddingGenerator for KeywordEmbedder {
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(texts.iter().map(|t| t.chars().count()).collect());
            calls.len()
        };
        if self.fail_on_call == Some(call) {
            return Err(VectorError::EmbeddingFailed("rate limited".to_string()));
        }
        Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        Ok(Self::vector_for(text))
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(KEYWORDS.len()).unwrap()
    }

    fn name(&self) -> &str {
        "keyword-test"
    }

    fn token_budget(&self) -> Option<usize> {
        self.budget
    }
}

/// Write `files` under `root` and return their paths in the given order.
pub fn write_files(root: &Path, files: &[(&str, &str)]) -> Vec<String> {
    files
        .iter()
        .map(|(name, content)| {
            let path = root.join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&path, content).unwrap();
            path.to_string_lossy().into_owned()
        })
        .collect()
}
