//! File dependency graph consumed by relevance fusion.
//!
//! The graph is produced by an external analyzer and handed to the engine
//! read-only. It deserializes from the analyzer's camelCase JSON.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{IndexError, IndexResult};

/// Where an import points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    /// Another file of the same project
    Local,
    /// A third-party package
    External,
    /// A language or framework built-in
    Framework,
}

/// One import statement from `source` to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportEdge {
    /// Importing file
    pub source: String,
    /// Import specifier as written
    pub target: String,
    /// File the specifier resolved to, when it could be resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_path: Option<String>,
    #[serde(rename = "type")]
    pub kind: ImportKind,
}

impl ImportEdge {
    /// Resolved target of a local import.
    pub fn local_target(&self) -> Option<&str> {
        match self.kind {
            ImportKind::Local => self.resolved_path.as_deref(),
            _ => None,
        }
    }
}

/// A named group of files, such as a package or directory module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub name: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyGraph {
    #[serde(default)]
    pub imports: Vec<ImportEdge>,
    #[serde(default)]
    pub modules: Vec<Module>,
}

impl DependencyGraph {
    /// Read a graph from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> IndexResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| IndexError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| IndexError::ConfigError {
            reason: format!("invalid dependency graph {}: {e}", path.display()),
        })
    }

    /// Local files imported by `path`.
    pub fn imports_of<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.imports
            .iter()
            .filter(move |edge| edge.source == path)
            .filter_map(ImportEdge::local_target)
    }

    /// Files whose local imports resolve to `path`.
    pub fn importers_of<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.imports
            .iter()
            .filter(move |edge| edge.local_target() == Some(path))
            .map(|edge| edge.source.as_str())
    }

    /// First module listing `path` among its files.
    pub fn module_of(&self, path: &str) -> Option<&Module> {
        self.modules
            .iter()
            .find(|module| module.files.iter().any(|f| f == path))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.modules.is_empty()
    }
}
