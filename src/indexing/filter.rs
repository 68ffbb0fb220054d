//! Candidate file selection.
//!
//! Rules apply in order: exclude patterns, then test-file removal (only when
//! no extension allowlist is configured), then the allowlist itself.
//! Exclude and test rules look only at the part of a path below the corpus
//! root, so a root living under `spec/` or `tests/` does not drop everything.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::config::IndexingConfig;

/// Directory names that mark test code.
const TEST_DIRS: &[&str] = &["test", "tests", "__tests__", "spec", "specs"];

/// File stem suffixes that mark test code.
const TEST_SUFFIXES: &[&str] = &["_test", ".test", "_spec", ".spec"];

#[derive(Debug, Clone)]
pub struct FileFilter {
    exclude_patterns: Vec<String>,
    /// Lower-cased, without leading dots
    include_extensions: Vec<String>,
    root: Option<PathBuf>,
}

impl FileFilter {
    pub fn new(exclude_patterns: Vec<String>, include_extensions: &[String]) -> Self {
        let include_extensions = include_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self {
            exclude_patterns,
            include_extensions,
            root: None,
        }
    }

    /// Sets the corpus root stripped from paths before rules apply.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn from_config(config: &IndexingConfig) -> Self {
        let filter = Self::new(config.exclude_patterns.clone(), &config.include_extensions);
        match &config.root {
            Some(root) => filter.with_root(root.clone()),
            None => filter,
        }
    }

    /// Part of `path` the rules look at.
    fn relative<'a>(&self, path: &'a str) -> Cow<'a, str> {
        self.root
            .as_deref()
            .and_then(|root| Path::new(path).strip_prefix(root).ok())
            .map_or(Cow::Borrowed(path), |rel| rel.to_string_lossy())
    }

    /// Whether `path` should be indexed.
    pub fn accepts(&self, path: &str) -> bool {
        let relative = self.relative(path);
        if self
            .exclude_patterns
            .iter()
            .any(|pattern| !pattern.is_empty() && relative.contains(pattern.as_str()))
        {
            return false;
        }

        if self.include_extensions.is_empty() {
            return !is_test_file(&relative);
        }

        Path::new(path)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.include_extensions.contains(&ext))
    }

    /// Keep accepted paths, preserving order.
    pub fn apply<'a>(&self, paths: &'a [String]) -> Vec<&'a str> {
        paths
            .iter()
            .map(String::as_str)
            .filter(|p| self.accepts(p))
            .collect()
    }
}

/// Whether `path` looks like test code.
pub fn is_test_file(path: &str) -> bool {
    let path = Path::new(path);

    let in_test_dir = path
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .any(|c| TEST_DIRS.contains(&c.as_os_str().to_string_lossy().as_ref()));
    if in_test_dir {
        return true;
    }

    let Some(stem) = path.file_stem().map(|s| s.to_string_lossy()) else {
        return false;
    };
    stem.starts_with("test_") || TEST_SUFFIXES.iter().any(|suffix| stem.ends_with(suffix))
}
