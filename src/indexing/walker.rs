//! File system walker for discovering candidate files
//!
//! This module provides directory traversal with support for:
//! - .gitignore rules
//! - `.coderankignore` files with the same syntax
//! - Hidden file handling
//!
//! Exclude patterns, test-file detection and the extension allowlist are
//! applied later by [`FileFilter`](crate::indexing::FileFilter), so every
//! caller of the engine gets the same selection rules.

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Walks directories to find candidate files
#[derive(Debug, Default)]
pub struct FileWalker;

impl FileWalker {
    pub fn new() -> Self {
        Self
    }

    /// Walk a directory and return an iterator of regular files, in walk order
    pub fn walk(&self, root: &Path) -> impl Iterator<Item = PathBuf> {
        let mut builder = WalkBuilder::new(root);

        builder
            .hidden(true) // Skip hidden files and directories
            .git_ignore(true) // Respect .gitignore files
            .git_global(true) // Respect global gitignore
            .git_exclude(true) // Respect .git/info/exclude
            .follow_links(false)
            .max_depth(None)
            .require_git(false) // Allow gitignore to work in non-git directories
            .sort_by_file_name(|a, b| a.cmp(b));

        builder.add_custom_ignore_filename(".coderankignore");

        builder
            .build()
            .filter_map(Result::ok) // Skip files we can't access
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
    }

    /// Walk and render paths as strings, the form the engine indexes
    pub fn collect_paths(&self, root: &Path) -> Vec<String> {
        self.walk(root)
            .map(|p| p.to_string_lossy().into_owned())
            .collect()
    }
}
