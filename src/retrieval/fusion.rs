//! Graph-aware relevance fusion.
//!
//! Files structurally close to the vector matches are pulled into the result
//! set. Each primary match contributes fixed weights to its neighbours:
//! files it imports, files importing it, and files sharing its module.
//! Weights accumulate across rules and across primary matches.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::graph::DependencyGraph;
use crate::storage::ContentCache;
use crate::types::SearchResult;
use crate::vector::VectorIndex;

/// Weight given to a file imported by a match.
pub const IMPORT_WEIGHT: f32 = 0.4;
/// Weight given to a file importing a match.
pub const IMPORTER_WEIGHT: f32 = 0.3;
/// Weight given to a file in the same module as a match.
pub const SAME_MODULE_WEIGHT: f32 = 0.2;

/// Structural scores of files related to `primary`, excluding `primary`.
///
/// Entries are in first-contribution order.
pub fn related_scores(graph: &DependencyGraph, primary: &[&str]) -> Vec<(String, f32)> {
    let excluded: HashSet<&str> = primary.iter().copied().collect();
    let mut order: Vec<String> = Vec::new();
    let mut scores: HashMap<String, f32> = HashMap::new();

    let mut add = |path: &str, weight: f32| {
        if excluded.contains(path) {
            return;
        }
        match scores.get_mut(path) {
            Some(score) => *score += weight,
            None => {
                scores.insert(path.to_string(), weight);
                order.push(path.to_string());
            }
        }
    };

    for &path in primary {
        for target in graph.imports_of(path) {
            add(target, IMPORT_WEIGHT);
        }
        for importer in graph.importers_of(path) {
            add(importer, IMPORTER_WEIGHT);
        }
        if let Some(module) = graph.module_of(path) {
            for file in module.files.iter().filter(|f| f.as_str() != path) {
                add(file, SAME_MODULE_WEIGHT);
            }
        }
    }

    order
        .into_iter()
        .map(|path| {
            let score = scores.get(&path).copied().unwrap_or_default();
            (path, score)
        })
        .collect()
}

/// Merge vector matches with their structural neighbours.
///
/// Related files keep their accumulated structural score. The merged list is
/// sorted by descending score (primary before related on ties, then by path)
/// and capped at `2 * top_k`. Related files whose content cannot be resolved
/// are dropped. Indexed related files report their indexed size and
/// truncation. Without a graph the primary results are returned unchanged.
pub fn fuse(
    primary: Vec<SearchResult>,
    graph: Option<&DependencyGraph>,
    index: &VectorIndex,
    cache: &ContentCache,
    top_k: usize,
) -> Vec<SearchResult> {
    let Some(graph) = graph else {
        return primary;
    };

    let primary_paths: Vec<&str> = primary.iter().map(|r| r.path.as_str()).collect();
    let related = related_scores(graph, &primary_paths);
    let expanded = related.len();

    let mut merged: Vec<(bool, SearchResult)> = primary.into_iter().map(|r| (true, r)).collect();
    for (path, score) in related {
        let Some(content) = cache.resolve(&path) else {
            continue;
        };
        let (size, truncated) = match index.document(&path) {
            Some(doc) => (doc.size, doc.truncated),
            None => (
                std::fs::metadata(&path)
                    .map(|m| m.len())
                    .unwrap_or(content.len() as u64),
                false,
            ),
        };
        merged.push((
            false,
            SearchResult {
                path,
                content,
                truncated,
                size,
                relevance_score: score,
            },
        ));
    }

    merged.sort_by(|(a_primary, a), (b_primary, b)| {
        b.relevance_score
            .total_cmp(&a.relevance_score)
            .then_with(|| b_primary.cmp(a_primary))
            .then_with(|| a.path.cmp(&b.path))
    });
    merged.truncate(top_k.saturating_mul(2));

    debug!(expanded, returned = merged.len(), "graph fusion complete");
    merged.into_iter().map(|(_, r)| r).collect()
}
