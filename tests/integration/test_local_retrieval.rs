//! End-to-end retrieval with the local TF-IDF provider

use coderank::vector::{EmbeddingGenerator, TfIdfEmbedder};
use coderank::{IndexError, IndexState, RetrievalEngine, SearchOptions, Settings, VectorDimension};
use tempfile::TempDir;

use crate::support::write_files;

fn corpus(dir: &TempDir) -> Vec<String> {
    write_files(
        dir.path(),
        &[
            ("src/parser.rs", "parse json tokens into json values"),
            ("src/cache.rs", "fifo cache evicts oldest cache entry"),
            ("src/http.rs", "http client sends request and reads response"),
            ("README.md", "project overview and usage notes"),
            ("src/tests/parser_fixtures.rs", "json tokens json tokens"),
            ("node_modules/lib/index.js", "json tokens"),
        ],
    )
}

#[test]
fn test_search_before_initialize_is_rejected() {
    let engine = RetrievalEngine::new(Settings::default()).unwrap();
    let err = engine
        .search_files("json", SearchOptions::default())
        .unwrap_err();
    assert!(matches!(err, IndexError::NotInitialized));
}

#[test]
fn test_local_index_ranks_matching_file_first() {
    let dir = TempDir::new().unwrap();
    let paths = corpus(&dir);
    let mut engine = RetrievalEngine::new(Settings::default()).unwrap();

    let stats = engine.initialize(&paths, None, None).unwrap();
    // The test fixture and node_modules file are filtered out
    assert_eq!(stats.files_attempted, 4);
    assert_eq!(stats.files_loaded, 4);
    assert_eq!(engine.state(), IndexState::Ready);
    assert_eq!(engine.provider_name(), "local-tfidf");

    let results = engine
        .search_files("json tokens", SearchOptions::default())
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].path.ends_with("parser.rs"));
    // cos([1,2,1,1,1], [0,1,1,0,0]) = 3 / (sqrt(8) * sqrt(2))
    assert!((results[0].relevance_score - 0.75).abs() < 1e-4);
    assert_eq!(results[0].content, "parse json tokens into json values");
}

#[test]
fn test_result_count_and_threshold_bounds() {
    let dir = TempDir::new().unwrap();
    let paths = corpus(&dir);
    let mut engine = RetrievalEngine::new(Settings::default()).unwrap();
    engine.initialize(&paths, None, None).unwrap();

    for top_k in 1..=4 {
        for threshold in [0.0, 0.3, 0.5, 0.9] {
            let options = SearchOptions::default().top_k(top_k).threshold(threshold);
            let results = engine.search_files("cache json request", options).unwrap();
            assert!(results.len() <= 2 * top_k);
            assert!(results.iter().all(|r| r.relevance_score >= threshold));
        }
    }
}

#[test]
fn test_allowlist_admits_test_files() {
    let dir = TempDir::new().unwrap();
    let paths = corpus(&dir);
    let mut settings = Settings::default();
    settings.indexing.include_extensions = vec![".RS".to_string()];
    let mut engine = RetrievalEngine::new(settings).unwrap();

    let stats = engine.initialize(&paths, None, None).unwrap();
    // parser, cache, http and the test fixture
    assert_eq!(stats.files_loaded, 4);
    assert_eq!(engine.document_count(), 4);
}

#[test]
fn test_truncated_and_oversized_files() {
    let dir = TempDir::new().unwrap();
    let paths = write_files(
        dir.path(),
        &[
            ("long.rs", "json json json json"),
            ("other.rs", "cache"),
            ("huge.rs", &"x".repeat(41)),
        ],
    );
    let mut settings = Settings::default();
    settings.indexing.max_file_size = 20;
    let mut engine = RetrievalEngine::new(settings).unwrap();

    let stats = engine.initialize(&paths, None, None).unwrap();
    assert_eq!(stats.files_loaded, 2);
    assert_eq!(stats.files_skipped, 1);
    assert_eq!(stats.files_truncated, 0);

    let mut settings = Settings::default();
    settings.indexing.max_file_size = 10;
    let mut engine = RetrievalEngine::new(settings).unwrap();
    let stats = engine.initialize(&paths[..2], None, None).unwrap();
    assert_eq!(stats.files_truncated, 1);

    let results = engine
        .search_files("json", SearchOptions::default())
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].truncated);
    // Content comes from the cache, which holds the whole file
    assert_eq!(results[0].content, "json json json json");
}

#[test]
fn test_all_files_failing_yields_empty_ready_index() {
    let mut engine = RetrievalEngine::new(Settings::default()).unwrap();
    let paths = vec![
        "/nonexistent/coderank/a.rs".to_string(),
        "/nonexistent/coderank/b.rs".to_string(),
    ];

    let stats = engine.initialize(&paths, None, None).unwrap();
    assert_eq!(engine.state(), IndexState::Ready);
    assert_eq!(engine.document_count(), 0);
    assert_eq!(stats.files_skipped, 2);
    assert!(
        engine
            .search_files("anything", SearchOptions::default())
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_clear_allows_a_new_corpus() {
    let dir = TempDir::new().unwrap();
    let paths = corpus(&dir);
    let mut engine = RetrievalEngine::new(Settings::default()).unwrap();
    engine.initialize(&paths, None, None).unwrap();
    let first_id = engine.corpus_id().unwrap().to_string();

    let err = engine.initialize(&paths[..2], None, None).unwrap_err();
    assert_eq!(err.status_code(), "CORPUS_MISMATCH");

    engine.clear();
    assert!(engine.cache().is_empty());
    engine.initialize(&paths[..2], None, None).unwrap();
    assert_ne!(engine.corpus_id().unwrap(), first_id);
    assert_eq!(engine.document_count(), 2);
}

#[test]
fn test_tfidf_properties() {
    let mut embedder = TfIdfEmbedder::new(VectorDimension::new(3).unwrap());
    let vectors = embedder
        .embed_documents(&["alpha beta", "beta gamma", "gamma delta"])
        .unwrap();

    // beta and gamma appear in two documents each and take the first slots
    assert!(embedder.term_index("beta").unwrap() < embedder.term_index("alpha").unwrap());
    assert!(embedder.term_index("gamma").unwrap() < embedder.term_index("alpha").unwrap());
    assert!(embedder.term_index("delta").is_none());

    for v in &vectors {
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5 || norm == 0.0);
    }

    let again = embedder.embed_query("alpha beta").unwrap();
    assert_eq!(again, embedder.embed_query("alpha beta").unwrap());
}

#[test]
fn test_root_under_spec_directory_is_indexed() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("spec").join("myapp");
    let paths = write_files(
        &root,
        &[
            ("src/parser.rs", "parse json tokens"),
            ("src/cache.rs", "fifo cache"),
            ("tests/parser_test.rs", "json tokens"),
        ],
    );

    let mut settings = Settings::default();
    settings.indexing.root = Some(root.clone());
    let mut engine = RetrievalEngine::new(settings).unwrap();

    let stats = engine.initialize(&paths, None, None).unwrap();
    assert_eq!(stats.files_attempted, 2);
    assert_eq!(stats.files_loaded, 2);
    assert_eq!(engine.document_count(), 2);
}
