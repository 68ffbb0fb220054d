//! Configuration loading and provider selection

use coderank::{EmbeddingGenerator, EmbeddingProvider, IndexError, RetrievalEngine, Settings};
use tempfile::TempDir;

fn settings_file(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_settings_file_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = settings_file(
        &dir,
        r#"
[embedding]
provider = "local"
dimensions = 64

[search]
top_k = 3
similarity_threshold = 0.25

[indexing]
include_extensions = ["rs", "md"]
"#,
    );

    let settings = Settings::load_from(&path).unwrap();
    assert_eq!(settings.embedding.dimensions, 64);
    assert_eq!(settings.search.top_k, 3);
    assert_eq!(settings.search.similarity_threshold, 0.25);
    assert_eq!(settings.indexing.include_extensions, vec!["rs", "md"]);
    // Untouched sections keep their defaults
    assert_eq!(settings.cache.max_entries, 100);
    assert_eq!(settings.indexing.max_file_size, 100_000);

    let engine = RetrievalEngine::new(settings).unwrap();
    assert_eq!(engine.cache().capacity(), 100);
    assert_eq!(engine.settings().embedding.dimensions, 64);
}

#[test]
fn test_unsupported_providers_fail_at_construction() {
    for provider in ["transformers", "cohere"] {
        let mut settings = Settings::default();
        settings.embedding.provider = provider.to_string();
        let err = RetrievalEngine::new(settings).unwrap_err();
        assert!(
            matches!(err, IndexError::UnsupportedProvider { .. }),
            "{provider}: {err}"
        );
    }
}

#[test]
fn test_remote_providers_need_a_credential() {
    let mut settings = Settings::default();
    for provider in ["openai", "voyage"] {
        settings.embedding.provider = provider.to_string();
        let err = EmbeddingProvider::from_config_with_env(&settings.embedding, |_| None).unwrap_err();
        assert!(matches!(err, IndexError::MissingCredential { .. }));
        assert!(!err.recovery_suggestions().is_empty());
    }
}

#[test]
fn test_configured_key_selects_remote_provider() {
    let mut settings = Settings::default();
    settings.embedding.provider = "openai".to_string();
    settings.embedding.api_key = Some("sk-test".to_string());

    let provider = EmbeddingProvider::from_config_with_env(&settings.embedding, |_| None).unwrap();
    assert_eq!(provider.dimension().get(), 1536);
    assert_eq!(provider.name(), "text-embedding-3-small");
    assert_eq!(provider.token_budget(), Some(300_000));
    // Debug output never leaks the key
    assert!(!format!("{provider:?}").contains("sk-test"));
}

#[test]
fn test_invalid_values_are_rejected() {
    let mut settings = Settings::default();
    settings.search.top_k = 0;
    let err = RetrievalEngine::new(settings).unwrap_err();
    assert_eq!(err.status_code(), "CONFIG_ERROR");
}
