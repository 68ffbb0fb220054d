//! Token-bounded batching for providers with a request budget

use coderank::{IndexError, IndexState, RetrievalEngine, SearchOptions, Settings};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::TempDir;

use crate::support::{KeywordEmbedder, write_files};

fn corpus(dir: &TempDir, count: usize) -> Vec<String> {
    let files: Vec<(String, String)> = (0..count)
        .map(|i| {
            let content = if i == 3 {
                // ~2000 estimated tokens
                "cache ".repeat(1334)
            } else {
                format!("graph node {i}")
            };
            (format!("src/file_{i:02}.rs"), content)
        })
        .collect();
    let refs: Vec<(&str, &str)> = files
        .iter()
        .map(|(name, content)| (name.as_str(), content.as_str()))
        .collect();
    write_files(dir.path(), &refs)
}

#[test]
fn test_large_corpus_is_sent_in_batches_of_five() {
    let dir = TempDir::new().unwrap();
    let paths = corpus(&dir, 12);
    let embedder = KeywordEmbedder::new().with_token_budget(120_000);
    let calls = embedder.calls.clone();

    let mut engine = RetrievalEngine::with_provider(Settings::default(), embedder).unwrap();
    let stats = engine.initialize(&paths, None, None).unwrap();

    let calls = calls.lock().unwrap();
    let sizes: Vec<usize> = calls.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![5, 5, 2]);
    assert_eq!(stats.batches, 3);
    assert_eq!(engine.document_count(), 12);

    // The oversized document was cut to 5400 characters before sending
    assert_eq!(calls[0][3], 5400);
    assert!(calls.iter().flatten().all(|&len| len <= 5400));
}

#[test]
fn test_small_corpus_is_sent_in_one_request() {
    let dir = TempDir::new().unwrap();
    let paths = corpus(&dir, 10);
    let embedder = KeywordEmbedder::new().with_token_budget(120_000);
    let calls = embedder.calls.clone();

    let mut engine = RetrievalEngine::with_provider(Settings::default(), embedder).unwrap();
    engine.initialize(&paths, None, None).unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 10);
    // Not batched, so not cut either
    assert_eq!(calls[0][3], 1334 * 6);
}

#[test]
fn test_unbudgeted_provider_is_never_batched() {
    let dir = TempDir::new().unwrap();
    let paths = corpus(&dir, 12);
    let embedder = KeywordEmbedder::new();
    let calls = embedder.calls.clone();

    let mut engine = RetrievalEngine::with_provider(Settings::default(), embedder).unwrap();
    engine.initialize(&paths, None, None).unwrap();

    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[test]
fn test_failed_batch_rolls_back_the_build() {
    let dir = TempDir::new().unwrap();
    let paths = corpus(&dir, 11);
    let embedder = KeywordEmbedder::new()
        .with_token_budget(120_000)
        .failing_on_call(3);

    let mut engine = RetrievalEngine::with_provider(Settings::default(), embedder).unwrap();
    let err = engine.initialize(&paths, None, None).unwrap_err();

    match &err {
        IndexError::BatchEmbedding { batch, total, .. } => {
            assert_eq!((*batch, *total), (3, 3));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.status_code(), "BATCH_EMBEDDING_FAILED");
    assert_eq!(engine.state(), IndexState::Uninitialized);
    assert!(engine.cache().is_empty());
    assert!(matches!(
        engine.search_files("graph", SearchOptions::default()),
        Err(IndexError::NotInitialized)
    ));

    // A later build succeeds once the provider recovers
    engine.initialize(&paths, None, None).unwrap();
    assert_eq!(engine.state(), IndexState::Ready);
    assert_eq!(engine.document_count(), 11);
}

/// Minimal embeddings endpoint answering `requests` POSTs with 1536-dim
/// vectors. Records the inputs of every request it receives.
fn serve_embeddings(requests: usize) -> (String, Arc<Mutex<Vec<Vec<String>>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}/v1/embeddings", listener.local_addr().unwrap());
    let received = Arc::new(Mutex::new(Vec::new()));
    let log = received.clone();

    thread::spawn(move || {
        for stream in listener.incoming().take(requests) {
            let mut stream = stream.unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).unwrap();

            let request: serde_json::Value = serde_json::from_slice(&body).unwrap();
            let inputs: Vec<String> = request["input"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_str().unwrap().to_string())
                .collect();

            let data: Vec<serde_json::Value> = (0..inputs.len())
                .map(|i| serde_json::json!({ "embedding": vec![1.0f32; 1536], "index": i }))
                .collect();
            log.lock().unwrap().push(inputs);

            let payload = serde_json::json!({ "data": data }).to_string();
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
                payload.len()
            )
            .unwrap();
            stream.flush().unwrap();
        }
    });

    (endpoint, received)
}

#[test]
fn test_openai_provider_sends_capped_batches() {
    let dir = TempDir::new().unwrap();
    let files: Vec<(String, String)> = (0..12)
        .map(|i| {
            let content = if i == 7 {
                "cache ".repeat(15_000)
            } else {
                format!("graph node {i}")
            };
            (format!("src/file_{i:02}.rs"), content)
        })
        .collect();
    let refs: Vec<(&str, &str)> = files
        .iter()
        .map(|(name, content)| (name.as_str(), content.as_str()))
        .collect();
    let paths = write_files(dir.path(), &refs);

    let (endpoint, received) = serve_embeddings(3);
    let mut settings = Settings::default();
    settings.embedding.provider = "openai".to_string();
    settings.embedding.api_key = Some("sk-test".to_string());
    settings.embedding.endpoint = Some(endpoint);

    let mut engine = RetrievalEngine::new(settings).unwrap();
    let stats = engine.initialize(&paths, None, None).unwrap();

    assert_eq!(engine.state(), IndexState::Ready);
    assert_eq!(engine.document_count(), 12);
    assert_eq!(stats.batches, 3);

    let received = received.lock().unwrap();
    let sizes: Vec<usize> = received.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![5, 5, 2]);
    // The 90 000 character file went out cut to 5400 characters
    assert_eq!(received[1][2].chars().count(), 5400);
    assert!(received.iter().flatten().all(|input| input.chars().count() <= 5400));
}
