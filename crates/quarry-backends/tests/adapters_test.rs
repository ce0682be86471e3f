//! Adapter integration tests: seeded stores, SQLite on disk, and the hosted
//! index against a local HTTP responder.

use std::sync::Arc;

use quarry_backends::relational_vector::VectorDocument;
use quarry_backends::{
    build_adapters, HashingEmbedder, HostedIndexAdapter, InMemoryAdapter, RelationalVectorAdapter,
    StoredDocument,
};
use quarry_core::config::{BackendsConfig, HostedIndexConfig};
use quarry_core::errors::ErrorCategory;
use quarry_core::models::BackendKind;
use quarry_core::traits::{BackendRequest, IBackendAdapter};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn request(text: &str) -> BackendRequest {
    BackendRequest {
        text: text.into(),
        max_results: 5,
        threshold: 0.0,
        filters: Default::default(),
    }
}

/// Serve one canned HTTP response on an ephemeral port; returns the base URL.
async fn respond_once(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });
    format!("http://{addr}/v1")
}

/// Read headers plus `content-length` bytes of body.
async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut data = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return;
        }
        data.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&data);
        if let Some(end) = text.find("\r\n\r\n") {
            let body_len = text[..end]
                .lines()
                .find_map(|l| {
                    let (k, v) = l.split_once(':')?;
                    k.eq_ignore_ascii_case("content-length")
                        .then(|| v.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if data.len() >= end + 4 + body_len {
                return;
            }
        }
    }
}

fn hosted(base_url: String) -> HostedIndexAdapter {
    HostedIndexAdapter::new(&HostedIndexConfig {
        enabled: true,
        base_url,
        store_id: "vs_test".into(),
        api_key: Some("sk-test".into()),
        request_timeout_ms: 2_000,
    })
    .unwrap()
}

#[tokio::test]
async fn hosted_index_decodes_success_page() {
    let base = respond_once(
        "200 OK",
        r#"{"data":[{"file_id":"file-9","filename":"cal.pdf","score":0.91,"content":[{"type":"text","text":"calibration steps"}],"attributes":{"domain":"metrology"}}]}"#,
    )
    .await;
    let hits = hosted(base).search(&request("calibration steps")).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].backend, BackendKind::HostedIndex);
    assert_eq!(hits[0].document_id, "file-9");
    assert!((hits[0].raw_score - 0.91).abs() < 1e-9);
}

#[tokio::test]
async fn hosted_index_classifies_http_failures() {
    let base = respond_once("429 Too Many Requests", r#"{"error":"slow down"}"#).await;
    let err = hosted(base).search(&request("q")).await.unwrap_err();
    assert_eq!(err.category, ErrorCategory::RateLimited);

    let base = respond_once("503 Service Unavailable", "{}").await;
    let err = hosted(base).search(&request("q")).await.unwrap_err();
    assert_eq!(err.category, ErrorCategory::Transient);

    let base = respond_once("401 Unauthorized", "{}").await;
    let err = hosted(base).search(&request("q")).await.unwrap_err();
    assert_eq!(err.category, ErrorCategory::Permanent);

    let base = respond_once("200 OK", r#"{"unexpected":true}"#).await;
    let err = hosted(base).search(&request("q")).await.unwrap_err();
    assert_eq!(err.category, ErrorCategory::Permanent);
}

#[tokio::test]
async fn hosted_index_connection_refused_is_transient() {
    // Bind then drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = hosted(format!("http://{addr}/v1"))
        .search(&request("q"))
        .await
        .unwrap_err();
    assert_eq!(err.category, ErrorCategory::Transient);
}

#[tokio::test]
async fn in_memory_seed_file_loads_corpus() {
    let store = InMemoryAdapter::from_seed_file(test_fixtures::fixture_path("corpus.json")).unwrap();
    assert_eq!(store.len(), 4);
    let hits = store.search(&request("calibration steps")).await.unwrap();
    assert!(hits.len() >= 2);
    assert!(hits
        .iter()
        .all(|h| h.document_id.starts_with("cal-")));
}

#[tokio::test]
async fn relational_vector_persists_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vectors.db");
    let embedder = Arc::new(HashingEmbedder::new(256));
    {
        let store = RelationalVectorAdapter::open(&path, embedder.clone()).unwrap();
        store
            .upsert(
                &VectorDocument::new("g1", "gauge.md", "pressure gauge calibration")
                    .with_metadata("domain", serde_json::json!("metrology")),
            )
            .unwrap();
        store
            .upsert(&VectorDocument::new("g2", "menu.md", "pressure cooker soup"))
            .unwrap();
    }

    let reopened = RelationalVectorAdapter::open(&path, embedder).unwrap();
    assert_eq!(reopened.count().unwrap(), 2);

    let mut req = request("pressure gauge");
    req.filters.insert("domain".into(), "metrology".into());
    let hits = reopened.search(&req).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].document_id, "g1");
}

#[test]
fn factory_builds_enabled_backends_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = BackendsConfig::default();
    config.relational_vector.enabled = true;
    config.relational_vector.db_path = dir.path().join("v.db").display().to_string();
    config.hosted_index.enabled = true;
    config.hosted_index.store_id = "vs_1".into();

    let adapters = build_adapters(&config).unwrap();
    let kinds: Vec<_> = adapters.iter().map(|a| a.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            BackendKind::HostedIndex,
            BackendKind::RelationalVector,
            BackendKind::InMemory
        ]
    );

    config.hosted_index.store_id.clear();
    assert!(build_adapters(&config).is_err());
}

#[test]
fn stored_document_serde_accepts_missing_metadata() {
    let doc: StoredDocument =
        serde_json::from_str(r#"{"id":"x","source_name":"x.md","content":"text"}"#).unwrap();
    assert!(doc.metadata.is_empty());
}
