//! End-to-end ingestion runs against mocked store and vector-store servers.

use httpmock::{
    Method::{GET, POST, PUT},
    MockServer,
};
use redindex::pipeline::{IngestionService, PipelineError, RunParams};
use serde_json::{Value, json};
use tokio::sync::OnceCell;

static INIT: OnceCell<()> = OnceCell::const_new();
static QDRANT: OnceCell<&'static MockServer> = OnceCell::const_new();

fn set_env(key: &str, value: &str) {
    // SAFETY: Tests establish deterministic configuration before any reads.
    unsafe { std::env::set_var(key, value) }
}

async fn mock_command(server: &MockServer, command: Value, result: Value) {
    server
        .mock_async(move |when, then| {
            when.method(POST).path("/").json_body(command);
            then.status(200).json_body(json!({ "result": result }));
        })
        .await;
}

/// Seed the mock store with one key per interesting case: a path-like string
/// key, an expiring cache entry, a hash, and an unsupported stream.
async fn seed_store(server: &MockServer) {
    mock_command(
        server,
        json!(["KEYS", "*"]),
        json!([
            "docs/readme.md",
            "cache:user:session:1",
            "user:1:profile",
            "stream:events"
        ]),
    )
    .await;

    mock_command(server, json!(["TYPE", "docs/readme.md"]), json!("string")).await;
    mock_command(
        server,
        json!(["GET", "docs/readme.md"]),
        json!("# Redindex\nIndexes a store into Qdrant."),
    )
    .await;
    mock_command(server, json!(["TTL", "docs/readme.md"]), json!(-1)).await;

    mock_command(
        server,
        json!(["TYPE", "cache:user:session:1"]),
        json!("string"),
    )
    .await;
    mock_command(
        server,
        json!(["GET", "cache:user:session:1"]),
        json!("opaque-session-token"),
    )
    .await;
    mock_command(server, json!(["TTL", "cache:user:session:1"]), json!(1200)).await;

    mock_command(server, json!(["TYPE", "user:1:profile"]), json!("hash")).await;
    mock_command(
        server,
        json!(["HGETALL", "user:1:profile"]),
        json!(["name", "Ada Lovelace", "status", "active"]),
    )
    .await;
    mock_command(server, json!(["TTL", "user:1:profile"]), json!(-1)).await;

    mock_command(server, json!(["TYPE", "stream:events"]), json!("stream")).await;
}

async fn init() {
    INIT.get_or_init(|| async {
        let store = Box::leak(Box::new(MockServer::start_async().await));
        let qdrant = Box::leak(Box::new(MockServer::start_async().await));

        set_env("REDIS_HOST", "127.0.0.1");
        set_env("REDIS_PORT", &store.address().port().to_string());
        set_env("QDRANT_URL", &qdrant.base_url());
        set_env("QDRANT_COLLECTION_NAME", "redindex");
        set_env("EMBEDDING_PROVIDER", "ollama");
        set_env("EMBEDDING_MODEL", "all-minilm-l6-v2");
        set_env("EMBEDDING_DIMENSION", "8");
        set_env("TEXT_SPLITTER_CHUNK_SIZE", "64");
        set_env("TEXT_SPLITTER_CHUNK_OVERLAP", "4");

        seed_store(store).await;
        QDRANT.set(qdrant).ok();

        redindex::config::init_config();
    })
    .await;
}

async fn mock_collection(server: &MockServer, collection: &str) {
    let collection_path = format!("/collections/{collection}");
    server
        .mock_async(move |when, then| {
            when.method(GET).path(collection_path);
            then.status(200).json_body(json!({
                "status": "ok",
                "result": { "status": "green" }
            }));
        })
        .await;

    let index_path = format!("/collections/{collection}/index");
    server
        .mock_async(move |when, then| {
            when.method(PUT).path(index_path);
            then.status(200).json_body(json!({ "status": "ok" }));
        })
        .await;
}

#[tokio::test]
async fn full_run_filters_excluded_keys_and_indexes_the_rest() {
    init().await;
    let qdrant = QDRANT.get().expect("qdrant mock initialized");
    mock_collection(qdrant, "redindex").await;

    let points_mock = qdrant
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/collections/redindex/points")
                .query_param("wait", "true")
                .body_contains("\"data_source_id\":\"run-e2e\"")
                .body_contains("\"file_path\":\"docs/readme.md\"")
                .body_contains("\"file_type\":\"md\"");
            then.status(200).json_body(json!({
                "status": "ok",
                "result": { "operation_id": 0, "status": "completed" }
            }));
        })
        .await;

    let service = IngestionService::new().expect("service");
    let outcome = service
        .run(RunParams {
            collection: "redindex".to_string(),
            data_source_id: "run-e2e".to_string(),
            inclusion_rules: Vec::new(),
            exclusion_rules: vec!["^cache:".to_string()],
        })
        .await
        .expect("run succeeds");

    points_mock.assert_async().await;
    assert_eq!(outcome.documents_loaded, 3);
    assert_eq!(outcome.documents_kept, 2);
    assert_eq!(outcome.documents_dropped, 1);
    assert_eq!(outcome.keys_skipped, 1);
    assert_eq!(outcome.chunks_indexed, 2);
    assert!(!outcome.store_unreachable);

    let snapshot = service.metrics_snapshot();
    assert_eq!(snapshot.documents_loaded, 3);
    assert_eq!(snapshot.documents_indexed, 2);
    assert_eq!(snapshot.chunks_indexed, 2);
}

#[tokio::test]
async fn vector_store_write_failure_is_propagated() {
    init().await;
    let qdrant = QDRANT.get().expect("qdrant mock initialized");
    mock_collection(qdrant, "redindex-broken").await;

    qdrant
        .mock_async(|when, then| {
            when.method(PUT).path("/collections/redindex-broken/points");
            then.status(500).body("write failed");
        })
        .await;

    let service = IngestionService::new().expect("service");
    let error = service
        .run(RunParams {
            collection: "redindex-broken".to_string(),
            data_source_id: "run-e2e".to_string(),
            inclusion_rules: Vec::new(),
            exclusion_rules: Vec::new(),
        })
        .await
        .unwrap_err();

    assert!(matches!(error, PipelineError::Qdrant(_)));
}

#[tokio::test]
async fn inclusion_rules_gate_everything_else_out() {
    init().await;
    let qdrant = QDRANT.get().expect("qdrant mock initialized");
    mock_collection(qdrant, "redindex-docs").await;

    let points_mock = qdrant
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/collections/redindex-docs/points")
                .body_contains("\"file_path\":\"docs/readme.md\"");
            then.status(200).json_body(json!({ "status": "ok" }));
        })
        .await;

    let service = IngestionService::new().expect("service");
    let outcome = service
        .run(RunParams {
            collection: "redindex-docs".to_string(),
            data_source_id: "run-docs".to_string(),
            inclusion_rules: vec!["[unclosed".to_string(), "^docs/".to_string()],
            exclusion_rules: Vec::new(),
        })
        .await
        .expect("run succeeds");

    points_mock.assert_async().await;
    assert_eq!(outcome.documents_kept, 1);
    assert_eq!(outcome.documents_dropped, 2);
}
