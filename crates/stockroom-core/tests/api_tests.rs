//! Integration tests for the StockroomApi public interface.
//!
//! These run the whole pipeline: a SQLite catalog on disk supplies the
//! keywords, the compiled query goes to a mocked index service over HTTP.

use std::time::Duration;
use stockroom_core::network::RetryConfig;
use stockroom_core::{
    CustomField, CustomFieldType, EntityKind, IndexServiceConfig, StockroomApi, TaskStatus,
};
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestEnv {
    _dir: TempDir,
    api: StockroomApi,
}

/// API against `server` with a fresh on-disk catalog holding a `Serial`
/// field for team `t1`.
fn create_test_env(server: &MockServer) -> (TestEnv, CustomField) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = IndexServiceConfig::new(&server.uri())
        .unwrap()
        .with_api_key("test-key")
        .with_retry(RetryConfig::none());
    let api = StockroomApi::builder(config)
        .catalog_path(dir.path().join("catalog.db"))
        .build()
        .unwrap();

    let field = CustomField::new("t1", "Serial", CustomFieldType::String);
    api.catalog().upsert_field(&field).unwrap();

    (TestEnv { _dir: dir, api }, field)
}

fn search_response(hits: serde_json::Value) -> ResponseTemplate {
    let total = hits.as_array().map(|h| h.len()).unwrap_or(0);
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "hits": hits,
        "processingTimeMs": 1,
        "estimatedTotalHits": total
    }))
}

#[tokio::test]
async fn test_search_sends_compiled_query_to_kind_index() {
    let server = MockServer::start().await;
    let (env, _) = create_test_env(&server);

    Mock::given(method("POST"))
        .and(path("/indexes/t1-assets/search"))
        .and(body_json(serde_json::json!({
            "q": "chair",
            "filter": "serial = \"AB 12\"",
            "limit": 20
        })))
        .respond_with(search_response(serde_json::json!([{"id": "a-1"}])))
        .expect(1)
        .mount(&server)
        .await;

    let results = env
        .api
        .search("t1", "is:asset serial:\"AB 12\" chair", 20)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].kind, EntityKind::Asset);
    assert_eq!(results[0].hits[0]["id"], "a-1");
}

#[tokio::test]
async fn test_search_without_kind_queries_all_team_indexes() {
    let server = MockServer::start().await;
    let (env, _) = create_test_env(&server);

    Mock::given(method("POST"))
        .and(path_regex(r"^/indexes/t1-(assets|asset-types|tags)/search$"))
        .respond_with(search_response(serde_json::json!([])))
        .expect(3)
        .mount(&server)
        .await;

    let results = env.api.search("t1", "Hello World", 5).await.unwrap();
    let kinds: Vec<EntityKind> = results.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![EntityKind::Asset, EntityKind::AssetType, EntityKind::Tag]
    );
}

#[tokio::test]
async fn test_field_rename_applies_to_next_search() {
    let server = MockServer::start().await;
    let (env, field) = create_test_env(&server);

    let plan = env.api.plan("t1", "serial:AB12").await.unwrap();
    assert_eq!(plan.query.filter.as_deref(), Some("serial = \"AB12\""));

    env.api.catalog().rename_field(&field.id, "Asset Code").unwrap();

    let plan = env.api.plan("t1", "serial:AB12 assetCode:AB12").await.unwrap();
    assert_eq!(plan.query.q.as_deref(), Some("serial:AB12"));
    assert_eq!(plan.query.filter.as_deref(), Some("assetCode = \"AB12\""));
}

#[tokio::test]
async fn test_keywords_are_scoped_to_team() {
    let server = MockServer::start().await;
    let (env, _) = create_test_env(&server);

    let plan = env.api.plan("t2", "serial:AB12").await.unwrap();
    assert_eq!(plan.query.q.as_deref(), Some("serial:AB12"));
    assert_eq!(plan.query.filter, None);
}

#[tokio::test]
async fn test_rebuild_updates_every_team_index() {
    let server = MockServer::start().await;
    let (env, _) = create_test_env(&server);

    // A failed task must not block the rebuild.
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{
                "uid": 1,
                "indexUid": "t1-assets",
                "status": "failed",
                "type": "settingsUpdate",
                "enqueuedAt": "2024-05-01T08:00:00Z",
                "error": {"message": "Invalid filterable attribute"}
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path_regex(r"^/indexes/t1-(assets|asset-types|tags)/settings$"))
        .and(body_json(serde_json::json!({
            "filterableAttributes": ["kind", "assetTypeId", "tagIds", "createdAt", "updatedAt", "serial"]
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({
            "taskUid": 2,
            "indexUid": "t1-assets",
            "status": "enqueued",
            "type": "settingsUpdate",
            "enqueuedAt": "2024-05-01T08:01:00Z"
        })))
        .expect(3)
        .mount(&server)
        .await;

    let tasks = env.api.list_tasks("t1").await.unwrap();
    assert_eq!(tasks[0].status, TaskStatus::Failed);

    let summaries = env.api.rebuild_indexes("t1").await.unwrap();
    assert_eq!(summaries.len(), 3);
    assert!(summaries.iter().all(|s| s.status == TaskStatus::Enqueued));
}

#[tokio::test]
async fn test_unreachable_service_is_an_error_not_empty_results() {
    let dir = TempDir::new().unwrap();
    let config = IndexServiceConfig::new("http://127.0.0.1:1")
        .unwrap()
        .with_timeout(Duration::from_millis(500))
        .with_retry(RetryConfig::none());
    let api = StockroomApi::builder(config)
        .catalog_path(dir.path().join("catalog.db"))
        .build()
        .unwrap();

    let err = api.search("t1", "chair", 10).await.unwrap_err();
    assert!(err.is_unavailable());

    let err = api.list_tasks("t1").await.unwrap_err();
    assert!(err.is_unavailable());
}
