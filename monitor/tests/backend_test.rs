//! Integration tests for the HTTP task manager backend and the sync rules
//! applied on top of it.

use std::sync::Arc;

use chrono::{Duration, Utc};
use checksync_engine::{SyncAdapter, SyncError, SyncStatus, TaskBackend, TaskRef};
use checksync_monitor::backend::HttpTaskBackend;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Test Helpers
// =============================================================================

async fn mount_task(server: &MockServer, id: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/tasks/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn adapter(server: &MockServer) -> SyncAdapter {
    let backend = HttpTaskBackend::new(server.uri()).expect("client should build");
    SyncAdapter::new(Arc::new(backend))
}

// =============================================================================
// Backend
// =============================================================================

#[tokio::test]
async fn test_fetch_parses_task() {
    let server = MockServer::start().await;
    mount_task(
        &server,
        "AB12",
        json!({ "id": "AB12", "completed": false, "due": "2024-06-01T12:00:00Z" }),
    )
    .await;

    let backend = HttpTaskBackend::new(server.uri()).unwrap();
    let task = backend.fetch(&TaskRef::new("AB12")).await.unwrap();

    assert_eq!(task.id, "AB12");
    assert!(!task.completed);
    assert!(task.due.is_some());
}

#[tokio::test]
async fn test_fetch_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let backend = HttpTaskBackend::new(server.uri()).unwrap();
    let err = backend.fetch(&TaskRef::new("missing")).await.unwrap_err();

    assert!(matches!(err, SyncError::NotFound(ref r) if r.as_str() == "missing"));
}

#[tokio::test]
async fn test_server_error_carries_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tasks/T1/complete"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database locked"))
        .mount(&server)
        .await;

    let backend = HttpTaskBackend::new(server.uri()).unwrap();
    let err = backend
        .set_completed(&TaskRef::new("T1"), true)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "task manager error: 500 - database locked");
}

#[tokio::test]
async fn test_invalid_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks/T1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let backend = HttpTaskBackend::new(server.uri()).unwrap();
    let err = backend.fetch(&TaskRef::new("T1")).await.unwrap_err();

    assert!(matches!(err, SyncError::Backend(ref m) if m.contains("invalid task payload")));
}

// =============================================================================
// Sync over HTTP
// =============================================================================

#[tokio::test]
async fn test_sync_marks_task_complete() {
    let server = MockServer::start().await;
    mount_task(&server, "T1", json!({ "id": "T1", "completed": false })).await;
    Mock::given(method("POST"))
        .and(path("/tasks/T1/complete"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = adapter(&server).sync_state(&TaskRef::new("T1"), true).await;

    assert_eq!(outcome.status, SyncStatus::Updated);
    assert_eq!(outcome.message, "✅ T1 marked complete");
}

#[tokio::test]
async fn test_sync_marks_task_incomplete() {
    let server = MockServer::start().await;
    mount_task(&server, "T2", json!({ "id": "T2", "completed": true })).await;
    Mock::given(method("POST"))
        .and(path("/tasks/T2/incomplete"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = adapter(&server).sync_state(&TaskRef::new("T2"), false).await;

    assert_eq!(outcome.status, SyncStatus::Updated);
}

#[tokio::test]
async fn test_sync_no_op_issues_no_update() {
    let server = MockServer::start().await;
    mount_task(&server, "T3", json!({ "id": "T3", "completed": true })).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = adapter(&server).sync_state(&TaskRef::new("T3"), true).await;

    assert_eq!(outcome.status, SyncStatus::Unchanged);
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_sync_future_due_date_blocked() {
    let server = MockServer::start().await;
    let due = (Utc::now() + Duration::days(5)).to_rfc3339();
    mount_task(&server, "T4", json!({ "id": "T4", "completed": false, "due": due })).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = adapter(&server).sync_state(&TaskRef::new("T4"), true).await;

    assert_eq!(outcome.status, SyncStatus::Failed);
    assert!(outcome.message.contains("outside due date window"));
}

#[tokio::test]
async fn test_sync_grace_period_allows_tomorrow() {
    let server = MockServer::start().await;
    let due = (Utc::now() + Duration::hours(12)).to_rfc3339();
    mount_task(&server, "T5", json!({ "id": "T5", "completed": false, "due": due })).await;
    Mock::given(method("POST"))
        .and(path("/tasks/T5/complete"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = adapter(&server)
        .with_grace(Duration::days(1))
        .sync_state(&TaskRef::new("T5"), true)
        .await;

    assert_eq!(outcome.status, SyncStatus::Updated);
}

#[tokio::test]
async fn test_sync_missing_task_reports_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let outcome = adapter(&server).sync_state(&TaskRef::new("nope"), true).await;

    assert_eq!(outcome.status, SyncStatus::Failed);
    assert_eq!(outcome.message, "❌ nope: task not found: nope");
}
