//! HTTP tests against a bound router backed by a temporary SQLite queue.

use std::sync::Arc;

use descry_api::{router, AppState};
use descry_db::Database;
use descry_jobs::{HttpNotifier, QueueService};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestServer {
    base_url: String,
    receiver: MockServer,
    db: Database,
    _dir: TempDir,
}

async fn spawn_test_server() -> TestServer {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", dir.path().join("queue.db").display());
    let db = Database::connect(&url).await.unwrap();
    db.migrate().await.unwrap();

    let receiver = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&receiver)
        .await;

    let service = QueueService::new(
        Arc::new(db.queue.clone()),
        Arc::new(HttpNotifier::new(format!("{}/image_cores/", receiver.uri()))),
    );
    let app = router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        receiver,
        db,
        _dir: dir,
    }
}

async fn status_bodies(receiver: &MockServer) -> Vec<Value> {
    receiver
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path().ends_with("status_receiver"))
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn test_root_says_hello() {
    let server = spawn_test_server().await;
    let body: Value = reqwest::get(format!("{}/", server.base_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"status": "HELLO WORLD"}));
}

#[tokio::test]
async fn test_health_reports_queue_length() {
    let server = spawn_test_server().await;
    let resp = reqwest::get(format!("{}/health", server.base_url))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["queue_length"], 0);
}

#[tokio::test]
async fn test_add_job_enqueues_and_reports_queued() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/add_job", server.base_url))
        .json(&json!({"correlation_id": 7, "input_path": "/memes/cat.png", "model": "test"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"status": "Job added to queue"}));

    let body: Value = client
        .get(format!("{}/check_queue", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"queue_length": 1}));

    assert_eq!(
        status_bodies(&server.receiver).await,
        vec![json!({"data": {"correlation_id": 7, "status": 1}})]
    );
}

#[tokio::test]
async fn test_add_job_defaults_model() {
    use descry_core::JobQueue;

    let server = spawn_test_server().await;
    reqwest::Client::new()
        .post(format!("{}/add_job", server.base_url))
        .json(&json!({"correlation_id": 1, "input_path": "a.png"}))
        .send()
        .await
        .unwrap();

    let lease = server.db.queue.acquire().await;
    let job = server.db.queue.peek_oldest(&lease).await.unwrap().unwrap();
    assert_eq!(job.model_selector, "Florence-2-base");
}

#[tokio::test]
async fn test_add_job_rejects_unknown_model() {
    let server = spawn_test_server().await;
    let resp = reqwest::Client::new()
        .post(format!("{}/add_job", server.base_url))
        .json(&json!({"correlation_id": 1, "input_path": "a.png", "model": "invalid-model-name"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Florence-2-base"));

    assert!(status_bodies(&server.receiver).await.is_empty());
}

#[tokio::test]
async fn test_add_job_rejects_missing_fields() {
    let server = spawn_test_server().await;
    let resp = reqwest::Client::new()
        .post(format!("{}/add_job", server.base_url))
        .json(&json!({"input_path": "a.png"}))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn test_remove_job_reports_existence_through_status() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/add_job", server.base_url))
        .json(&json!({"correlation_id": 42, "input_path": "a.png", "model": "test"}))
        .send()
        .await
        .unwrap();

    for id in [42, 999] {
        let resp = client
            .delete(format!("{}/remove_job/{}", server.base_url, id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"status": "Job removed from queue"}));
    }

    assert_eq!(
        status_bodies(&server.receiver).await,
        vec![
            json!({"data": {"correlation_id": 42, "status": 1}}),
            json!({"data": {"correlation_id": 42, "status": 0}}),
            json!({"data": {"correlation_id": 999, "status": 3}}),
        ]
    );
}

#[tokio::test]
async fn test_store_failure_is_500_with_error_body() {
    let server = spawn_test_server().await;
    server.db.pool.close().await;

    let resp = reqwest::get(format!("{}/check_queue", server.base_url))
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_unreachable_receiver_does_not_fail_requests() {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", dir.path().join("queue.db").display());
    let db = Database::connect(&url).await.unwrap();
    db.migrate().await.unwrap();

    let service = QueueService::new(
        Arc::new(db.queue.clone()),
        Arc::new(HttpNotifier::new("http://127.0.0.1:1/")),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(AppState::new(service))).await.unwrap();
    });

    let resp = reqwest::Client::new()
        .post(format!("http://{}/add_job", addr))
        .json(&json!({"correlation_id": 5, "input_path": "a.png", "model": "moondream2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_enqueue_posts_exact_status_body() {
    let server = spawn_test_server().await;
    Mock::given(method("POST"))
        .and(path("/image_cores/status_receiver"))
        .and(body_json(json!({"data": {"correlation_id": 3, "status": 1}})))
        .respond_with(ResponseTemplate::new(200))
        .with_priority(1)
        .expect(1)
        .mount(&server.receiver)
        .await;

    reqwest::Client::new()
        .post(format!("{}/add_job", server.base_url))
        .json(&json!({"correlation_id": 3, "input_path": "a.png", "model": "SmolVLM-256M-Instruct"}))
        .send()
        .await
        .unwrap();
}
