//! End-to-end tests for the task REST API.
//! Spins up the server on a random port and drives it with reqwest.

use std::sync::Arc;
use tempfile::TempDir;
use todod::{config::ServerConfig, rest, store::TaskStore, AppContext};

/// Start the REST server on an ephemeral port; returns its base URL.
async fn spawn_server(dir: &TempDir) -> String {
    let config = Arc::new(ServerConfig::new(
        None,
        Some(dir.path().to_path_buf()),
        Some("error".to_string()),
        None,
    ));
    let store = Arc::new(TaskStore::new(dir.path()).await.unwrap());
    let ctx = Arc::new(AppContext {
        config,
        store,
        started_at: std::time::Instant::now(),
    });

    let router = rest::build_router(ctx);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn create_list_delete_scenario() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    // POST {title, content} → bare id in the body
    let resp = client
        .post(format!("{base}/api/task"))
        .json(&serde_json::json!({ "title": "Buy milk", "content": "2%" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let id = resp.text().await.unwrap();
    assert!(!id.is_empty());

    // GET lists the new task with matching fields
    let resp = client.get(format!("{base}/api/tasks")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let tasks: Vec<serde_json::Value> = resp.json().await.unwrap();
    let found = tasks
        .iter()
        .find(|t| t["id"] == id.as_str())
        .expect("created task in list");
    assert_eq!(found["title"], "Buy milk");
    assert_eq!(found["content"], "2%");

    // DELETE ?taskID=<id> → plain-text confirmation
    let resp = client
        .delete(format!("{base}/api/task"))
        .query(&[("taskID", id.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "Task Deleted");

    // Task no longer listed
    let tasks: Vec<serde_json::Value> = client
        .get(format!("{base}/api/tasks"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(tasks.iter().all(|t| t["id"] != id.as_str()));
}

#[tokio::test]
async fn empty_list_is_a_json_array() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;

    let resp = reqwest::get(format!("{base}/api/tasks")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "[]");
}

#[tokio::test]
async fn empty_or_missing_fields_answer_the_fixed_500() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    for body in [
        serde_json::json!({ "title": "", "content": "x" }),
        serde_json::json!({ "title": "x", "content": "" }),
        serde_json::json!({ "content": "x" }),
        serde_json::json!({}),
    ] {
        let resp = client
            .post(format!("{base}/api/task"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 500, "body {body}");
        assert_eq!(resp.text().await.unwrap(), "Couldn't add task");
    }
}

#[tokio::test]
async fn malformed_or_missing_task_id_answers_the_fixed_500() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    let resp = client
        .delete(format!("{base}/api/task"))
        .query(&[("taskID", "not-a-uuid")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    assert_eq!(resp.text().await.unwrap(), "Couldn't delete task");

    // No taskID param at all
    let resp = client
        .delete(format!("{base}/api/task"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    assert_eq!(resp.text().await.unwrap(), "Couldn't delete task");
}

#[tokio::test]
async fn deleting_an_absent_id_still_confirms() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;
    let client = reqwest::Client::new();

    let absent = uuid::Uuid::new_v4().to_string();
    let resp = client
        .delete(format!("{base}/api/task"))
        .query(&[("taskID", absent.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "Task Deleted");
}

#[tokio::test]
async fn health_endpoint_response_fields() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir).await;

    let resp = reqwest::get(format!("{base}/api/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptime_secs"].is_u64());
}
