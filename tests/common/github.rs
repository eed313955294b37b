//! In-process stand-in for the GitHub Contents API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct PutRecord {
    pub path: String,
    pub sha: Option<String>,
    pub branch: String,
    pub message: String,
    pub authorization: Option<String>,
    pub content: Vec<u8>,
}

#[derive(Clone, Default)]
pub struct MockGitHub {
    files: Arc<Mutex<HashMap<String, (String, Vec<u8>)>>>,
    puts: Arc<Mutex<Vec<PutRecord>>>,
    counter: Arc<Mutex<u32>>,
    read_delay: Arc<Mutex<Option<Duration>>>,
}

impl MockGitHub {
    pub fn insert(&self, path: &str, content: &[u8]) {
        let sha = self.next_sha();
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), (sha, content.to_vec()));
    }

    pub fn file_json(&self, path: &str) -> Option<Value> {
        let files = self.files.lock().unwrap();
        files
            .get(path)
            .map(|(_, bytes)| serde_json::from_slice(bytes).unwrap())
    }

    pub fn sha(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).map(|(sha, _)| sha.clone())
    }

    /// Hold every GET for `delay` before answering.
    pub fn delay_reads(&self, delay: Duration) {
        *self.read_delay.lock().unwrap() = Some(delay);
    }

    pub fn puts(&self) -> Vec<PutRecord> {
        self.puts.lock().unwrap().clone()
    }

    fn next_sha(&self) -> String {
        let mut counter = self.counter.lock().unwrap();
        *counter += 1;
        format!("sha{}", *counter)
    }

    /// Serve on an ephemeral port and return the API base URL.
    pub async fn start(&self) -> String {
        let app = Router::new()
            .route(
                "/repos/{owner}/{repo}/contents/{*path}",
                get(get_file).put(put_file),
            )
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://127.0.0.1:{port}")
    }
}

async fn get_file(
    State(mock): State<MockGitHub>,
    Path((_owner, _repo, path)): Path<(String, String, String)>,
) -> Response {
    let delay = *mock.read_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let files = mock.files.lock().unwrap();
    match files.get(&path) {
        Some((sha, bytes)) => {
            // GitHub wraps base64 at 60 columns.
            let encoded = STANDARD.encode(bytes);
            let wrapped: Vec<&str> = encoded
                .as_bytes()
                .chunks(60)
                .map(|c| std::str::from_utf8(c).unwrap())
                .collect();
            Json(json!({ "sha": sha, "content": wrapped.join("\n") })).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "Not Found" }))).into_response(),
    }
}

async fn put_file(
    State(mock): State<MockGitHub>,
    Path((_owner, _repo, path)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let sha = body["sha"].as_str().map(str::to_string);
    let current = mock.sha(&path);
    if current.is_some() && current != sha {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "message": "sha does not match" })),
        )
            .into_response();
    }

    let content = STANDARD
        .decode(body["content"].as_str().unwrap_or_default())
        .unwrap();
    mock.puts.lock().unwrap().push(PutRecord {
        path: path.clone(),
        sha,
        branch: body["branch"].as_str().unwrap_or_default().to_string(),
        message: body["message"].as_str().unwrap_or_default().to_string(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        content: content.clone(),
    });
    mock.insert(&path, &content);

    (StatusCode::CREATED, Json(json!({ "content": { "path": path } }))).into_response()
}
