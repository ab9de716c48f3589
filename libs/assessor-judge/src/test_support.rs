// In-process Judge0 stand-in for tests

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub fn encode(s: &str) -> String {
    general_purpose::STANDARD.encode(s)
}

/// Status response body with base64 payloads, like the real backend returns
pub fn status_body(id: u32, description: &str, stdout: &str, stderr: &str, compile: &str) -> Value {
    let opt = |s: &str| if s.is_empty() { Value::Null } else { json!(encode(s)) };
    json!({
        "stdout": opt(stdout),
        "stderr": opt(stderr),
        "compile_output": opt(compile),
        "message": null,
        "status_id": id,
        "status": { "id": id, "description": description },
        "time": if id == 3 { json!("0.004") } else { Value::Null },
    })
}

pub struct MockState {
    pub submit_status: StatusCode,
    pub poll_status: StatusCode,
    pub responses: VecDeque<Value>,
    pub last_response: Value,
    pub submissions: Vec<Value>,
    pub submit_query: HashMap<String, String>,
    pub api_keys: Vec<String>,
    pub polls: usize,
}

type Shared = Arc<Mutex<MockState>>;

async fn submit_handler(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    if let Some(key) = headers.get("x-rapidapi-key").and_then(|v| v.to_str().ok()) {
        state.api_keys.push(key.to_string());
    }
    state.submit_query = query;
    if state.submit_status != StatusCode::CREATED {
        return (state.submit_status, Json(json!({ "message": "rejected" })));
    }
    state.submissions.push(body);
    let token = format!("token-{}", state.submissions.len());
    (StatusCode::CREATED, Json(json!({ "token": token })))
}

async fn status_handler(
    State(state): State<Shared>,
    Path(_token): Path<String>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    state.polls += 1;
    if state.poll_status != StatusCode::OK {
        return (state.poll_status, Json(json!({ "error": "upstream" })));
    }
    if let Some(next) = state.responses.pop_front() {
        state.last_response = next;
    }
    (StatusCode::OK, Json(state.last_response.clone()))
}

pub struct MockJudge {
    pub addr: SocketAddr,
    pub state: Shared,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockJudge {
    /// Serve the given poll responses in order; the last one repeats
    pub async fn start(responses: Vec<Value>) -> Self {
        let state = Arc::new(Mutex::new(MockState {
            submit_status: StatusCode::CREATED,
            poll_status: StatusCode::OK,
            responses: VecDeque::from(responses),
            last_response: status_body(1, "In Queue", "", "", ""),
            submissions: Vec::new(),
            submit_query: HashMap::new(),
            api_keys: Vec::new(),
            polls: 0,
        }));

        let app = Router::new()
            .route("/submissions", post(submit_handler))
            .route("/submissions/:token", get(status_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown: Some(tx),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn submissions(&self) -> usize {
        self.state.lock().unwrap().submissions.len()
    }
}

impl Drop for MockJudge {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
