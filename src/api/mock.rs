//! In-process stand-in for both Voiceflow endpoints, used by tests.
//!
//! Interact replies are scripted in order; once the script runs out the
//! runtime answers `[]`. The transcripts endpoint always answers with the
//! configured status.

use crate::config::Config;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One recorded call to the interact endpoint.
#[derive(Debug, Clone)]
pub struct RecordedInteract {
    pub user_id: String,
    pub authorization: Option<String>,
    pub version_id: Option<String>,
    pub body: Value,
}

impl RecordedInteract {
    /// The inner `request` object that was sent.
    pub fn request(&self) -> &Value {
        &self.body["request"]
    }
}

struct Inner {
    replies: VecDeque<(u16, Value)>,
    transcript_status: u16,
    interactions: Vec<RecordedInteract>,
    transcripts: Vec<Value>,
}

type Shared = Arc<Mutex<Inner>>;

pub struct MockVoiceflow {
    pub base_url: String,
    state: Shared,
    handle: JoinHandle<()>,
}

impl MockVoiceflow {
    /// Bind an ephemeral port and start serving.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(Inner {
            replies: VecDeque::new(),
            transcript_status: 200,
            interactions: Vec::new(),
            transcripts: Vec::new(),
        }));

        let app = Router::new()
            .route("/state/user/{user_id}/interact", post(interact))
            .route("/v2/transcripts", put(save_transcript))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    /// Queue the next interact reply.
    pub fn reply(&self, status: u16, body: Value) {
        self.state.lock().unwrap().replies.push_back((status, body));
    }

    pub fn set_transcript_status(&self, status: u16) {
        self.state.lock().unwrap().transcript_status = status;
    }

    pub fn interactions(&self) -> Vec<RecordedInteract> {
        self.state.lock().unwrap().interactions.clone()
    }

    pub fn transcripts(&self) -> Vec<Value> {
        self.state.lock().unwrap().transcripts.clone()
    }

    pub fn transcripts_url(&self) -> String {
        format!("{}/v2/transcripts", self.base_url)
    }

    /// A fully valid config pointed at this server.
    pub fn config(&self) -> Config {
        Config {
            api_key: Some("VF.DM.test.key".to_string()),
            project_id: Some("proj-1".to_string()),
            version_id: Some("ver-1".to_string()),
            runtime_url: self.base_url.clone(),
            transcripts_url: self.transcripts_url(),
            timeout_secs: 5,
            ..Config::default()
        }
    }
}

impl Drop for MockVoiceflow {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn interact(
    State(state): State<Shared>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut inner = state.lock().unwrap();
    inner.interactions.push(RecordedInteract {
        user_id,
        authorization: header(&headers, "authorization"),
        version_id: header(&headers, "versionid"),
        body,
    });
    let (status, body) = inner.replies.pop_front().unwrap_or((200, json!([])));
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(body),
    )
}

async fn save_transcript(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut inner = state.lock().unwrap();
    inner.transcripts.push(body);
    let status = StatusCode::from_u16(inner.transcript_status)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"status": status.as_u16()})))
}
