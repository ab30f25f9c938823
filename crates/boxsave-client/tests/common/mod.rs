//! In-process box server used by the integration tests

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use boxsave_client::UiObserver;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A request the box server received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub body: Bytes,
}

/// Canned responses for the box server
#[derive(Clone)]
pub struct Behavior {
    pub ping_status: StatusCode,
    pub upload_status: StatusCode,
    pub listing_status: StatusCode,
    pub listing_body: String,
    pub failing_deletes: HashSet<String>,
    /// Throttle request bodies to this many bytes per second
    pub read_rate: Option<u64>,
    /// Wait this long after reading an upload before responding
    pub respond_delay: Option<Duration>,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            ping_status: StatusCode::OK,
            upload_status: StatusCode::OK,
            listing_status: StatusCode::OK,
            listing_body: r#"{"versions":[]}"#.to_string(),
            failing_deletes: HashSet::new(),
            read_rate: None,
            respond_delay: None,
        }
    }
}

impl Behavior {
    pub fn with_versions(versions: &[&str]) -> Self {
        let records: Vec<String> = versions
            .iter()
            .map(|v| format!(r#"{{"version":"{}"}}"#, v))
            .collect();
        Self {
            listing_body: format!(r#"{{"versions":[{}]}}"#, records.join(",")),
            ..Default::default()
        }
    }
}

#[derive(Clone)]
struct ServerState {
    behavior: Behavior,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

/// Handle to a running box server
pub struct TestServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl TestServer {
    pub async fn start(behavior: Behavior) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = ServerState {
            behavior,
            requests: requests.clone(),
        };

        let app = Router::new()
            .fallback(handle)
            .with_state(state)
            .layer(DefaultBodyLimit::disable());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, requests }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_with(&self, method: Method) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }
}

async fn read_body(body: Body, read_rate: Option<u64>) -> Bytes {
    let mut stream = body.into_data_stream();
    let mut data = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.unwrap();
        data.extend_from_slice(&chunk);
        if let Some(rate) = read_rate {
            tokio::time::sleep(Duration::from_secs_f64(chunk.len() as f64 / rate as f64)).await;
        }
    }
    Bytes::from(data)
}

async fn handle(State(state): State<ServerState>, method: Method, uri: Uri, body: Body) -> Response {
    let path = uri.path().to_string();
    let body = read_body(body, state.behavior.read_rate).await;
    if let Some(delay) = state.behavior.respond_delay
        && method == Method::POST
    {
        tokio::time::sleep(delay).await;
    }

    state.requests.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        body,
    });

    let behavior = &state.behavior;
    match method {
        Method::OPTIONS => behavior.ping_status.into_response(),
        Method::POST => behavior.upload_status.into_response(),
        Method::GET => (behavior.listing_status, behavior.listing_body.clone()).into_response(),
        Method::DELETE => {
            let version = path.rsplit('/').next().unwrap_or_default();
            if behavior.failing_deletes.contains(version) {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            } else {
                StatusCode::OK.into_response()
            }
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

/// Something the UI was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Info(String),
    Clear,
    Progress(u64, u64),
}

#[derive(Default)]
pub struct RecordingUi {
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingUi {
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn progress(&self) -> Vec<(u64, u64)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Progress(sent, total) => Some((sent, total)),
                _ => None,
            })
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Info(message) => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl UiObserver for RecordingUi {
    fn info(&self, message: &str) {
        self.events.lock().unwrap().push(UiEvent::Info(message.to_string()));
    }

    fn clear_line(&self) {
        self.events.lock().unwrap().push(UiEvent::Clear);
    }

    fn report_progress(&self, sent: u64, total: u64) {
        self.events.lock().unwrap().push(UiEvent::Progress(sent, total));
    }
}
