//! Scripted HTTP server for the REST clients
//!
//! Responses are served in order; the last one repeats once the script
//! runs dry. Every request is recorded with its method, path and query,
//! `Authorization` header and body.

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// One request seen by [`StubServer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    /// Path including the query string
    pub target: String,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Clone, Default)]
struct StubState {
    responses: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubState {
    fn next_response(&self) -> (StatusCode, String) {
        let mut responses = self.responses.lock().unwrap();
        let next = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        next.unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, String::new()))
    }
}

/// Local HTTP server answering every path with the scripted responses
pub struct StubServer {
    pub base_url: String,
    state: StubState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl StubServer {
    /// Bind `127.0.0.1:0` and serve `responses` as `(status, JSON body)` pairs
    pub async fn start(responses: Vec<(u16, &str)>) -> Self {
        let state = StubState::default();
        {
            let mut script = state.responses.lock().unwrap();
            for (status, body) in responses {
                let status = StatusCode::from_u16(status).expect("valid status code");
                script.push_back((status, body.to_string()));
            }
        }

        let app = Router::new().fallback(respond).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub server");
        let addr = listener.local_addr().expect("stub server address");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn respond(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        target,
        authorization,
        body,
    });

    let (status, body) = state.next_response();
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}
