//! Mock tracker feed
//!
//! Serves the notifications endpoint on a random local port. Responses are
//! scripted per tracker token, and every request is recorded so tests can
//! check the headers and query the client sent.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tracker_rewards::feed::{NOTIFICATIONS_PATH, TOKEN_HEADER};

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: StatusCode,
    pub body: String,
}

impl MockResponse {
    /// A successful response with one notification per action, padded with
    /// the extra fields the real feed sends.
    pub fn actions(actions: &[&str]) -> Self {
        let records: Vec<serde_json::Value> = actions
            .iter()
            .enumerate()
            .map(|(i, action)| {
                serde_json::json!({
                    "kind": "notification",
                    "id": i + 1,
                    "action": action,
                    "message": format!("Someone performed {}", action),
                    "created_at": "2023-11-14T22:15:00Z",
                })
            })
            .collect();
        Self {
            status: StatusCode::OK,
            body: serde_json::Value::Array(records).to_string(),
        }
    }

    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            body: r#"{"code":"server_error","kind":"error"}"#.to_string(),
        }
    }

    pub fn raw(body: &str) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub token: Option<String>,
    pub created_after: Option<String>,
}

#[derive(Default)]
struct FeedState {
    responses: Mutex<HashMap<String, MockResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Mock feed instance. When dropped, the server shuts down.
pub struct MockFeedServer {
    /// Base URL for the feed client (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    state: Arc<FeedState>,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl MockFeedServer {
    /// Spawns a new mock feed on a random port
    ///
    /// # Panics
    ///
    /// Panics if the port cannot be bound.
    pub async fn spawn() -> Self {
        let state = Arc::new(FeedState::default());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let app = Router::new()
            .route(NOTIFICATIONS_PATH, get(notifications))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Mock feed failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Scripts the response for every request carrying `token`.
    pub fn respond(&self, token: &str, response: MockResponse) {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(token.to_string(), response);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, token: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.token.as_deref() == Some(token))
            .collect()
    }
}

async fn notifications(
    State(state): State<Arc<FeedState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let token = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    state.requests.lock().unwrap().push(RecordedRequest {
        token: token.clone(),
        created_after: query.get("created_after").cloned(),
    });

    // Tokens without a scripted response are rejected like invalid credentials
    let response = token
        .and_then(|t| state.responses.lock().unwrap().get(&t).cloned())
        .unwrap_or_else(|| MockResponse {
            status: StatusCode::FORBIDDEN,
            body: r#"{"code":"invalid_authentication","kind":"error"}"#.to_string(),
        });

    (
        response.status,
        [(header::CONTENT_TYPE, "application/json")],
        response.body,
    )
        .into_response()
}
