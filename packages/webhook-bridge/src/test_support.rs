//! Test helpers: a local stand-in for a side's incoming webhook.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::post,
    Router,
};
use tokio::net::TcpListener;

/// One request received by a [`MockSide`].
#[derive(Debug, Clone)]
pub struct Captured {
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Clone)]
struct MockState {
    received: Arc<Mutex<Vec<Captured>>>,
    status: StatusCode,
    delay: Duration,
}

/// An HTTP server on `127.0.0.1` that records every POST to `/webhook`.
pub struct MockSide {
    pub url: String,
    received: Arc<Mutex<Vec<Captured>>>,
}

impl MockSide {
    /// Answers every request with 200 immediately.
    pub async fn spawn() -> Self {
        Self::spawn_with(StatusCode::OK, Duration::ZERO).await
    }

    /// Answers every request with `status` after waiting `delay`.
    pub async fn spawn_with(status: StatusCode, delay: Duration) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/webhook", post(capture))
            .with_state(MockState {
                received: received.clone(),
                status,
                delay,
            });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}/webhook"),
            received,
        }
    }

    pub fn received(&self) -> Vec<Captured> {
        self.received.lock().unwrap().clone()
    }
}

async fn capture(State(state): State<MockState>, headers: HeaderMap, body: String) -> StatusCode {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state
        .received
        .lock()
        .unwrap()
        .push(Captured { content_type, body });
    tokio::time::sleep(state.delay).await;
    state.status
}

/// A url on which nothing is listening.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/webhook")
}
