//! Integration tests for the Gemini client and session.
//!
//! These tests start a fake `generateContent` endpoint on a random port and
//! point a real [`GeminiClient`] at it.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::post;
use promptpad::prelude::*;

/// A request captured by the fake server: the `key` query parameter and the
/// JSON body.
type Seen = (Option<String>, serde_json::Value);

#[derive(Clone)]
struct FakeGemini {
    replies: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
    seen: Arc<Mutex<Vec<Seen>>>,
    delay: Duration,
}

async fn handle(
    State(fake): State<FakeGemini>,
    Query(query): Query<HashMap<String, String>>,
    body: String,
) -> (StatusCode, String) {
    tokio::time::sleep(fake.delay).await;
    let json = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
    fake.seen
        .lock()
        .unwrap()
        .push((query.get("key").cloned(), json));
    fake.replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, String::new()))
}

/// Helper: spawn a fake endpoint that answers with `replies` in order.
async fn spawn_fake(
    replies: Vec<(StatusCode, &str)>,
    delay: Duration,
) -> (String, Arc<Mutex<Vec<Seen>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let fake = FakeGemini {
        replies: Arc::new(Mutex::new(
            replies
                .into_iter()
                .map(|(status, body)| (status, body.to_string()))
                .collect(),
        )),
        seen: seen.clone(),
        delay,
    };
    let router = Router::new()
        .route("/v1beta/generate", post(handle))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{addr}/v1beta/generate"), seen)
}

fn client_for(endpoint: &str) -> GeminiClient {
    GeminiClient::new(
        GenerationConfig::default()
            .with_endpoint(endpoint)
            .with_api_key("test-key"),
    )
    .unwrap()
}

const HI_THERE: &str = r#"{"candidates":[{"content":{"parts":[{"text":"Hi there"}]}}]}"#;

// ── Client ───────────────────────────────────────────────────────────

#[tokio::test]
async fn well_formed_reply_returns_text() {
    let (endpoint, seen) = spawn_fake(vec![(StatusCode::OK, HI_THERE)], Duration::ZERO).await;
    let client = client_for(&endpoint);

    let result = client.send("Summarize: hello world").await;
    assert_eq!(result, Ok("Hi there".to_string()));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0.as_deref(), Some("test-key"));
    assert_eq!(
        seen[0].1,
        serde_json::json!({
            "contents": [{"role": "user", "parts": [{"text": "Summarize: hello world"}]}]
        })
    );
}

#[tokio::test]
async fn empty_candidates_is_malformed() {
    let (endpoint, _) = spawn_fake(
        vec![(StatusCode::OK, r#"{"candidates":[]}"#)],
        Duration::ZERO,
    )
    .await;

    let result = client_for(&endpoint).send("hello").await;
    assert_eq!(result, Err(GenerationFailure::MalformedResponse));
}

#[tokio::test]
async fn api_error_status_with_json_body_is_malformed() {
    let (endpoint, _) = spawn_fake(
        vec![(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#,
        )],
        Duration::ZERO,
    )
    .await;

    let result = client_for(&endpoint).send("hello").await;
    assert_eq!(result, Err(GenerationFailure::MalformedResponse));
}

#[tokio::test]
async fn non_json_body_is_transport_error() {
    let (endpoint, _) = spawn_fake(
        vec![(StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>")],
        Duration::ZERO,
    )
    .await;

    let result = client_for(&endpoint).send("hello").await;
    assert_eq!(result, Err(GenerationFailure::TransportError));
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    // Bind and immediately release a port so nothing is listening on it.
    let addr: SocketAddr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let result = client_for(&format!("http://{addr}/generate"))
        .send("hello")
        .await;
    assert_eq!(result, Err(GenerationFailure::TransportError));
}

#[tokio::test]
async fn timeout_is_transport_error() {
    let (endpoint, _) = spawn_fake(
        vec![(StatusCode::OK, HI_THERE)],
        Duration::from_secs(5),
    )
    .await;
    let client = GeminiClient::new(
        GenerationConfig::default()
            .with_endpoint(&endpoint)
            .with_timeout(Duration::from_millis(100)),
    )
    .unwrap();

    let result = client.send("hello").await;
    assert_eq!(result, Err(GenerationFailure::TransportError));
}

// ── Session over HTTP ────────────────────────────────────────────────

#[tokio::test]
async fn session_generate_then_regenerate() {
    let (endpoint, seen) = spawn_fake(
        vec![
            (StatusCode::OK, HI_THERE),
            (
                StatusCode::OK,
                r#"{"candidates":[{"content":{"parts":[{"text":"Hello again"}]}}]}"#,
            ),
        ],
        Duration::ZERO,
    )
    .await;
    let session = Session::new(client_for(&endpoint));
    session.set_mode(Mode::Custom);

    let first = session
        .generate("hello world", &Selection::custom("Summarize: {{text}}"))
        .await;
    assert_eq!(first, Ok("Hi there".to_string()));
    assert_eq!(session.snapshot().output.as_deref(), Some("Hi there"));
    assert!(session.snapshot().can_regenerate);

    let second = session.regenerate("hello world").await;
    assert_eq!(second, Ok("Hello again".to_string()));

    let seen = seen.lock().unwrap();
    let prompts: Vec<&str> = seen
        .iter()
        .map(|(_, body)| body["contents"][0]["parts"][0]["text"].as_str().unwrap())
        .collect();
    assert_eq!(prompts, vec!["Summarize: hello world", "Summarize: hello world"]);
}

#[tokio::test]
async fn session_failure_after_success_clears_output() {
    let (endpoint, _) = spawn_fake(
        vec![(StatusCode::OK, HI_THERE), (StatusCode::OK, r#"{"candidates":[]}"#)],
        Duration::ZERO,
    )
    .await;
    let session = Session::new(client_for(&endpoint));
    let selection = Selection::preset(Preset::default());

    session.generate("hello", &selection).await.unwrap();
    let result = session.generate("hello", &selection).await;
    assert_eq!(result, Err(GenerationFailure::MalformedResponse));

    let snap = session.snapshot();
    assert!(!snap.can_regenerate);
    assert!(!snap.loading);
    assert_eq!(snap.output, None);
    assert_eq!(
        snap.error.as_deref(),
        Some("Error: No valid response from AI. Please try again.")
    );
}
