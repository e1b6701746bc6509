//! Tests for the query client and submission flow against a local stand-in
//! for the knowledge service.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use knowledge_bot_core::*;
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Recorder {
    hits: Arc<AtomicUsize>,
    last_body: Arc<Mutex<Option<Value>>>,
    last_content_type: Arc<Mutex<Option<String>>>,
}

/// Serve `reply` on POST /query and return the base URL plus the recorder.
async fn spawn_service<F>(reply: F) -> (String, Recorder)
where
    F: Fn() -> Response + Clone + Send + Sync + 'static,
{
    let recorder = Recorder::default();

    let app = Router::new()
        .route(
            "/query",
            post(
                move |State(rec): State<Recorder>, headers: HeaderMap, Json(body): Json<Value>| {
                    let reply = reply.clone();
                    async move {
                        rec.hits.fetch_add(1, Ordering::SeqCst);
                        *rec.last_body.lock().unwrap() = Some(body);
                        *rec.last_content_type.lock().unwrap() = headers
                            .get("content-type")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        reply()
                    }
                },
            ),
        )
        .with_state(recorder.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), recorder)
}

// -- Query client ----------------------------------------------------------

#[tokio::test]
async fn test_query_posts_json_and_returns_answer() {
    let (base_url, rec) = spawn_service(|| {
        Json(json!({"answer": "Paris", "sources": [{"title": "doc1"}]})).into_response()
    })
    .await;

    let client = QueryClient::new(Some(&base_url));
    let response = client.query("Capital of France?").await.unwrap();

    assert_eq!(response.answer, "Paris");
    assert_eq!(response.sources, vec![Source(json!({"title": "doc1"}))]);
    assert_eq!(rec.hits.load(Ordering::SeqCst), 1);
    assert_eq!(
        rec.last_body.lock().unwrap().clone(),
        Some(json!({"query": "Capital of France?"}))
    );
    assert_eq!(
        rec.last_content_type.lock().unwrap().as_deref(),
        Some("application/json")
    );
}

#[tokio::test]
async fn test_trailing_slash_base_url_hits_query_route() {
    let (base_url, rec) =
        spawn_service(|| Json(json!({"answer": "ok", "sources": []})).into_response()).await;

    let client = QueryClient::new(Some(&format!("{}/", base_url)));
    assert_eq!(client.query("ping").await.unwrap().answer, "ok");
    assert_eq!(rec.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_error_status_carries_parsed_body() {
    let (base_url, rec) = spawn_service(|| {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"msg": "boom"}))).into_response()
    })
    .await;

    let client = QueryClient::new(Some(&base_url));
    let err = client.query("hello").await.unwrap_err();

    match err {
        QueryError::Remote { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, json!({"msg": "boom"}));
        }
        other => panic!("expected Remote error, got {other:?}"),
    }
    // Exactly one attempt, no retry
    assert_eq!(rec.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unreadable_error_body_is_its_own_error() {
    let (base_url, _rec) =
        spawn_service(|| (StatusCode::BAD_GATEWAY, "upstream down").into_response()).await;

    let client = QueryClient::new(Some(&base_url));
    let err = client.query("hello").await.unwrap_err();

    assert!(matches!(err, QueryError::MalformedErrorBody { status: 502, .. }));
    assert_eq!(err.status(), Some(502));
}

#[tokio::test]
async fn test_malformed_success_body_is_decode_error() {
    let (base_url, _rec) =
        spawn_service(|| Json(json!({"answer": 5})).into_response()).await;

    let client = QueryClient::new(Some(&base_url));
    let err = client.query("hello").await.unwrap_err();

    assert!(matches!(err, QueryError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = QueryClient::new(Some(&format!("http://{}", addr)));
    let err = client.query("hello").await.unwrap_err();

    assert!(matches!(err, QueryError::Transport(_)));
}

// -- Submission flow -------------------------------------------------------

#[tokio::test]
async fn test_submit_resolves_placeholder_with_answer() {
    let (base_url, _rec) = spawn_service(|| {
        Json(json!({"answer": "Paris", "sources": [{"title": "doc1"}]})).into_response()
    })
    .await;
    let client = QueryClient::new(Some(&base_url));
    let mut conv = Conversation::new();

    let turn = submit_new_message(&mut conv, &client, "  Capital of France?  ")
        .await
        .unwrap();

    assert_eq!(turn.index(), 1);
    assert_eq!(conv.messages()[0], ChatMessage::user("Capital of France?"));
    assert_eq!(
        conv.last().unwrap(),
        &ChatMessage::assistant("Paris", vec![Source(json!({"title": "doc1"}))])
    );
    assert!(!conv.is_busy());
}

#[tokio::test]
async fn test_submit_server_error_becomes_error_turn() {
    let (base_url, _rec) = spawn_service(|| {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"msg": "boom"}))).into_response()
    })
    .await;
    let client = QueryClient::new(Some(&base_url));
    let mut conv = Conversation::new();

    submit_new_message(&mut conv, &client, "hello").await.unwrap();

    let last = conv.last().unwrap();
    assert_eq!(last, &ChatMessage::failed());
    assert_eq!(last.content, ERROR_MESSAGE);
    assert!(last.error);
    assert!(!last.loading);
    assert!(last.sources.is_empty());
}

#[tokio::test]
async fn test_submit_unreadable_error_body_becomes_error_turn() {
    let (base_url, _rec) =
        spawn_service(|| (StatusCode::SERVICE_UNAVAILABLE, "<html>down</html>").into_response())
            .await;
    let client = QueryClient::new(Some(&base_url));
    let mut conv = Conversation::new();

    submit_new_message(&mut conv, &client, "hello").await.unwrap();

    assert!(conv.last().unwrap().error);
}

#[tokio::test]
async fn test_conversation_grows_across_submissions() {
    let (base_url, rec) =
        spawn_service(|| Json(json!({"answer": "ok", "sources": []})).into_response()).await;
    let client = QueryClient::new(Some(&base_url));
    let mut conv = Conversation::new();

    submit_new_message(&mut conv, &client, "one").await.unwrap();
    submit_new_message(&mut conv, &client, "two").await.unwrap();

    assert_eq!(conv.len(), 4);
    assert_eq!(conv.messages()[2].content, "two");
    assert_eq!(rec.hits.load(Ordering::SeqCst), 2);
}
