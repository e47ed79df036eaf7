//! HTTP-level tests for `HttpBackend` against a mock server.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quillgen_api::{ApiConfig, ApiError, Backend, HttpBackend};
use quillgen_auth::Credentials;
use quillgen_core::SessionId;

fn backend_for(server: &MockServer) -> HttpBackend {
    HttpBackend::new(
        ApiConfig::new(server.uri()),
        Credentials::new("tok-test", "alice"),
    )
}

#[tokio::test]
async fn list_sessions_sends_bearer_and_parses_listing() {
    let server = MockServer::start().await;
    let id = SessionId::generate();

    Mock::given(method("GET"))
        .and(path("/chat/sessions/"))
        .and(header("authorization", "Bearer tok-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "session_id": id.to_string(),
                "first_prompt": "Hello",
                "last_updated": "2024-05-01T12:00:00Z"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let sessions = backend_for(&server).list_sessions().await.unwrap();

    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].session_id, id);
    assert_eq!(sessions[0].first_prompt.as_deref(), Some("Hello"));
}

#[tokio::test]
async fn unauthorized_listing_maps_to_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/chat/sessions/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Could not validate credentials"
        })))
        .mount(&server)
        .await;

    let err = backend_for(&server).list_sessions().await.unwrap_err();
    assert!(err.is_auth());
}

#[tokio::test]
async fn session_messages_parses_transcript_rows() {
    let server = MockServer::start().await;
    let id = SessionId::generate();

    Mock::given(method("GET"))
        .and(path(format!("/chat/session/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": 1,
                "session_id": id.to_string(),
                "prompt": "Hello",
                "response": "Hi there",
                "timestamp": "2024-05-01T12:00:00"
            }
        ])))
        .mount(&server)
        .await;

    let messages = backend_for(&server).session_messages(&id).await.unwrap();

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].prompt, "Hello");
    assert_eq!(messages[0].response, "Hi there");
}

#[tokio::test]
async fn delete_session_succeeds_on_ok() {
    let server = MockServer::start().await;
    let id = SessionId::generate();

    Mock::given(method("DELETE"))
        .and(path(format!("/chat/session/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "detail": "Session deleted successfully."
        })))
        .expect(1)
        .mount(&server)
        .await;

    backend_for(&server).delete_session(&id).await.unwrap();
}

#[tokio::test]
async fn generate_streams_body_text() {
    let server = MockServer::start().await;
    let id = SessionId::generate();

    Mock::given(method("POST"))
        .and(path("/generate/"))
        .and(body_json(serde_json::json!({
            "prompt": "Hello",
            "session_id": id.to_string()
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("Hi there"))
        .expect(1)
        .mount(&server)
        .await;

    let mut stream = backend_for(&server)
        .generate("Hello", &id, CancellationToken::new())
        .await
        .unwrap();

    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        text.push_str(&chunk.unwrap());
    }
    assert_eq!(text, "Hi there");
}

#[tokio::test]
async fn generate_rejection_carries_backend_detail() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/generate/"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "detail": "rate limited"
        })))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .generate("Hello", &SessionId::generate(), CancellationToken::new())
        .await
        .err()
        .unwrap();

    assert_eq!(err.user_message(), "rate limited");
    match err {
        ApiError::Backend { status, .. } => assert_eq!(status, 429),
        other => panic!("expected Backend error, got {other:?}"),
    }
}

#[tokio::test]
async fn generate_rejection_without_detail_uses_fallback_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/generate/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .generate("Hello", &SessionId::generate(), CancellationToken::new())
        .await
        .err()
        .unwrap();

    assert_eq!(err.user_message(), quillgen_api::GENERATION_FALLBACK);
}

#[tokio::test]
async fn generate_auth_rejection_is_distinguished() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/generate/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .generate("Hello", &SessionId::generate(), CancellationToken::new())
        .await
        .err()
        .unwrap();

    assert!(err.is_auth());
}
