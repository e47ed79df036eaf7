//! Integration tests against a real content-generation backend.
//!
//! These tests require the backend to be running on localhost:8000
//! (override with `QUILLGEN_BACKEND`) with a working generation
//! provider behind it.
//!
//! Run with:
//!   cargo test -p quillgen-cli --test backend_integration -- --ignored --nocapture

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use quillgen_api::{ApiConfig, Backend, HttpBackend};
use quillgen_auth::{AuthClient, Credentials, Role};
use quillgen_chat::{ChatController, GenerationEvent};
use quillgen_core::SessionId;

fn backend_url() -> String {
    std::env::var("QUILLGEN_BACKEND").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string())
}

/// Sign up a throwaway account and return its credentials.
async fn throwaway_account() -> Credentials {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis();
    let username = format!("it-user-{suffix}");

    let client = AuthClient::new(backend_url());
    client
        .signup(&username, "integration-test-pw", Role::Viewer)
        .await
        .expect("signup failed")
}

#[tokio::test]
#[ignore = "Requires the backend running on localhost:8000"]
async fn signup_then_login_issues_tokens() {
    let credentials = throwaway_account().await;
    assert!(!credentials.token.is_empty());
    println!("✓ signup issued a token");

    let client = AuthClient::new(backend_url());
    let relogin = client
        .login(&credentials.username, "integration-test-pw")
        .await
        .expect("login failed");
    assert!(!relogin.token.is_empty());
    println!("✓ login issued a token");
}

#[tokio::test]
#[ignore = "Requires the backend running on localhost:8000"]
async fn generation_streams_and_shows_up_in_the_listing() {
    let credentials = throwaway_account().await;
    let backend = Arc::new(HttpBackend::new(ApiConfig::new(backend_url()), credentials));
    let mut chat = ChatController::new(Arc::clone(&backend));

    let mut rx = chat
        .submit("Say hello in exactly three words.")
        .await
        .expect("submit failed");

    let mut chunks = 0usize;
    while let Some(event) = rx.recv().await {
        if let GenerationEvent::Chunk(_) = &event {
            chunks += 1;
        }
        let terminal = !matches!(event, GenerationEvent::Chunk(_));
        chat.handle_event(event).await.expect("event handling failed");
        if terminal {
            break;
        }
    }

    let response = &chat.messages().last().expect("no message").response;
    println!("✓ streamed {chunks} chunk(s): {response}");
    assert!(!response.is_empty(), "response should not be empty");

    // The post-completion refresh must list the new session.
    let active = chat.registry().active().expect("no active session");
    assert!(
        chat.registry().sessions().iter().any(|s| s.session_id == active),
        "completed session should appear in the listing"
    );
    println!("✓ session appears in the listing after completion");
}

#[tokio::test]
#[ignore = "Requires the backend running on localhost:8000"]
async fn cancellation_stops_the_stream_promptly() {
    let credentials = throwaway_account().await;
    let backend = HttpBackend::new(ApiConfig::new(backend_url()), credentials);

    let cancel = CancellationToken::new();
    let mut stream = backend
        .generate(
            "Write a very long essay about the history of computing, at least 1000 words.",
            &SessionId::generate(),
            cancel.clone(),
        )
        .await
        .expect("generate failed");

    // Take one chunk, then cancel.
    let first = stream.next().await;
    assert!(first.is_some(), "expected at least one chunk");
    cancel.cancel();

    let mut extra = 0usize;
    while stream.next().await.is_some() {
        extra += 1;
        assert!(extra < 3, "stream should stop at the next read after cancel");
    }
    println!("✓ stream ended after cancellation ({extra} extra chunk(s))");
}
