//! HTTP implementation of the backend boundary.
//!
//! This module provides a typed client for the content-generation
//! backend's REST and streaming endpoints.

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use quillgen_auth::Credentials;
use quillgen_core::{Message, Session, SessionId};

use crate::backend::{Backend, ChunkStream};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::stream::text_chunks;

/// Request body for the streaming generation endpoint.
#[derive(Debug, Clone, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    session_id: &'a SessionId,
}

/// Error body shape used by the backend (`detail` from FastAPI-style
/// handlers, `message` from the rest).
#[derive(Debug, Deserialize)]
struct RawErrorResponse {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Client for the backend REST and streaming API.
///
/// Credentials are injected at construction; nothing here reads
/// ambient global state.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    config: ApiConfig,
    credentials: Credentials,
}

impl HttpBackend {
    /// Create a new backend client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should never happen
    /// with default TLS).
    #[must_use]
    pub fn new(config: ApiConfig, credentials: Credentials) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .build()
            .expect("failed to create HTTP client");

        Self {
            client,
            config,
            credentials,
        }
    }

    /// Get the configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Build headers for authenticated requests.
    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.credentials.token)).unwrap(),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    /// Map a non-success response into an error.
    ///
    /// Authentication rejections become [`ApiError::Auth`] so callers
    /// can route the user back to login; everything else keeps the
    /// status and whatever reason the body carried.
    async fn error_from_response(response: reqwest::Response) -> ApiError {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return ApiError::Auth;
        }

        let message = response
            .json::<RawErrorResponse>()
            .await
            .ok()
            .and_then(|raw| raw.detail.or(raw.message))
            .unwrap_or_default();

        ApiError::Backend {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_sessions(&self) -> Result<Vec<Session>, ApiError> {
        let response = self
            .client
            .get(self.config.sessions_url())
            .headers(self.auth_headers())
            .timeout(self.config.request_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let sessions: Vec<Session> = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        Ok(sessions)
    }

    async fn session_messages(&self, session_id: &SessionId) -> Result<Vec<Message>, ApiError> {
        let response = self
            .client
            .get(self.config.session_url(session_id))
            .headers(self.auth_headers())
            .timeout(self.config.request_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let messages: Vec<Message> = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        Ok(messages)
    }

    async fn delete_session(&self, session_id: &SessionId) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.config.session_url(session_id))
            .headers(self.auth_headers())
            .timeout(self.config.request_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(())
    }

    async fn generate(
        &self,
        prompt: &str,
        session_id: &SessionId,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, ApiError> {
        let request = GenerateRequest { prompt, session_id };

        // No overall deadline here: a generation may legitimately run
        // for a long time. Stalls are bounded by the idle timeout.
        let response = self
            .client
            .post(self.config.generate_url())
            .headers(self.auth_headers())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        tracing::debug!(%session_id, "generation stream opened");

        let body = response.bytes_stream().map_err(ApiError::from);
        Ok(text_chunks(
            body,
            cancel,
            self.config.stream_idle_timeout,
        ))
    }
}
