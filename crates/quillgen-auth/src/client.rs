//! Login and signup client.
//!
//! The backend issues bearer tokens from two endpoints with slightly
//! different conventions: `/login` takes a form-encoded body (OAuth2
//! password flow) and `/signup` takes JSON. Both answer with a token
//! under either the `access_token` or the legacy `token` key; that
//! ambiguity is resolved here, once, and never re-checked downstream.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;
use crate::error::{AuthError, Result};

/// Default timeout for auth requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fallback text when the backend rejects a request without a
/// readable reason.
const GENERIC_FAILURE: &str = "An error occurred. Please try again.";

/// Account role requested at signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Role {
    /// Read-only account; the signup default.
    #[default]
    Viewer,
    /// Can edit content.
    Editor,
    /// Full administrative access.
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Viewer => "Viewer",
            Self::Editor => "Editor",
            Self::Admin => "Admin",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "viewer" => Ok(Self::Viewer),
            "editor" => Ok(Self::Editor),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("unknown role: {s} (expected Viewer, Editor or Admin)")),
        }
    }
}

/// Request payload for signup.
#[derive(Debug, Clone, Serialize)]
struct SignupRequest<'a> {
    username: &'a str,
    password: &'a str,
    role: Role,
}

/// Raw token response from `/login` and `/signup`.
///
/// The backend has answered with both `access_token` and `token` over
/// its lifetime; accept either.
#[derive(Debug, Deserialize)]
struct RawTokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

impl RawTokenResponse {
    /// Resolve the duck-typed response into a single token.
    fn resolve(self) -> Result<String> {
        self.access_token
            .or(self.token)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)
    }
}

/// Error body shape used by the backend.
///
/// FastAPI-style errors carry `detail`; a few handlers use `message`.
#[derive(Debug, Deserialize)]
struct RawErrorResponse {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl RawErrorResponse {
    fn into_reason(self) -> Option<String> {
        self.detail.or(self.message).filter(|m| !m.is_empty())
    }
}

/// Client for the backend's login and signup endpoints.
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    /// Create a new auth client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should never happen
    /// with default TLS).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Authenticate with username and password.
    ///
    /// # Errors
    ///
    /// Returns `LoginFailed` with the backend's reason when the
    /// credentials are rejected, `MissingToken` if a success response
    /// carries no token, or `Network` on transport failure.
    pub async fn login(&self, username: &str, password: &str) -> Result<Credentials> {
        let url = format!("{}/login", self.base_url);

        let response = self
            .client
            .post(&url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let token = Self::handle_response(response, AuthError::LoginFailed).await?;
        tracing::debug!(username, "login succeeded");
        Ok(Credentials::new(token, username))
    }

    /// Register a new account and authenticate in one step.
    ///
    /// # Errors
    ///
    /// Returns `SignupFailed` with the backend's reason (for example a
    /// duplicate username), `MissingToken` if a success response
    /// carries no token, or `Network` on transport failure.
    pub async fn signup(&self, username: &str, password: &str, role: Role) -> Result<Credentials> {
        let url = format!("{}/signup", self.base_url);

        let request = SignupRequest {
            username,
            password,
            role,
        };

        let response = self.client.post(&url).json(&request).send().await?;

        let token = Self::handle_response(response, AuthError::SignupFailed).await?;
        tracing::debug!(username, %role, "signup succeeded");
        Ok(Credentials::new(token, username))
    }

    /// Turn an HTTP response into a resolved token, mapping failures
    /// through `reject` with the backend's reason when one is present.
    async fn handle_response(
        response: reqwest::Response,
        reject: fn(String) -> AuthError,
    ) -> Result<String> {
        if response.status().is_success() {
            let raw: RawTokenResponse = response
                .json()
                .await
                .map_err(|e| AuthError::Internal(format!("invalid response: {e}")))?;
            return raw.resolve();
        }

        let reason = response
            .json::<RawErrorResponse>()
            .await
            .ok()
            .and_then(RawErrorResponse::into_reason)
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());

        Err(reject(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn login_sends_form_and_resolves_access_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("username=alice"))
            .and(body_string_contains("password=secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok-abc",
                "token_type": "bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AuthClient::new(server.uri());
        let credentials = client.login("alice", "secret").await.unwrap();

        assert_eq!(credentials.token, "tok-abc");
        assert_eq!(credentials.username, "alice");
    }

    #[tokio::test]
    async fn signup_resolves_legacy_token_field() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/signup"))
            .and(body_string_contains("\"role\":\"Viewer\""))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "token": "tok-legacy" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = AuthClient::new(server.uri());
        let credentials = client.signup("bob", "secret", Role::Viewer).await.unwrap();

        assert_eq!(credentials.token, "tok-legacy");
    }

    #[tokio::test]
    async fn login_failure_carries_backend_detail() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "detail": "Incorrect username or password"
            })))
            .mount(&server)
            .await;

        let client = AuthClient::new(server.uri());
        let err = client.login("alice", "wrong").await.unwrap_err();

        match err {
            AuthError::LoginFailed(reason) => {
                assert_eq!(reason, "Incorrect username or password");
            }
            other => panic!("expected LoginFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn signup_failure_without_body_uses_generic_reason() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/signup"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = AuthClient::new(server.uri());
        let err = client.signup("bob", "pw", Role::Viewer).await.unwrap_err();

        match err {
            AuthError::SignupFailed(reason) => assert_eq!(reason, GENERIC_FAILURE),
            other => panic!("expected SignupFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_without_token_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })),
            )
            .mount(&server)
            .await;

        let client = AuthClient::new(server.uri());
        let err = client.login("alice", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::MissingToken));
    }

    #[test]
    fn role_serializes_capitalized() {
        assert_eq!(serde_json::to_string(&Role::Viewer).unwrap(), "\"Viewer\"");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"Admin\"");
        assert_eq!(Role::default(), Role::Viewer);
    }
}
