//! Backend connection configuration.

use std::time::Duration;

use quillgen_core::SessionId;

/// Configuration for the backend client.
///
/// The timeout policy is deliberately explicit. Plain request/response
/// calls get a bounded `request_timeout`. The generation stream has no
/// overall deadline (a long generation is legitimate) but can be
/// bounded per-read with `stream_idle_timeout`, which caps how long
/// the client waits for the *next* chunk before giving up on a stalled
/// backend. The default leaves it unset, matching the behavior this
/// client was ported from.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the backend (e.g. `http://127.0.0.1:8000`).
    pub base_url: String,
    /// Timeout for non-streaming requests.
    pub request_timeout: Duration,
    /// Maximum wait for the next chunk of a generation stream.
    /// `None` waits indefinitely.
    pub stream_idle_timeout: Option<Duration>,
}

impl ApiConfig {
    /// Create a configuration with default timeouts.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(30),
            stream_idle_timeout: None,
        }
    }

    /// Get the session listing endpoint URL.
    #[must_use]
    pub fn sessions_url(&self) -> String {
        format!("{}/chat/sessions/", self.base_url)
    }

    /// Get the endpoint URL for one session's transcript.
    #[must_use]
    pub fn session_url(&self, session_id: &SessionId) -> String {
        format!("{}/chat/session/{session_id}", self.base_url)
    }

    /// Get the streaming generation endpoint URL.
    #[must_use]
    pub fn generate_url(&self) -> String {
        format!("{}/generate/", self.base_url)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new("http://127.0.0.1:8000")
    }
}
