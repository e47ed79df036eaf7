//! Chat data model as the backend represents it.
//!
//! These types mirror the payloads of the `/chat/sessions/` and
//! `/chat/session/{id}` endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::SessionId;

/// One persisted conversation thread, as listed by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session identifier.
    pub session_id: SessionId,
    /// Preview text: the first prompt ever sent in this session.
    #[serde(default)]
    pub first_prompt: Option<String>,
    /// When the session was last touched, per the backend's record.
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Session {
    /// Sidebar label: the first prompt truncated to 20 characters, or
    /// a short id prefix when no preview exists yet.
    #[must_use]
    pub fn label(&self) -> String {
        match self.first_prompt.as_deref() {
            Some(preview) if !preview.is_empty() => {
                let truncated: String = preview.chars().take(20).collect();
                if truncated.chars().count() < preview.chars().count() {
                    format!("{truncated}...")
                } else {
                    truncated
                }
            }
            _ => self.session_id.short(),
        }
    }
}

/// One prompt/response pair in a transcript.
///
/// The `response` is empty while the reply is still streaming in and
/// is mutated in place as chunks arrive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The user's prompt text.
    pub prompt: String,
    /// The generated response text accumulated so far.
    pub response: String,
}

impl Message {
    /// Create a message with a known response.
    #[must_use]
    pub fn new(prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response: response.into(),
        }
    }

    /// Create a message whose response has not streamed in yet.
    #[must_use]
    pub fn pending(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response: String::new(),
        }
    }
}
