//! Error types for backend operations.

use std::time::Duration;

use thiserror::Error;

/// Fallback text shown in the transcript when a generation fails
/// without a readable reason from the backend.
pub const GENERATION_FALLBACK: &str = "Error generating content. Please try again.";

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The credential was missing or rejected. Callers treat this as a
    /// signal to clear the stored credential and return to login.
    #[error("authentication rejected")]
    Auth,

    /// Transport failure before or during a response.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("backend error ({status}): {message}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// Reason extracted from the error body, possibly empty.
        message: String,
    },

    /// A response arrived but did not parse.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The generation stream produced no data within the configured
    /// idle window.
    #[error("generation stream stalled after {0:?}")]
    Stalled(Duration),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

impl ApiError {
    /// Returns `true` when this failure must bounce the user to login.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth)
    }

    /// Text to show the user when a generation fails: the backend's
    /// own reason when it gave one, else a generic message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend { message, .. } if !message.is_empty() => message.clone(),
            _ => GENERATION_FALLBACK.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_backend_reason() {
        let err = ApiError::Backend {
            status: 429,
            message: "rate limited".to_string(),
        };
        assert_eq!(err.user_message(), "rate limited");
    }

    #[test]
    fn user_message_falls_back_when_reason_missing() {
        let err = ApiError::Backend {
            status: 500,
            message: String::new(),
        };
        assert_eq!(err.user_message(), GENERATION_FALLBACK);

        let err = ApiError::Network("connection reset".to_string());
        assert_eq!(err.user_message(), GENERATION_FALLBACK);
    }

    #[test]
    fn auth_is_flagged() {
        assert!(ApiError::Auth.is_auth());
        assert!(!ApiError::Parse("x".to_string()).is_auth());
    }
}
