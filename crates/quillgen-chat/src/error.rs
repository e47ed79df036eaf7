//! Error types for the interaction core.

use quillgen_api::ApiError;
use quillgen_core::SessionId;
use thiserror::Error;

use crate::transcript::TranscriptError;

/// A result type using `ChatError`.
pub type Result<T> = std::result::Result<T, ChatError>;

/// Errors that can occur while orchestrating a conversation.
#[derive(Debug, Error)]
pub enum ChatError {
    /// A generation is already in progress; only one may be active.
    #[error("a generation is already in progress")]
    Busy,

    /// The submitted prompt was empty after trimming.
    #[error("prompt is empty")]
    EmptyPrompt,

    /// The requested session is neither listed nor locally created.
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),

    /// The credential was rejected; the caller must clear it and
    /// return the user to login.
    #[error("authentication rejected")]
    Auth,

    /// A backend call failed for a non-authentication reason.
    #[error(transparent)]
    Api(ApiError),

    /// A transcript invariant was violated.
    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

impl ChatError {
    /// Returns `true` when this failure must bounce the user to login.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth)
    }

    /// Lift a transport error, routing authentication rejections to
    /// the dedicated variant so they are impossible to miss.
    #[must_use]
    pub fn from_api(error: ApiError) -> Self {
        if error.is_auth() {
            Self::Auth
        } else {
            Self::Api(error)
        }
    }
}
