//! Authentication error types.

use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential is stored; the user has to log in first.
    #[error("no stored credential")]
    MissingCredential,

    /// Login failed with a reason reported by the backend.
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// Signup failed with a reason reported by the backend.
    #[error("signup failed: {0}")]
    SignupFailed(String),

    /// The backend answered without any recognizable token field.
    #[error("no token in backend response")]
    MissingToken,

    /// The credential file could not be read or written.
    #[error("credential storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// The credential file exists but does not parse.
    #[error("malformed credential file: {0}")]
    MalformedCredentials(#[from] serde_json::Error),

    /// The request could not be completed.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Returns `true` when the failure is a rejection the user can fix
    /// by retyping their credentials, as opposed to a transport or
    /// storage problem.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::LoginFailed(_) | Self::SignupFailed(_))
    }
}
