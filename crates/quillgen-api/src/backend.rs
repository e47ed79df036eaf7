//! The transport boundary the interaction core is written against.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use tokio_util::sync::CancellationToken;

use quillgen_core::{Message, Session, SessionId};

use crate::error::ApiError;

/// A finite, non-restartable sequence of decoded text chunks from one
/// generation request, delivered strictly in arrival order.
///
/// The stream ends at end-of-body or when the cancellation token that
/// opened it fires, whichever comes first. A transport failure
/// mid-stream yields a single `Err` item and then the stream ends.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, ApiError>> + Send>>;

/// Operations the backend offers to an authenticated client.
///
/// The interaction core is generic over this trait; production code
/// uses [`crate::HttpBackend`], tests use `ScriptedBackend`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// List the caller's sessions, most recently updated first.
    ///
    /// # Errors
    ///
    /// `ApiError::Auth` when the credential is missing or rejected,
    /// `ApiError::Network` on transport failure.
    async fn list_sessions(&self) -> Result<Vec<Session>, ApiError>;

    /// Load the full transcript of one session, oldest first.
    ///
    /// # Errors
    ///
    /// `ApiError::Auth` on a rejected credential, `ApiError::Backend`
    /// when the session has no backend record.
    async fn session_messages(&self, session_id: &SessionId) -> Result<Vec<Message>, ApiError>;

    /// Delete a session and all its messages.
    ///
    /// # Errors
    ///
    /// `ApiError::Auth` on a rejected credential, `ApiError::Backend`
    /// when the session does not exist.
    async fn delete_session(&self, session_id: &SessionId) -> Result<(), ApiError>;

    /// Submit a prompt and open the streaming response.
    ///
    /// Exactly one generation cycle: the returned stream is finite and
    /// not restartable, and triggering `cancel` aborts the underlying
    /// read at its next suspension point. Text already delivered is
    /// never retracted.
    ///
    /// # Errors
    ///
    /// `ApiError::Auth` on a rejected credential; `ApiError::Backend`
    /// carrying the server's reason when the request is refused before
    /// any content streams; `ApiError::Network` on transport failure.
    async fn generate(
        &self,
        prompt: &str,
        session_id: &SessionId,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, ApiError>;
}
