//! The generation controller: the busy/idle state machine around one
//! outstanding generation.
//!
//! A submission runs as follows: `submit` validates the prompt, makes
//! sure a session is active (creating one when absent), appends the
//! open message, and opens the stream. A pump task forwards stream
//! items as [`GenerationEvent`]s over the returned channel; the owning
//! event loop feeds each one back into [`ChatController::handle_event`]
//! until a terminal event (`Completed`, `Failed`, `Cancelled`) returns
//! the controller to `Idle`. Completion triggers exactly one session
//! refresh; cancellation keeps the partial response and skips the
//! refresh.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use quillgen_api::{ApiError, Backend, ChunkStream};
use quillgen_core::{Message, SessionId};

use crate::error::{ChatError, Result};
use crate::registry::SessionRegistry;
use crate::transcript::TranscriptStore;

/// Buffer size for the generation event channel.
const EVENT_BUFFER: usize = 32;

/// Where the controller is in the generation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing in flight; submissions are accepted.
    #[default]
    Idle,
    /// A submission is being validated and sent.
    Submitting,
    /// A stream is open and chunks are arriving.
    Streaming,
    /// The user asked to cancel; waiting for the stream to stop.
    Cancelling,
}

/// One item of a generation's lifecycle, as seen by the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationEvent {
    /// A decoded text chunk to append to the open message.
    Chunk(String),
    /// The stream ended normally.
    Completed,
    /// The generation failed; the text is what the user should see.
    Failed(String),
    /// The stream stopped because the user cancelled it.
    Cancelled,
}

/// The single in-flight generation.
#[derive(Debug)]
struct ActiveGeneration {
    cancel: CancellationToken,
    session_id: SessionId,
}

/// Orchestrates sessions, the transcript, and the one active
/// generation against a backend.
pub struct ChatController<B: Backend> {
    backend: Arc<B>,
    registry: SessionRegistry,
    transcript: TranscriptStore,
    phase: Phase,
    active: Option<ActiveGeneration>,
    /// Most recent non-fatal refresh failure, for the status bar.
    last_refresh_error: Option<String>,
}

impl<B: Backend + 'static> ChatController<B> {
    /// Create a controller over a backend.
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            registry: SessionRegistry::new(),
            transcript: TranscriptStore::new(),
            phase: Phase::Idle,
            active: None,
            last_refresh_error: None,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether a new submission would be accepted.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    /// The session registry.
    #[must_use]
    pub const fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// The active session's transcript.
    #[must_use]
    pub const fn transcript(&self) -> &TranscriptStore {
        &self.transcript
    }

    /// The most recent non-fatal session-refresh failure.
    #[must_use]
    pub fn last_refresh_error(&self) -> Option<&str> {
        self.last_refresh_error.as_deref()
    }

    /// Fetch the session list from the backend.
    ///
    /// A rejected credential is fatal; any other failure keeps the
    /// registry's prior value and is only recorded for display.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Auth`] when the credential is rejected.
    pub async fn refresh_sessions(&mut self) -> Result<()> {
        match self.backend.list_sessions().await {
            Ok(sessions) => {
                self.registry.replace(sessions);
                self.last_refresh_error = None;
                Ok(())
            }
            Err(ApiError::Auth) => Err(ChatError::Auth),
            Err(e) => {
                tracing::warn!(error = %e, "session refresh failed; keeping prior listing");
                self.last_refresh_error = Some(e.to_string());
                Ok(())
            }
        }
    }

    /// Switch to another session, loading its transcript from the
    /// backend. A locally created session has no backend record; its
    /// transcript is whatever this client already holds.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Busy`] while a generation is active,
    /// [`ChatError::UnknownSession`] for an id the registry does not
    /// know, [`ChatError::Auth`] on a rejected credential, or the
    /// transport error from loading the transcript.
    pub async fn select_session(&mut self, id: SessionId) -> Result<()> {
        if self.phase != Phase::Idle {
            return Err(ChatError::Busy);
        }
        if !self.registry.contains(&id) {
            return Err(ChatError::UnknownSession(id));
        }

        if self.registry.is_local(&id) {
            self.registry.select(&id);
            return Ok(());
        }

        let messages = self
            .backend
            .session_messages(&id)
            .await
            .map_err(ChatError::from_api)?;
        self.registry.select(&id);
        self.transcript.load(messages);
        Ok(())
    }

    /// Start a new conversation: fresh session id, empty transcript.
    /// No network call happens until the first generation completes.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Busy`] while a generation is active.
    pub fn start_new_session(&mut self) -> Result<SessionId> {
        if self.phase != Phase::Idle {
            return Err(ChatError::Busy);
        }
        let id = self.registry.start_new();
        self.transcript.clear();
        tracing::debug!(session_id = %id, "started new session");
        Ok(id)
    }

    /// Delete a session backend-side and drop it locally. Clears the
    /// transcript if the deleted session was active, then refreshes
    /// the listing.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Busy`] while a generation is active,
    /// [`ChatError::Auth`] on a rejected credential, or the transport
    /// error from the delete call.
    pub async fn delete_session(&mut self, id: SessionId) -> Result<()> {
        if self.phase != Phase::Idle {
            return Err(ChatError::Busy);
        }
        self.backend
            .delete_session(&id)
            .await
            .map_err(ChatError::from_api)?;

        let was_active = self.registry.active() == Some(id);
        self.registry.remove(&id);
        if was_active {
            self.transcript.clear();
        }
        self.refresh_sessions().await
    }

    /// Submit a prompt and open a generation stream.
    ///
    /// On success the returned channel carries the generation's
    /// events; the caller must feed each into [`Self::handle_event`]
    /// until a terminal event arrives. When the backend refuses the
    /// request before any content streams, the channel carries a
    /// single `Failed` event with the user-visible reason: visible
    /// degradation, not an error return.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::EmptyPrompt`] for blank input,
    /// [`ChatError::Busy`] when a generation is already active, or
    /// [`ChatError::Auth`] when the credential is rejected outright.
    pub async fn submit(&mut self, prompt: &str) -> Result<mpsc::Receiver<GenerationEvent>> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ChatError::EmptyPrompt);
        }
        if self.phase != Phase::Idle {
            return Err(ChatError::Busy);
        }

        self.phase = Phase::Submitting;
        let session_id = match self.registry.active() {
            Some(id) => id,
            None => self.registry.start_new(),
        };
        if let Err(e) = self.transcript.append_open(prompt) {
            self.phase = Phase::Idle;
            return Err(e.into());
        }

        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        match self
            .backend
            .generate(prompt, &session_id, cancel.clone())
            .await
        {
            Ok(stream) => {
                self.active = Some(ActiveGeneration { cancel: cancel.clone(), session_id });
                self.phase = Phase::Streaming;
                tokio::spawn(pump(stream, cancel, tx));
                Ok(rx)
            }
            Err(ApiError::Auth) => {
                self.transcript.close_open();
                self.phase = Phase::Idle;
                Err(ChatError::Auth)
            }
            Err(e) => {
                // The rejection reason becomes the response text; the
                // terminal Failed event closes the cycle.
                tracing::warn!(error = %e, "generation refused");
                let _ = tx.try_send(GenerationEvent::Failed(e.user_message()));
                Ok(rx)
            }
        }
    }

    /// Apply one generation event.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Auth`] when the post-completion session
    /// refresh finds the credential rejected.
    pub async fn handle_event(&mut self, event: GenerationEvent) -> Result<()> {
        match event {
            GenerationEvent::Chunk(text) => {
                self.transcript.append_chunk(&text);
            }
            GenerationEvent::Completed => {
                self.transcript.close_open();
                self.active = None;
                self.phase = Phase::Idle;
                self.refresh_sessions().await?;
            }
            GenerationEvent::Failed(text) => {
                let streamed = self.phase == Phase::Streaming || self.phase == Phase::Cancelling;
                self.transcript.append_chunk(&text);
                self.transcript.close_open();
                self.active = None;
                self.phase = Phase::Idle;
                // A refused submission never reached the backend's
                // save path, so there is nothing new to list.
                if streamed {
                    self.refresh_sessions().await?;
                }
            }
            GenerationEvent::Cancelled => {
                self.transcript.close_open();
                self.active = None;
                self.phase = Phase::Idle;
            }
        }
        Ok(())
    }

    /// Cancel the in-flight generation.
    ///
    /// Cooperative: the stream stops at its next read, the partial
    /// response stays in the transcript, and the terminal `Cancelled`
    /// event finishes the transition to `Idle`. Returns `false` when
    /// nothing was cancellable.
    pub fn cancel(&mut self) -> bool {
        if self.phase != Phase::Streaming {
            return false;
        }
        if let Some(active) = &self.active {
            tracing::debug!(session_id = %active.session_id, "cancelling generation");
            active.cancel.cancel();
            self.phase = Phase::Cancelling;
            true
        } else {
            false
        }
    }

    /// The messages of the active transcript, for rendering.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        self.transcript.messages()
    }
}

/// Forward stream items as events until the stream ends.
async fn pump(
    mut stream: ChunkStream,
    cancel: CancellationToken,
    tx: mpsc::Sender<GenerationEvent>,
) {
    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => {
                if tx.send(GenerationEvent::Chunk(chunk)).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                let _ = tx.send(GenerationEvent::Failed(e.user_message())).await;
                return;
            }
        }
    }

    let terminal = if cancel.is_cancelled() {
        GenerationEvent::Cancelled
    } else {
        GenerationEvent::Completed
    };
    let _ = tx.send(terminal).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use quillgen_api::ScriptedBackend;

    fn controller() -> ChatController<ScriptedBackend> {
        ChatController::new(Arc::new(ScriptedBackend::new()))
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_without_side_effects() {
        let mut chat = controller();
        assert!(matches!(
            chat.submit("   ").await,
            Err(ChatError::EmptyPrompt)
        ));
        assert!(chat.is_idle());
        assert!(chat.transcript().is_empty());
        assert_eq!(chat.registry().active(), None);
    }

    #[tokio::test]
    async fn cancel_without_a_stream_is_a_no_op() {
        let mut chat = controller();
        assert!(!chat.cancel());
        assert!(chat.is_idle());
    }

    #[tokio::test]
    async fn new_session_is_rejected_while_streaming() {
        let backend = Arc::new(ScriptedBackend::new());
        let _feed = backend.script_manual();
        let mut chat = ChatController::new(Arc::clone(&backend));

        let _rx = chat.submit("Hello").await.unwrap();
        assert_eq!(chat.phase(), Phase::Streaming);

        assert!(matches!(chat.start_new_session(), Err(ChatError::Busy)));
        assert!(matches!(chat.submit("again").await, Err(ChatError::Busy)));
    }
}
