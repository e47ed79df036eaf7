//! The transcript store: prompt/response pairs for the active session.
//!
//! At most one message is "open" (still receiving streamed response
//! text) and it is always the last one. The store enforces that
//! invariant; everything else is plain ordered data.

use quillgen_core::Message;
use thiserror::Error;

/// Errors from transcript mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    /// An open message already exists; it must be closed before a new
    /// prompt can be appended.
    #[error("a message is already receiving a response")]
    MessageOpen,
}

/// Ordered prompt/response pairs for one session.
#[derive(Debug, Default)]
pub struct TranscriptStore {
    messages: Vec<Message>,
    open: bool,
}

impl TranscriptStore {
    /// Create an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The messages in order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Whether a message is currently open.
    #[must_use]
    pub fn has_open(&self) -> bool {
        self.open
    }

    /// Whether the transcript is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Replace the whole transcript with messages loaded from the
    /// backend. Nothing is left open.
    pub fn load(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.open = false;
    }

    /// Drop everything, for a new conversation.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.open = false;
    }

    /// Append a prompt with an empty response and mark it open.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptError::MessageOpen`] if a message is
    /// already open.
    pub fn append_open(&mut self, prompt: &str) -> Result<(), TranscriptError> {
        if self.open {
            return Err(TranscriptError::MessageOpen);
        }
        self.messages.push(Message::pending(prompt));
        self.open = true;
        Ok(())
    }

    /// Append streamed text to the open message's response.
    ///
    /// A chunk with no open message is dropped; correct orchestration
    /// never produces one.
    pub fn append_chunk(&mut self, text: &str) {
        if !self.open {
            tracing::debug!("dropping chunk with no open message");
            return;
        }
        if let Some(message) = self.messages.last_mut() {
            message.response.push_str(text);
        }
    }

    /// Close the open message. Idempotent.
    pub fn close_open(&mut self) {
        self.open = false;
    }
}
