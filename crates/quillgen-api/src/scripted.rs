//! Scripted test double for the backend boundary.
//!
//! `ScriptedBackend` stands in for the real transport in tests: it
//! serves canned session lists and transcripts, records every call,
//! and produces generation streams from scripted chunk sequences, or
//! from a [`ChunkFeed`] the test drips chunks through while it
//! exercises mid-stream behavior such as cancellation. The same
//! cancellation token contract as the real transport applies.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use quillgen_core::{Message, Session, SessionId};

use crate::backend::{Backend, ChunkStream};
use crate::error::ApiError;

/// One queued response for a `generate` call.
enum ScriptedGeneration {
    /// Stream these chunks, then optionally fail mid-stream.
    Chunks {
        chunks: Vec<String>,
        failure: Option<String>,
    },
    /// Refuse the request before any content streams.
    Reject { status: u16, message: String },
    /// Stream whatever the paired [`ChunkFeed`] sends.
    Manual(mpsc::UnboundedReceiver<String>),
}

#[derive(Default)]
struct State {
    sessions: Vec<Session>,
    transcripts: HashMap<SessionId, Vec<Message>>,
    generations: VecDeque<ScriptedGeneration>,
    list_failures: VecDeque<ApiError>,
    generate_log: Vec<(String, SessionId)>,
}

/// Hand-driven chunk source for a scripted generation.
///
/// Dropping the feed ends the stream, the scripted analog of
/// end-of-body.
#[derive(Debug)]
pub struct ChunkFeed {
    tx: mpsc::UnboundedSender<String>,
}

impl ChunkFeed {
    /// Deliver one chunk to the in-flight generation stream.
    pub fn send(&self, chunk: &str) {
        let _ = self.tx.send(chunk.to_string());
    }
}

/// In-memory [`Backend`] with scripted generation behavior.
#[derive(Default)]
pub struct ScriptedBackend {
    state: Mutex<State>,
    list_calls: AtomicUsize,
}

impl ScriptedBackend {
    /// Create an empty scripted backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the session list served by `list_sessions`.
    pub fn set_sessions(&self, sessions: Vec<Session>) {
        self.lock().sessions = sessions;
    }

    /// Set the transcript served for one session.
    pub fn set_messages(&self, session_id: SessionId, messages: Vec<Message>) {
        self.lock().transcripts.insert(session_id, messages);
    }

    /// Queue a generation that streams these chunks and completes.
    pub fn script_chunks<I>(&self, chunks: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.lock().generations.push_back(ScriptedGeneration::Chunks {
            chunks: chunks.into_iter().map(Into::into).collect(),
            failure: None,
        });
    }

    /// Queue a generation that streams these chunks, then fails.
    pub fn script_midstream_failure<I>(&self, chunks: I, message: &str)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.lock().generations.push_back(ScriptedGeneration::Chunks {
            chunks: chunks.into_iter().map(Into::into).collect(),
            failure: Some(message.to_string()),
        });
    }

    /// Queue a generation refused before any content streams.
    pub fn script_rejection(&self, status: u16, message: &str) {
        self.lock().generations.push_back(ScriptedGeneration::Reject {
            status,
            message: message.to_string(),
        });
    }

    /// Queue a generation the test feeds by hand.
    pub fn script_manual(&self) -> ChunkFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock()
            .generations
            .push_back(ScriptedGeneration::Manual(rx));
        ChunkFeed { tx }
    }

    /// Make the next `list_sessions` call fail with this error.
    pub fn fail_next_list(&self, error: ApiError) {
        self.lock().list_failures.push_back(error);
    }

    /// How many times `list_sessions` has been called.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Every `(prompt, session_id)` pair `generate` has received.
    pub fn generate_log(&self) -> Vec<(String, SessionId)> {
        self.lock().generate_log.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("scripted backend poisoned")
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn list_sessions(&self) -> Result<Vec<Session>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if let Some(error) = state.list_failures.pop_front() {
            return Err(error);
        }
        Ok(state.sessions.clone())
    }

    async fn session_messages(&self, session_id: &SessionId) -> Result<Vec<Message>, ApiError> {
        self.lock()
            .transcripts
            .get(session_id)
            .cloned()
            .ok_or(ApiError::Backend {
                status: 404,
                message: "Session not found or no messages.".to_string(),
            })
    }

    async fn delete_session(&self, session_id: &SessionId) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.sessions.retain(|s| s.session_id != *session_id);
        state.transcripts.remove(session_id);
        Ok(())
    }

    async fn generate(
        &self,
        prompt: &str,
        session_id: &SessionId,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, ApiError> {
        let scripted = {
            let mut state = self.lock();
            state
                .generate_log
                .push((prompt.to_string(), *session_id));
            state
                .generations
                .pop_front()
                .expect("no scripted generation queued")
        };

        match scripted {
            ScriptedGeneration::Reject { status, message } => {
                Err(ApiError::Backend { status, message })
            }
            ScriptedGeneration::Chunks { chunks, failure } => {
                let mut items: Vec<Result<String, ApiError>> =
                    chunks.into_iter().map(Ok).collect();
                if let Some(message) = failure {
                    items.push(Err(ApiError::Network(message)));
                }
                Ok(Box::pin(
                    futures::stream::iter(items).take_until(cancel.cancelled_owned()),
                ))
            }
            ScriptedGeneration::Manual(rx) => {
                let feed = futures::stream::unfold(rx, |mut rx| async move {
                    rx.recv().await.map(|chunk| (Ok::<String, ApiError>(chunk), rx))
                });
                Ok(Box::pin(feed.take_until(cancel.cancelled_owned())))
            }
        }
    }
}
