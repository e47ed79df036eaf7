//! Streaming-generation interaction core.
//!
//! This crate orchestrates one client's conversation state against the
//! backend boundary defined by `quillgen-api`:
//!
//! - [`SessionRegistry`]: the known sessions and the active one
//! - [`TranscriptStore`]: the active session's prompt/response pairs,
//!   with the open message that streamed chunks append to
//! - [`ChatController`]: the busy/idle state machine that submits
//!   prompts, consumes generation streams, cancels them, and keeps the
//!   registry consistent afterwards
//!
//! # Concurrency model
//!
//! Everything here is driven from one logical event loop. A submitted
//! generation spawns a single pump task that forwards stream items as
//! [`GenerationEvent`]s over a channel; the owning loop feeds them back
//! into [`ChatController::handle_event`], so shared state is only ever
//! touched from that loop. At most one generation is active at a time,
//! enforced by the controller phase rather than a lock.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod controller;
pub mod error;
pub mod registry;
pub mod transcript;

pub use controller::{ChatController, GenerationEvent, Phase};
pub use error::{ChatError, Result};
pub use registry::SessionRegistry;
pub use transcript::{TranscriptError, TranscriptStore};
