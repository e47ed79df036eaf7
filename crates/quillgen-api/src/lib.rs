//! Backend client and streaming transport for quillgen.
//!
//! This crate owns everything that talks to the content-generation
//! backend once a credential exists:
//!
//! - [`Backend`]: the trait boundary the interaction core is written
//!   against: list sessions, load a transcript, delete a session, and
//!   open a cancellable generation stream
//! - [`HttpBackend`]: the reqwest implementation of that trait
//! - [`decode::StreamDecoder`]: streaming-safe UTF-8 decoding that
//!   carries incomplete multi-byte sequences across reads
//! - `ScriptedBackend` (behind `test-utils`): a test double that
//!   yields scripted chunk sequences and honors the same cancellation
//!   token as the real transport
//!
//! The generation call is the interesting one: `POST /generate/`
//! answers with a chunked `text/plain` body that is consumed
//! incrementally and surfaced as a [`ChunkStream`] of decoded text
//! fragments, in strict arrival order.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod backend;
pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod stream;

#[cfg(any(test, feature = "test-utils"))]
pub mod scripted;

pub use backend::{Backend, ChunkStream};
pub use client::HttpBackend;
pub use config::ApiConfig;
pub use error::{ApiError, GENERATION_FALLBACK};

#[cfg(any(test, feature = "test-utils"))]
pub use scripted::{ChunkFeed, ScriptedBackend};
