//! Core types for the quillgen client.
//!
//! This crate provides the foundational types shared by the quillgen
//! crates:
//!
//! - **Identifiers**: the strongly-typed [`SessionId`]
//! - **Chat model**: [`Session`] and [`Message`] as the backend
//!   represents them
//!
//! # Example
//!
//! ```
//! use quillgen_core::{Message, SessionId};
//!
//! // Generate a fresh session ID for a new conversation
//! let session_id = SessionId::generate();
//!
//! // A prompt whose response has not streamed in yet
//! let message = Message::pending("Write a haiku about rivers");
//! assert!(message.response.is_empty());
//! # let _ = session_id;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod chat;
pub mod ids;

pub use chat::{Message, Session};
pub use ids::{IdError, SessionId};
