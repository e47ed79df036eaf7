//! Credential handling for the quillgen client.
//!
//! This crate covers the authentication surface of the backend:
//!
//! - [`AuthClient`]: login (form-encoded) and signup (JSON) calls,
//!   resolving the backend's token response into [`Credentials`]
//! - [`CredentialStore`]: a JSON file holding the bearer token between
//!   runs, the terminal analog of browser local storage
//!
//! The credential is an opaque bearer token; this crate never inspects
//! or validates it. Components that issue authenticated requests take
//! [`Credentials`] at construction time rather than reading any
//! ambient global state.
//!
//! # Example
//!
//! ```no_run
//! use quillgen_auth::{AuthClient, CredentialStore};
//!
//! # async fn example() -> Result<(), quillgen_auth::AuthError> {
//! let client = AuthClient::new("http://127.0.0.1:8000");
//! let credentials = client.login("alice", "hunter2hunter2").await?;
//!
//! let store = CredentialStore::default_location()?;
//! store.save(&credentials)?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod credentials;
pub mod error;

pub use client::{AuthClient, Role};
pub use credentials::{CredentialStore, Credentials};
pub use error::{AuthError, Result};
