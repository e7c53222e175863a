//! `careerdesk-core`: identifiers and the client error taxonomy.
//!
//! This crate has no IO and no async; every other crate builds on it.

pub mod error;
pub mod id;

pub use error::{ActionError, ActionResult, PreconditionError, RemoteError};
pub use id::UserId;
