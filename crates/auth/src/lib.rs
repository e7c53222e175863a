//! `careerdesk-auth`: pure session model and access classification.
//!
//! This crate is intentionally decoupled from transport, timers and UI. It
//! knows what a session looks like and how to turn one into a verdict.

pub mod session;
pub mod verdict;

pub use session::{AccessToken, Session, UserIdentity};
pub use verdict::AuthorizationVerdict;
