//! Client error model.
//!
//! Two classes of failure reach user-facing code:
//!
//! - [`PreconditionError`]: the action was refused locally, before any remote
//!   call. UI surfaces these as a disabled control rather than a message.
//! - [`RemoteError`]: a privileged remote call failed. The message is shown to
//!   the user verbatim and local state stays recoverable.
//!
//! Session provider failures never appear here; the gate folds them into the
//! `Unauthenticated` verdict.

use thiserror::Error;

/// Result type for user-triggered actions.
pub type ActionResult<T> = Result<T, ActionError>;

/// A local precondition did not hold, so no remote call was made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    /// The typed confirmation phrase does not exactly match the required one.
    #[error("confirmation phrase does not match")]
    PhraseMismatch,

    /// The same action is already in flight.
    #[error("action already in progress")]
    InFlight,

    /// No authorized session exists.
    #[error("not authorized")]
    NotAuthorized,

    /// The confirmation modal is not open.
    #[error("confirmation dialog is not open")]
    ModalClosed,

    /// The session has no email address to send to.
    #[error("No user email found")]
    MissingEmail,

    /// A signed link expired before it could be opened.
    #[error("link expired before it could be opened")]
    GrantExpired,
}

/// A privileged remote operation failed.
///
/// `Display` yields the remote message unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RemoteError {
    message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure of a user-triggered action.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl ActionError {
    /// Whether the error was raised before reaching the remote boundary.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}
