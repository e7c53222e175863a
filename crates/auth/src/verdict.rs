//! Authorization verdict derived from the current session.

use serde::Serialize;

use crate::Session;

/// Access decision for a protected view.
///
/// `Loading` only exists before the first observation; after that the verdict
/// moves freely between the other three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationVerdict {
    Loading,
    Unauthenticated,
    Unverified,
    Authorized,
}

impl AuthorizationVerdict {
    /// Classify an observed session.
    ///
    /// `Authorized` iff a session exists and its user has confirmed their email.
    pub fn classify(session: Option<&Session>) -> Self {
        match session {
            None => Self::Unauthenticated,
            Some(s) if s.user.is_email_confirmed() => Self::Authorized,
            Some(_) => Self::Unverified,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized)
    }

    /// Whether a session is known to exist (verified or not).
    pub fn has_session(&self) -> bool {
        matches!(self, Self::Unverified | Self::Authorized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Unauthenticated => "unauthenticated",
            Self::Unverified => "unverified",
            Self::Authorized => "authorized",
        }
    }
}

impl core::fmt::Display for AuthorizationVerdict {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
