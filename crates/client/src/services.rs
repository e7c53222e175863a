//! Privileged remote collaborators and the one-shot resource grant.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use careerdesk_auth::AccessToken;
use careerdesk_core::RemoteError;

/// Account operations that run with elevated privileges on the server.
///
/// The server re-validates authorization for every call; local checks are
/// only there to keep users from firing these by accident.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Irreversibly delete the caller's account.
    async fn delete_account(&self, confirmation: &str) -> Result<(), RemoteError>;

    /// Send the signup verification email again.
    async fn resend_verification(&self, email: &str) -> Result<(), RemoteError>;
}

/// Issues short-lived links to stored documents.
#[async_trait]
pub trait ResourceService: Send + Sync {
    async fn signed_link(&self, token: &AccessToken) -> Result<ResourceGrant, RemoteError>;
}

/// A time-limited, single-use link to a privileged resource.
///
/// Deliberately not `Clone`: opening consumes it, so a grant cannot be
/// opened twice or kept around after use.
#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGrant {
    signed_url: String,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

impl ResourceGrant {
    pub fn new(signed_url: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            signed_url: signed_url.into(),
            expires_at,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Grants without an expiry are trusted to be short-lived server-side.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    /// Consume the grant, yielding the URL to open.
    pub fn into_url(self) -> String {
        self.signed_url
    }
}

/// Opens a signed link (new tab, system browser, download manager...).
pub trait LinkOpener: Send + Sync {
    fn open(&self, grant: ResourceGrant);
}
