//! One-shot signed links to privileged resources (e.g. the stored CV).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tracing::{debug, info, warn};

use careerdesk_auth::AuthorizationVerdict;
use careerdesk_core::{ActionResult, PreconditionError};

use crate::lifecycle::{BusyGuard, MountHandle};
use crate::provider::SessionProvider;
use crate::services::{LinkOpener, ResourceService};

/// What happened to a fetched link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Handed to the opener.
    Opened,
    /// The view went away before the link arrived; it was dropped unused.
    Discarded,
}

/// Exchanges the current session for a signed link and opens it immediately.
///
/// Links are never cached: every call makes a fresh remote request.
pub struct SignedLinkFetcher {
    sessions: Arc<dyn SessionProvider>,
    resources: Arc<dyn ResourceService>,
    opener: Arc<dyn LinkOpener>,
    mount: MountHandle,
    fetching: AtomicBool,
}


impl SignedLinkFetcher {
    pub fn new(
        sessions: Arc<dyn SessionProvider>,
        resources: Arc<dyn ResourceService>,
        opener: Arc<dyn LinkOpener>,
    ) -> Self {
        Self {
            sessions,
            resources,
            opener,
            mount: MountHandle::mount(),
            fetching: AtomicBool::new(false),
        }
    }

    /// Whether a fetch is in progress (download control shows a spinner).
    pub fn is_fetching(&self) -> bool {
        self.fetching.load(Ordering::Acquire)
    }

    pub async fn fetch_link(&self) -> ActionResult<LinkOutcome> {
        let Some(_fetching) = BusyGuard::acquire(&self.fetching) else {
            return Err(PreconditionError::InFlight.into());
        };

        let session = match self.sessions.fetch_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "session lookup failed; refusing signed link");
                None
            }
        };
        let session = session
            .filter(|s| AuthorizationVerdict::classify(Some(s)).is_authorized())
            .ok_or(PreconditionError::NotAuthorized)?;

        let grant = match self.resources.signed_link(&session.access_token).await {
            Ok(grant) => grant,
            Err(e) => {
                warn!(error = %e, "signed link request failed");
                return Err(e.into());
            }
        };

        if grant.is_expired(Utc::now()) {
            warn!("signed link arrived already expired");
            return Err(PreconditionError::GrantExpired.into());
        }

        if !self.mount.is_alive() {
            debug!("view gone; discarding signed link");
            return Ok(LinkOutcome::Discarded);
        }

        info!(user_id = %session.user_id(), "opening signed link");
        self.opener.open(grant);
        Ok(LinkOutcome::Opened)
    }

    pub fn teardown(&self) {
        self.mount.teardown();
    }
}
