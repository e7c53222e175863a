//! Session provider contract (adapter over the external identity service).
//!
//! The provider owns the session. Consumers get two read paths:
//!
//! - [`SessionProvider::fetch_session`]: one-shot snapshot.
//! - [`SessionProvider::subscribe`]: ongoing change stream, one consumer per
//!   subscription, cancelled through an idempotent [`Unsubscribe`].
//!
//! ## Usage Pattern
//!
//! ```ignore
//! let mut subscription = provider.subscribe();
//! let cancel = subscription.unsubscribe_handle();
//!
//! while let Some(change) = subscription.next().await {
//!     render(AuthorizationVerdict::classify(change.session.as_ref()));
//! }
//!
//! cancel.cancel(); // on teardown; safe to call again
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use careerdesk_auth::Session;

/// Failure talking to the identity provider.
///
/// Consumers treat every variant as "status unknown" and fail closed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("session provider unavailable: {0}")]
    Unavailable(String),

    #[error("malformed session payload: {0}")]
    Malformed(String),
}

/// What the provider says happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthChangeEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// One delivery on a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChange {
    pub event: AuthChangeEvent,
    pub session: Option<Session>,
}

impl SessionChange {
    pub fn new(event: AuthChangeEvent, session: Option<Session>) -> Self {
        Self { event, session }
    }
}

type Release = Box<dyn FnOnce() + Send>;

struct UnsubscribeInner {
    cancelled: AtomicBool,
    release: Mutex<Option<Release>>,
}

/// Zero-argument, idempotent cancellation of a subscription.
///
/// Clones share state: whichever clone cancels first runs the release hook,
/// every later call is a no-op.
#[derive(Clone)]
pub struct Unsubscribe {
    inner: Arc<UnsubscribeInner>,
}

impl Unsubscribe {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            inner: Arc::new(UnsubscribeInner {
                cancelled: AtomicBool::new(false),
                release: Mutex::new(Some(Box::new(release))),
            }),
        }
    }

    /// Cancel the subscription. Returns `true` if this call cancelled it.
    pub fn cancel(&self) -> bool {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return false;
        }

        let release = match self.inner.release.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(release) = release {
            release();
        }
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }
}

impl core::fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// A live subscription to session changes.
///
/// Dropping the subscription cancels it.
#[derive(Debug)]
pub struct SessionSubscription {
    changes: mpsc::UnboundedReceiver<SessionChange>,
    unsubscribe: Unsubscribe,
}

impl SessionSubscription {
    pub fn new(changes: mpsc::UnboundedReceiver<SessionChange>, unsubscribe: Unsubscribe) -> Self {
        Self {
            changes,
            unsubscribe,
        }
    }

    /// Wait for the next change.
    ///
    /// Returns `None` once the subscription is cancelled or the provider
    /// closed it. Changes queued before cancellation are not delivered.
    pub async fn next(&mut self) -> Option<SessionChange> {
        if self.unsubscribe.is_cancelled() {
            return None;
        }
        let change = self.changes.recv().await?;
        if self.unsubscribe.is_cancelled() {
            return None;
        }
        Some(change)
    }

    pub fn unsubscribe_handle(&self) -> Unsubscribe {
        self.unsubscribe.clone()
    }

    pub fn unsubscribe(&self) -> bool {
        self.unsubscribe.cancel()
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.unsubscribe.cancel();
    }
}

/// Adapter over the external identity service.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// One-shot snapshot of the current session.
    async fn fetch_session(&self) -> Result<Option<Session>, ProviderError>;

    /// Start receiving session changes.
    fn subscribe(&self) -> SessionSubscription;

    /// Invalidate the local session.
    async fn sign_out(&self) -> Result<(), ProviderError>;
}
