//! In-memory collaborators for tests/dev.
//!
//! - No IO
//! - Scriptable failures
//! - Call counters so tests can assert what reached the "remote" side

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};

use careerdesk_auth::{AccessToken, Session};
use careerdesk_core::RemoteError;

use crate::provider::{
    AuthChangeEvent, ProviderError, SessionChange, SessionProvider, SessionSubscription,
    Unsubscribe,
};
use crate::route::{NavigateOptions, Navigator, Route};
use crate::services::{AccountService, LinkOpener, ResourceGrant, ResourceService};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ─────────────────────────────────────────────────────────────────────────────
// Session provider
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ProviderState {
    current: Option<Session>,
    subscribers: Vec<(u64, mpsc::UnboundedSender<SessionChange>)>,
    next_subscriber: u64,
    fetch_failure: Option<ProviderError>,
    sign_out_failure: Option<ProviderError>,
}

/// Process-local session store with broadcast change delivery.
///
/// Also usable by hosts whose identity SDK pushes sessions in: call
/// [`InMemorySessionProvider::publish`] from the SDK callback.
#[derive(Debug, Default)]
pub struct InMemorySessionProvider {
    state: Arc<Mutex<ProviderState>>,
    sign_outs: AtomicUsize,
}

impl InMemorySessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        let provider = Self::new();
        lock(&provider.state).current = Some(session);
        provider
    }

    /// Replace the session and notify every live subscriber.
    pub fn publish(&self, event: AuthChangeEvent, session: Option<Session>) {
        let mut state = lock(&self.state);
        state.current = session.clone();

        let change = SessionChange::new(event, session);
        // Drop any dead subscribers while publishing.
        state
            .subscribers
            .retain(|(_, tx)| tx.send(change.clone()).is_ok());
    }

    pub fn current(&self) -> Option<Session> {
        lock(&self.state).current.clone()
    }

    /// Make every following fetch fail until cleared with `None`.
    pub fn set_fetch_failure(&self, failure: Option<ProviderError>) {
        lock(&self.state).fetch_failure = failure;
    }

    /// Make every following sign-out fail (after counting it) until cleared.
    pub fn set_sign_out_failure(&self, failure: Option<ProviderError>) {
        lock(&self.state).sign_out_failure = failure;
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.state).subscribers.len()
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for InMemorySessionProvider {
    async fn fetch_session(&self) -> Result<Option<Session>, ProviderError> {
        let state = lock(&self.state);
        match &state.fetch_failure {
            Some(e) => Err(e.clone()),
            None => Ok(state.current.clone()),
        }
    }

    fn subscribe(&self) -> SessionSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut state = lock(&self.state);
            let id = state.next_subscriber;
            state.next_subscriber += 1;
            state.subscribers.push((id, tx));
            id
        };

        let weak = Arc::downgrade(&self.state);
        let unsubscribe = Unsubscribe::new(move || {
            if let Some(state) = weak.upgrade() {
                lock(&state).subscribers.retain(|(sid, _)| *sid != id);
            }
        });

        SessionSubscription::new(rx, unsubscribe)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = lock(&self.state).sign_out_failure.clone() {
            return Err(e);
        }
        self.publish(AuthChangeEvent::SignedOut, None);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Navigation / link opening
// ─────────────────────────────────────────────────────────────────────────────

/// Navigator that records every call.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<(Route, NavigateOptions)>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn navigations(&self) -> Vec<(Route, NavigateOptions)> {
        lock(&self.history).clone()
    }

    pub fn last(&self) -> Option<(Route, NavigateOptions)> {
        lock(&self.history).last().copied()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: Route, options: NavigateOptions) {
        lock(&self.history).push((target, options));
    }
}

/// Opener that records the URLs it was handed.
#[derive(Debug, Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<String>>,
}

impl RecordingOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<String> {
        lock(&self.opened).clone()
    }
}

impl LinkOpener for RecordingOpener {
    fn open(&self, grant: ResourceGrant) {
        lock(&self.opened).push(grant.into_url());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Remote services
// ─────────────────────────────────────────────────────────────────────────────

/// Account service with scripted outcomes.
///
/// Calls succeed unless a failure was queued.
#[derive(Debug, Default)]
pub struct InMemoryAccountService {
    delete_failures: Mutex<VecDeque<RemoteError>>,
    resend_failures: Mutex<VecDeque<RemoteError>>,
    confirmations: Mutex<Vec<String>>,
    resent: Mutex<Vec<String>>,
    hold: Mutex<Option<Arc<Notify>>>,
    resend_hold: Mutex<Option<Arc<Notify>>>,
}

impl InMemoryAccountService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_delete(&self, message: impl Into<String>) {
        lock(&self.delete_failures).push_back(RemoteError::new(message));
    }

    pub fn fail_next_resend(&self, message: impl Into<String>) {
        lock(&self.resend_failures).push_back(RemoteError::new(message));
    }

    /// Park every following deletion until the returned handle is notified.
    pub fn hold_deletions(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *lock(&self.hold) = Some(notify.clone());
        notify
    }

    /// Park every following resend until the returned handle is notified.
    pub fn hold_resends(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *lock(&self.resend_hold) = Some(notify.clone());
        notify
    }

    pub fn delete_calls(&self) -> usize {
        lock(&self.confirmations).len()
    }

    pub fn confirmations(&self) -> Vec<String> {
        lock(&self.confirmations).clone()
    }

    pub fn resent_to(&self) -> Vec<String> {
        lock(&self.resent).clone()
    }
}

#[async_trait]
impl AccountService for InMemoryAccountService {
    async fn delete_account(&self, confirmation: &str) -> Result<(), RemoteError> {
        lock(&self.confirmations).push(confirmation.to_string());

        let hold = lock(&self.hold).clone();
        if let Some(hold) = hold {
            hold.notified().await;
        }

        match lock(&self.delete_failures).pop_front() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn resend_verification(&self, email: &str) -> Result<(), RemoteError> {
        let hold = lock(&self.resend_hold).clone();
        if let Some(hold) = hold {
            hold.notified().await;
        }

        if let Some(e) = lock(&self.resend_failures).pop_front() {
            return Err(e);
        }
        lock(&self.resent).push(email.to_string());
        Ok(())
    }
}

/// Resource service minting a distinct link per call.
#[derive(Debug)]
pub struct InMemoryResourceService {
    base_url: String,
    calls: AtomicUsize,
    tokens: Mutex<Vec<String>>,
    failures: Mutex<VecDeque<RemoteError>>,
}

impl InMemoryResourceService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            calls: AtomicUsize::new(0),
            tokens: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
        }
    }

    pub fn fail_next(&self, message: impl Into<String>) {
        lock(&self.failures).push_back(RemoteError::new(message));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Tokens presented, in call order.
    pub fn tokens(&self) -> Vec<String> {
        lock(&self.tokens).clone()
    }
}

#[async_trait]
impl ResourceService for InMemoryResourceService {
    async fn signed_link(&self, token: &AccessToken) -> Result<ResourceGrant, RemoteError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        lock(&self.tokens).push(token.expose().to_string());

        if let Some(e) = lock(&self.failures).pop_front() {
            return Err(e);
        }

        let expires_at = chrono::Utc::now() + chrono::Duration::seconds(60);
        Ok(ResourceGrant::new(
            format!("{}?sig={n}", self.base_url),
            Some(expires_at),
        ))
    }
}
