use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use careerdesk_client::{
    AccessToken, AuthChangeEvent, AuthorizationVerdict, GateView, InMemorySessionProvider,
    NavigateOptions, ProviderError, RecordingNavigator, Route, Session, SessionGate,
    SessionProvider, SessionSubscription, UserIdentity,
};
use careerdesk_core::UserId;
use tokio::sync::oneshot;

type FetchResult = Result<Option<Session>, ProviderError>;

/// Provider whose one-shot fetch resolves only when the test says so.
struct DeferredProvider {
    inner: InMemorySessionProvider,
    pending: Mutex<Option<oneshot::Receiver<FetchResult>>>,
    fetches: AtomicUsize,
    subscribes: AtomicUsize,
}

impl DeferredProvider {
    fn new() -> (Arc<Self>, oneshot::Sender<FetchResult>) {
        let (tx, rx) = oneshot::channel();
        let provider = Arc::new(Self {
            inner: InMemorySessionProvider::new(),
            pending: Mutex::new(Some(rx)),
            fetches: AtomicUsize::new(0),
            subscribes: AtomicUsize::new(0),
        });
        (provider, tx)
    }
}

#[async_trait]
impl SessionProvider for DeferredProvider {
    async fn fetch_session(&self) -> FetchResult {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let pending = self.pending.lock().unwrap().take();
        match pending {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ProviderError::Unavailable("fetch abandoned".into()))),
            None => self.inner.fetch_session().await,
        }
    }

    fn subscribe(&self) -> SessionSubscription {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        self.inner.subscribe()
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.inner.sign_out().await
    }
}

fn unverified_session() -> Session {
    Session::new(
        AccessToken::new("tok-unverified"),
        UserIdentity::new(UserId::new(), "hana@example.com"),
    )
}

fn verified_session() -> Session {
    serde_json::from_value(serde_json::json!({
        "access_token": "tok-verified",
        "user": {
            "id": "0190a6e2-7b3c-7d4e-8f00-112233445566",
            "email": "hana@example.com",
            "email_confirmed_at": "2024-01-01T00:00:00Z",
        }
    }))
    .unwrap()
}

async fn let_gate_run() {
    careerdesk_observability::tracing::init_for_tests();
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}

async fn wait_for(gate: &mut SessionGate, verdict: AuthorizationVerdict) {
    careerdesk_observability::tracing::init_for_tests();
    tokio::time::timeout(Duration::from_secs(2), gate.wait_for(|v| *v == verdict))
        .await
        .expect("gate did not reach verdict in time")
        .expect("gate stopped before reaching verdict");
}

#[tokio::test]
async fn no_session_redirects_to_login() {
    let provider = Arc::new(InMemorySessionProvider::new());
    let navigator = Arc::new(RecordingNavigator::new());
    let mut gate = SessionGate::mount(provider, navigator.clone());

    wait_for(&mut gate, AuthorizationVerdict::Unauthenticated).await;

    assert_eq!(gate.view(), GateView::Redirect(Route::Login));
    assert_eq!(
        navigator.navigations(),
        vec![(Route::Login, NavigateOptions::replace())]
    );
}

#[tokio::test]
async fn unconfirmed_email_redirects_to_verification() {
    let provider = Arc::new(InMemorySessionProvider::with_session(unverified_session()));
    let navigator = Arc::new(RecordingNavigator::new());
    let mut gate = SessionGate::mount(provider, navigator.clone());

    wait_for(&mut gate, AuthorizationVerdict::Unverified).await;

    assert_eq!(gate.view(), GateView::Redirect(Route::VerifyEmail));
    assert_eq!(
        navigator.last(),
        Some((Route::VerifyEmail, NavigateOptions::replace()))
    );
}

#[tokio::test]
async fn verifying_elsewhere_authorizes_without_navigation() {
    let provider = Arc::new(InMemorySessionProvider::with_session(unverified_session()));
    let navigator = Arc::new(RecordingNavigator::new());
    let mut gate = SessionGate::mount(provider.clone(), navigator.clone());
    wait_for(&mut gate, AuthorizationVerdict::Unverified).await;

    provider.publish(AuthChangeEvent::UserUpdated, Some(verified_session()));
    wait_for(&mut gate, AuthorizationVerdict::Authorized).await;

    assert_eq!(gate.view(), GateView::Render);
    // Only the earlier verification redirect; nothing navigates away.
    assert_eq!(navigator.navigations().len(), 1);
}

#[tokio::test]
async fn loading_shows_waiting_and_never_redirects() {
    let (provider, _resolve) = DeferredProvider::new();
    let navigator = Arc::new(RecordingNavigator::new());
    let gate = SessionGate::mount(provider, navigator.clone());

    let_gate_run().await;

    assert_eq!(gate.verdict(), AuthorizationVerdict::Loading);
    assert_eq!(gate.view(), GateView::Waiting);
    assert!(navigator.navigations().is_empty());
}

#[tokio::test]
async fn change_before_fetch_is_not_overwritten_by_stale_fetch() {
    let (provider, resolve) = DeferredProvider::new();
    let navigator = Arc::new(RecordingNavigator::new());
    let mut gate = SessionGate::mount(provider.clone(), navigator.clone());

    provider
        .inner
        .publish(AuthChangeEvent::SignedIn, Some(verified_session()));
    wait_for(&mut gate, AuthorizationVerdict::Authorized).await;

    resolve.send(Ok(None)).unwrap();
    let_gate_run().await;

    assert_eq!(gate.verdict(), AuthorizationVerdict::Authorized);
    assert!(navigator.navigations().is_empty());
}

#[tokio::test]
async fn changes_apply_in_arrival_order() {
    let provider = Arc::new(InMemorySessionProvider::with_session(verified_session()));
    let navigator = Arc::new(RecordingNavigator::new());
    let mut gate = SessionGate::mount(provider.clone(), navigator.clone());
    wait_for(&mut gate, AuthorizationVerdict::Authorized).await;

    provider.publish(AuthChangeEvent::SignedOut, None);
    provider.publish(AuthChangeEvent::SignedIn, Some(unverified_session()));
    provider.publish(AuthChangeEvent::UserUpdated, Some(verified_session()));
    let_gate_run().await;

    assert_eq!(gate.verdict(), AuthorizationVerdict::Authorized);
    assert_eq!(
        navigator.navigations(),
        vec![
            (Route::Login, NavigateOptions::replace()),
            (Route::VerifyEmail, NavigateOptions::replace()),
        ]
    );
}

#[tokio::test]
async fn fetch_failure_fails_closed() {
    let provider = Arc::new(InMemorySessionProvider::with_session(verified_session()));
    provider.set_fetch_failure(Some(ProviderError::Unavailable("network down".into())));
    let navigator = Arc::new(RecordingNavigator::new());
    let mut gate = SessionGate::mount(provider, navigator.clone());

    let settled = tokio::time::timeout(Duration::from_secs(2), gate.settled())
        .await
        .unwrap();
    assert_eq!(settled, Some(AuthorizationVerdict::Unauthenticated));
    assert_eq!(navigator.last(), Some((Route::Login, NavigateOptions::replace())));
}

#[tokio::test]
async fn nothing_applies_after_unmount() {
    let (provider, resolve) = DeferredProvider::new();
    let navigator = Arc::new(RecordingNavigator::new());
    let gate = SessionGate::mount(provider.clone(), navigator.clone());
    let verdicts = gate.watch();
    assert_eq!(provider.inner.subscriber_count(), 1);

    gate.unmount();
    assert_eq!(provider.inner.subscriber_count(), 0);

    // Late arrivals from both sources.
    let _ = resolve.send(Ok(None));
    provider
        .inner
        .publish(AuthChangeEvent::SignedIn, Some(verified_session()));
    let_gate_run().await;

    assert_eq!(*verdicts.borrow(), AuthorizationVerdict::Loading);
    assert!(navigator.navigations().is_empty());
}

#[tokio::test]
async fn subscription_acquired_once_and_released_on_drop() {
    let (provider, resolve) = DeferredProvider::new();
    let navigator = Arc::new(RecordingNavigator::new());

    {
        let _gate = SessionGate::mount(provider.clone(), navigator.clone());
        assert_eq!(provider.subscribes.load(Ordering::SeqCst), 1);
        assert_eq!(provider.inner.subscriber_count(), 1);
    }

    assert_eq!(provider.subscribes.load(Ordering::SeqCst), 1);
    assert_eq!(provider.inner.subscriber_count(), 0);
    drop(resolve);
}

#[tokio::test]
async fn gate_never_polls() {
    let (provider, resolve) = DeferredProvider::new();
    let navigator = Arc::new(RecordingNavigator::new());
    let mut gate = SessionGate::mount(provider.clone(), navigator);

    resolve.send(Ok(Some(verified_session()))).unwrap();
    wait_for(&mut gate, AuthorizationVerdict::Authorized).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);
}

#[test]
fn mounting_without_runtime_fails_closed() {
    let provider = Arc::new(InMemorySessionProvider::with_session(verified_session()));
    let navigator = Arc::new(RecordingNavigator::new());
    let gate = SessionGate::mount(provider.clone(), navigator.clone());

    assert_eq!(gate.verdict(), AuthorizationVerdict::Unauthenticated);
    assert!(!gate.is_mounted());
    assert_eq!(provider.subscriber_count(), 0);
    assert_eq!(navigator.last(), Some((Route::Login, NavigateOptions::replace())));
}

#[tokio::test]
async fn handle_unmounts_gate_once() {
    let (provider, resolve) = DeferredProvider::new();
    let navigator = Arc::new(RecordingNavigator::new());
    let gate = SessionGate::mount(provider.clone(), navigator.clone());
    let handle = gate.handle();

    assert!(handle.unmount());
    assert!(!handle.unmount());
    assert!(!gate.is_mounted());
    assert_eq!(provider.inner.subscriber_count(), 0);

    let _ = resolve.send(Ok(None));
    let_gate_run().await;
    assert_eq!(gate.verdict(), AuthorizationVerdict::Loading);
    assert!(navigator.navigations().is_empty());

    drop(gate);
    assert!(!handle.is_mounted());
}
