//! Session authorization gate for protected views.
//!
//! A gate is mounted once per protected view. It subscribes to session
//! changes, kicks off the one-shot fetch, and keeps a verdict that the host
//! reads to decide what to show:
//!
//! | verdict           | view                                  |
//! |-------------------|---------------------------------------|
//! | `Loading`         | waiting indicator, no redirect        |
//! | `Unauthenticated` | redirect (replace) to `/login`        |
//! | `Unverified`      | redirect (replace) to `/verify-email` |
//! | `Authorized`      | protected content                     |
//!
//! Teardown (explicit [`SessionGate::unmount`], drop, or a [`GateHandle`])
//! releases the subscription exactly once and stops all further updates.

use std::sync::Arc;

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

use careerdesk_auth::AuthorizationVerdict;

use crate::lifecycle::MountHandle;
use crate::provider::{SessionProvider, Unsubscribe};
use crate::route::{NavigateOptions, Navigator, Route};
use crate::sync;

/// What the host should render for a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateView {
    Waiting,
    Redirect(Route),
    Render,
}

impl GateView {
    pub fn for_verdict(verdict: AuthorizationVerdict) -> Self {
        match verdict {
            AuthorizationVerdict::Loading => GateView::Waiting,
            AuthorizationVerdict::Unauthenticated => GateView::Redirect(Route::Login),
            AuthorizationVerdict::Unverified => GateView::Redirect(Route::VerifyEmail),
            AuthorizationVerdict::Authorized => GateView::Render,
        }
    }
}

/// Detached teardown of a mounted gate.
///
/// Lets a flow that is about to change the session (account deletion) stop
/// the gate first, so the gate does not redirect on its own.
#[derive(Debug, Clone)]
pub struct GateHandle {
    mount: MountHandle,
    unsubscribe: Unsubscribe,
    shutdown: Arc<Notify>,
}

impl GateHandle {
    pub fn is_mounted(&self) -> bool {
        self.mount.is_alive()
    }

    /// Tear the gate down. Returns `true` only for the call that did it.
    pub fn unmount(&self) -> bool {
        if !self.mount.teardown() {
            return false;
        }
        self.unsubscribe.cancel();
        self.shutdown.notify_one();
        info!("session gate unmounted");
        true
    }
}

/// A mounted gate instance.
pub struct SessionGate {
    verdicts: watch::Receiver<AuthorizationVerdict>,
    handle: GateHandle,
    task: Option<JoinHandle<()>>,
}

impl SessionGate {
    /// Mount a gate on the current Tokio runtime.
    ///
    /// Without a runtime the gate fails closed: it settles on
    /// `Unauthenticated` and redirects to the login view.
    pub fn mount(provider: Arc<dyn SessionProvider>, navigator: Arc<dyn Navigator>) -> Self {
        let (tx, verdicts) = watch::channel(AuthorizationVerdict::Loading);
        let mount = MountHandle::mount();
        let shutdown = Arc::new(Notify::new());

        let subscription = provider.subscribe();
        let unsubscribe = subscription.unsubscribe_handle();

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = %e, "no async runtime; gate failing closed");
                unsubscribe.cancel();
                tx.send_replace(AuthorizationVerdict::Unauthenticated);
                navigator.navigate(Route::Login, NavigateOptions::replace());
                mount.teardown();
                return Self {
                    verdicts,
                    handle: GateHandle {
                        mount,
                        unsubscribe,
                        shutdown,
                    },
                    task: None,
                };
            }
        };

        let live = mount.clone();
        let on_transition = move |_from: AuthorizationVerdict, to: AuthorizationVerdict| {
            if !live.is_alive() {
                return;
            }
            tx.send_replace(to);
            if let GateView::Redirect(route) = GateView::for_verdict(to) {
                info!(verdict = %to, target = %route, "gate redirecting");
                navigator.navigate(route, NavigateOptions::replace());
            }
        };

        let task = runtime.spawn(sync::run(
            provider,
            subscription,
            mount.clone(),
            shutdown.clone(),
            on_transition,
        ));

        info!("session gate mounted");

        Self {
            verdicts,
            handle: GateHandle {
                mount,
                unsubscribe,
                shutdown,
            },
            task: Some(task),
        }
    }

    pub fn verdict(&self) -> AuthorizationVerdict {
        *self.verdicts.borrow()
    }

    pub fn view(&self) -> GateView {
        GateView::for_verdict(self.verdict())
    }

    /// A receiver for hosts that re-render on every verdict change.
    pub fn watch(&self) -> watch::Receiver<AuthorizationVerdict> {
        self.verdicts.clone()
    }

    /// Wait until the verdict satisfies `predicate`.
    ///
    /// Returns `None` if the gate stopped before that happened.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&AuthorizationVerdict) -> bool,
    ) -> Option<AuthorizationVerdict> {
        self.verdicts.wait_for(predicate).await.ok().map(|v| *v)
    }

    /// Wait until the gate leaves `Loading`.
    pub async fn settled(&mut self) -> Option<AuthorizationVerdict> {
        self.wait_for(|v| !v.is_loading()).await
    }

    pub fn is_mounted(&self) -> bool {
        self.handle.is_mounted()
    }

    /// A handle that can tear this gate down from elsewhere.
    pub fn handle(&self) -> GateHandle {
        self.handle.clone()
    }

    /// Tear the gate down.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        self.handle.unmount();
        // The task exits on the shutdown signal; nothing to await here.
        self.task.take();
    }
}

impl Drop for SessionGate {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl core::fmt::Debug for SessionGate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionGate")
            .field("verdict", &self.verdict())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}
