//! Auth-state synchronization: one-shot fetch + change stream → verdicts.
//!
//! The driver merges two async sources into a single ordered verdict stream:
//!
//! - the initial [`SessionProvider::fetch_session`] call, and
//! - every [`SessionChange`] delivered on the subscription.
//!
//! Rules:
//!
//! - Observations apply in arrival order; no two apply concurrently.
//! - Once a change has been applied, a fetch result that resolves later is
//!   stale and is discarded.
//! - A failed fetch fails closed to `Unauthenticated`.
//! - Nothing is applied after the owning view tears down.
//! - No timers: the driver only ever reacts to the two sources.

use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{debug, warn};

use careerdesk_auth::{AuthorizationVerdict, Session};

use crate::lifecycle::MountHandle;
use crate::provider::{ProviderError, SessionChange, SessionProvider, SessionSubscription};

/// An input to the tracker.
#[derive(Debug, Clone)]
pub enum Observation {
    Fetched(Result<Option<Session>, ProviderError>),
    Changed(SessionChange),
}

/// Result of applying one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Transition {
        from: AuthorizationVerdict,
        to: AuthorizationVerdict,
    },
    Unchanged(AuthorizationVerdict),
    /// The observation was stale and ignored.
    Discarded,
}

/// Pure verdict state machine fed by [`Observation`]s.
#[derive(Debug, Clone)]
pub struct VerdictTracker {
    verdict: AuthorizationVerdict,
    fetch_resolved: bool,
    change_seen: bool,
}

impl VerdictTracker {
    pub fn new() -> Self {
        Self {
            verdict: AuthorizationVerdict::Loading,
            fetch_resolved: false,
            change_seen: false,
        }
    }

    pub fn verdict(&self) -> AuthorizationVerdict {
        self.verdict
    }

    pub fn apply(&mut self, observation: Observation) -> Step {
        let next = match observation {
            Observation::Fetched(result) => {
                if self.fetch_resolved || self.change_seen {
                    self.fetch_resolved = true;
                    return Step::Discarded;
                }
                self.fetch_resolved = true;
                match result {
                    Ok(session) => AuthorizationVerdict::classify(session.as_ref()),
                    Err(_) => AuthorizationVerdict::Unauthenticated,
                }
            }
            Observation::Changed(change) => {
                self.change_seen = true;
                AuthorizationVerdict::classify(change.session.as_ref())
            }
        };

        let from = self.verdict;
        self.verdict = next;
        if from == next {
            Step::Unchanged(next)
        } else {
            Step::Transition { from, to: next }
        }
    }
}

impl Default for VerdictTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the sync loop until `shutdown` fires or the view is torn down.
///
/// `on_transition` is invoked for every verdict change, in arrival order, and
/// only while `mount` is alive.
pub(crate) async fn run<F>(
    provider: Arc<dyn SessionProvider>,
    mut subscription: SessionSubscription,
    mount: MountHandle,
    shutdown: Arc<Notify>,
    mut on_transition: F,
) where
    F: FnMut(AuthorizationVerdict, AuthorizationVerdict) + Send,
{
    let mut tracker = VerdictTracker::new();

    let fetch = provider.fetch_session();
    tokio::pin!(fetch);
    let mut fetch_pending = true;
    let mut subscription_open = true;

    loop {
        let observation = tokio::select! {
            biased;

            _ = shutdown.notified() => break,

            change = subscription.next(), if subscription_open => match change {
                Some(change) => {
                    debug!(event = ?change.event, "session change received");
                    Observation::Changed(change)
                }
                None => {
                    debug!("session subscription closed");
                    subscription_open = false;
                    continue;
                }
            },

            result = &mut fetch, if fetch_pending => {
                fetch_pending = false;
                if let Err(e) = &result {
                    warn!(error = %e, "session fetch failed; failing closed");
                }
                Observation::Fetched(result)
            }
        };

        if !mount.is_alive() {
            debug!("view torn down; dropping session observation");
            break;
        }

        match tracker.apply(observation) {
            Step::Transition { from, to } => {
                debug!(%from, %to, "verdict transition");
                on_transition(from, to);
            }
            Step::Unchanged(verdict) => debug!(%verdict, "verdict unchanged"),
            Step::Discarded => debug!("stale session fetch discarded"),
        }
    }

    debug!("session sync stopped");
}
