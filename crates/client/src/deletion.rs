//! Confirmed account deletion.
//!
//! Flow:
//!
//! 1. [`AccountDeletion::open`] starts a fresh confirmation attempt.
//! 2. The user types; [`AccountDeletion::can_submit`] stays `false` until the
//!    text is exactly [`DELETE_ACCOUNT_PHRASE`].
//! 3. [`AccountDeletion::submit`] calls the remote deletion once. Further
//!    triggers are refused while it is in flight and the modal cannot be
//!    dismissed.
//! 4. On success: unmount attached gates, sign out, then replace-navigate to
//!    the landing page. On failure: the remote message is kept for display,
//!    the modal stays open with the typed phrase, and the session is left
//!    alone.
//!
//! A gate still mounted on the hosting view would see the sign-out and
//! redirect to login on top of the landing navigation. Hand its
//! [`GateHandle`] to [`AccountDeletion::attach_gate`] so it is stopped first.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use careerdesk_core::{ActionResult, PreconditionError};

use crate::confirm::ConfirmationAttempt;
use crate::gate::GateHandle;
use crate::lifecycle::MountHandle;
use crate::provider::SessionProvider;
use crate::route::{NavigateOptions, Navigator, Route};
use crate::services::AccountService;

/// Phrase the user must type to enable deletion.
pub const DELETE_ACCOUNT_PHRASE: &str = "DELETE MY ACCOUNT";

/// Shown when the remote error carries no message.
pub const DELETE_FALLBACK_MESSAGE: &str = "Failed to delete account";

/// What the modal tells the user will be purged.
pub const PURGED_DATA: [&str; 4] = [
    "Full professional profile & bio",
    "Target company wishlist",
    "Uploaded CV & AI training data",
    "All generated email drafts & letters",
];

/// Snapshot of the open modal for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionModal {
    pub typed: String,
    pub in_flight: bool,
    pub error: Option<String>,
    pub can_submit: bool,
    pub can_cancel: bool,
}

#[derive(Debug)]
struct ModalState {
    attempt: ConfirmationAttempt,
    in_flight: bool,
    error: Option<String>,
}

impl ModalState {
    fn new() -> Self {
        Self {
            attempt: ConfirmationAttempt::new(DELETE_ACCOUNT_PHRASE),
            in_flight: false,
            error: None,
        }
    }

    fn can_submit(&self) -> bool {
        !self.in_flight && self.attempt.matches()
    }
}

/// Controller behind the "Terminate Account" button and its modal.
pub struct AccountDeletion {
    modal: Mutex<Option<ModalState>>,
    accounts: Arc<dyn AccountService>,
    sessions: Arc<dyn SessionProvider>,
    navigator: Arc<dyn Navigator>,
    gates: Mutex<Vec<GateHandle>>,
    mount: MountHandle,
}

/// Clears `in_flight` when a submission ends, including when its future is
/// dropped mid-call.
struct InFlight<'a>(&'a AccountDeletion);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(state) = self.0.lock().as_mut() {
            state.in_flight = false;
        }
    }
}

impl AccountDeletion {
    pub fn new(
        accounts: Arc<dyn AccountService>,
        sessions: Arc<dyn SessionProvider>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            modal: Mutex::new(None),
            accounts,
            sessions,
            navigator,
            gates: Mutex::new(Vec::new()),
            mount: MountHandle::mount(),
        }
    }

    /// Stop `gate` before the post-deletion sign-out.
    pub fn attach_gate(&self, gate: GateHandle) {
        self.gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(gate);
    }

    fn unmount_gates(&self) {
        let gates = std::mem::take(&mut *self.gates.lock().unwrap_or_else(PoisonError::into_inner));
        for gate in gates {
            if gate.unmount() {
                debug!("gate unmounted ahead of sign-out");
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ModalState>> {
        self.modal.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open the modal with an empty confirmation. No-op if already open.
    pub fn open(&self) {
        let mut modal = self.lock();
        if modal.is_none() {
            *modal = Some(ModalState::new());
            debug!("account deletion modal opened");
        }
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Update the typed confirmation.
    pub fn type_phrase(&self, input: impl Into<String>) -> Result<(), PreconditionError> {
        let mut modal = self.lock();
        let state = modal.as_mut().ok_or(PreconditionError::ModalClosed)?;
        state.attempt.set_typed(input);
        Ok(())
    }

    /// Whether the submit control is interactable.
    pub fn can_submit(&self) -> bool {
        self.lock().as_ref().is_some_and(ModalState::can_submit)
    }

    pub fn is_in_flight(&self) -> bool {
        self.lock().as_ref().is_some_and(|s| s.in_flight)
    }

    pub fn snapshot(&self) -> Option<DeletionModal> {
        self.lock().as_ref().map(|s| DeletionModal {
            typed: s.attempt.typed().to_string(),
            in_flight: s.in_flight,
            error: s.error.clone(),
            can_submit: s.can_submit(),
            can_cancel: !s.in_flight,
        })
    }

    /// Close the modal, discarding the attempt. Refused while in flight.
    pub fn cancel(&self) -> Result<(), PreconditionError> {
        let mut modal = self.lock();
        if modal.as_ref().is_some_and(|s| s.in_flight) {
            return Err(PreconditionError::InFlight);
        }
        if modal.take().is_some() {
            debug!("account deletion cancelled");
        }
        Ok(())
    }

    /// Submit the deletion.
    pub async fn submit(&self) -> ActionResult<()> {
        let confirmation = {
            let mut modal = self.lock();
            let state = modal.as_mut().ok_or(PreconditionError::ModalClosed)?;
            if state.in_flight {
                debug!("account deletion already in flight; ignoring trigger");
                return Err(PreconditionError::InFlight.into());
            }
            if !state.attempt.matches() {
                return Err(PreconditionError::PhraseMismatch.into());
            }
            state.in_flight = true;
            state.error = None;
            state.attempt.typed().to_string()
        };
        let _in_flight = InFlight(self);

        info!("account deletion requested");

        match self.accounts.delete_account(&confirmation).await {
            Ok(()) => {
                info!("account deleted; signing out");
                self.unmount_gates();
                if let Err(e) = self.sessions.sign_out().await {
                    error!(error = %e, "sign-out after account deletion failed");
                }
                self.lock().take();

                if self.mount.is_alive() {
                    self.navigator.navigate(Route::Landing, NavigateOptions::replace());
                } else {
                    debug!("view gone; skipping post-deletion redirect");
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "account deletion failed");
                if let Some(state) = self.lock().as_mut() {
                    let message = if e.message().is_empty() {
                        DELETE_FALLBACK_MESSAGE.to_string()
                    } else {
                        e.message().to_string()
                    };
                    state.error = Some(message);
                }
                Err(e.into())
            }
        }
    }

    /// The hosting view is gone: discard the attempt and stop UI effects.
    ///
    /// A deletion already in flight still completes and still signs out.
    pub fn teardown(&self) {
        if self.mount.teardown() {
            self.lock().take();
            debug!("account deletion controller torn down");
        }
    }
}

impl Drop for AccountDeletion {
    fn drop(&mut self) {
        self.teardown();
    }
}
