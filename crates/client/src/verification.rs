//! Verification-pending view: resend the signup email or log out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, error, info, warn};

use careerdesk_core::{ActionError, ActionResult, PreconditionError};

use crate::lifecycle::BusyGuard;
use crate::provider::SessionProvider;
use crate::route::{NavigateOptions, Navigator, Route};
use crate::services::AccountService;

pub const RESENT_MESSAGE: &str = "Verification email resent! Please check your inbox.";
pub const RESEND_FALLBACK_MESSAGE: &str = "Failed to resend email.";

/// Banner shown after a resend attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResendNotice {
    Sent(String),
    Failed(String),
}

impl ResendNotice {
    pub fn message(&self) -> &str {
        match self {
            ResendNotice::Sent(m) | ResendNotice::Failed(m) => m,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResendNotice::Sent(_))
    }
}

pub struct VerificationPage {
    sessions: Arc<dyn SessionProvider>,
    accounts: Arc<dyn AccountService>,
    navigator: Arc<dyn Navigator>,
    sending: AtomicBool,
    notice: Mutex<Option<ResendNotice>>,
}

impl VerificationPage {
    pub fn new(
        sessions: Arc<dyn SessionProvider>,
        accounts: Arc<dyn AccountService>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            sessions,
            accounts,
            navigator,
            sending: AtomicBool::new(false),
            notice: Mutex::new(None),
        }
    }

    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::Acquire)
    }

    pub fn notice(&self) -> Option<ResendNotice> {
        self.notice
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_notice(&self, notice: ResendNotice) {
        *self.notice.lock().unwrap_or_else(PoisonError::into_inner) = Some(notice);
    }

    /// Resend the verification email to the signed-in user's address.
    pub async fn resend(&self) -> ActionResult<()> {
        let Some(_sending) = BusyGuard::acquire(&self.sending) else {
            debug!("verification resend already in flight; ignoring trigger");
            return Err(PreconditionError::InFlight.into());
        };

        let result = self.try_resend().await;
        match &result {
            Ok(()) => {
                info!("verification email resent");
                self.set_notice(ResendNotice::Sent(RESENT_MESSAGE.to_string()));
            }
            Err(e) => {
                warn!(error = %e, "verification email resend failed");
                let message = e.user_message();
                let message = if message.is_empty() {
                    RESEND_FALLBACK_MESSAGE.to_string()
                } else {
                    message
                };
                self.set_notice(ResendNotice::Failed(message));
            }
        }

        result
    }

    async fn try_resend(&self) -> ActionResult<()> {
        let session = self.sessions.fetch_session().await.unwrap_or_else(|e| {
            warn!(error = %e, "session lookup failed before resend");
            None
        });
        let email = session
            .as_ref()
            .and_then(|s| s.email())
            .ok_or(PreconditionError::MissingEmail)?;

        self.accounts
            .resend_verification(email)
            .await
            .map_err(ActionError::from)
    }

    /// Sign out and go to the login view.
    pub async fn log_out(&self) {
        if let Err(e) = self.sessions.sign_out().await {
            error!(error = %e, "sign-out failed");
        }
        self.navigator.navigate(Route::Login, NavigateOptions::push());
    }
}
