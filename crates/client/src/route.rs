//! Routes and the navigation contract.

use serde::{Deserialize, Serialize};

/// Views the core redirects to or links at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Public landing page.
    Landing,
    Login,
    SignUp,
    /// Verification-pending view for signed-in but unconfirmed users.
    VerifyEmail,
    Home,
    CompanyResearch,
    CoverLetter,
    Profile,
    UploadCv,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Login => "/login",
            Route::SignUp => "/signup",
            Route::VerifyEmail => "/verify-email",
            Route::Home => "/home",
            Route::CompanyResearch => "/company-research",
            Route::CoverLetter => "/cover-letter",
            Route::Profile => "/profile",
            Route::UploadCv => "/upload-cv",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let path = match path.trim_end_matches('/') {
            "" => "/",
            p => p,
        };
        [
            Route::Landing,
            Route::Login,
            Route::SignUp,
            Route::VerifyEmail,
            Route::Home,
            Route::CompanyResearch,
            Route::CoverLetter,
            Route::Profile,
            Route::UploadCv,
        ]
        .into_iter()
        .find(|r| r.path() == path)
    }

    /// Whether the route is reachable without a session.
    pub fn is_public(&self) -> bool {
        matches!(
            self,
            Route::Landing | Route::Login | Route::SignUp | Route::VerifyEmail
        )
    }
}

impl core::fmt::Display for Route {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.path())
    }
}

/// History behaviour of a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing a new one.
    pub replace: bool,
}

impl NavigateOptions {
    pub fn replace() -> Self {
        Self { replace: true }
    }

    pub fn push() -> Self {
        Self { replace: false }
    }
}

/// Host router.
///
/// Every redirect issued by the gate or the deletion flow uses
/// [`NavigateOptions::replace`] so the denied view does not stay in history.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: Route, options: NavigateOptions);
}
