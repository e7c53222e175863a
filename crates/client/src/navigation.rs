//! Navigation shell view model.
//!
//! Reads session state on its own (not through a gate) and decides which
//! links the top bar and the mobile drawer show.

use tracing::warn;

use careerdesk_auth::{Session, UserIdentity};

use crate::provider::{SessionChange, SessionProvider};
use crate::route::Route;

const PRIMARY_LINKS: [(Route, &str); 3] = [
    (Route::Home, "Dashboard"),
    (Route::CompanyResearch, "Skills & Research"),
    (Route::CoverLetter, "Cover Letters"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub route: Route,
    pub label: &'static str,
    pub active: bool,
}

/// Right-hand side of the bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountArea {
    /// Signed in: avatar menu.
    Menu { email: Option<String> },
    /// Signed out: log in / sign up.
    Guest { log_in: Route, sign_up: Route },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationModel {
    pub links: Vec<NavLink>,
    pub account: AccountArea,
    pub menu_open: bool,
}

#[derive(Debug, Clone)]
pub struct NavigationShell {
    current_path: String,
    user: Option<UserIdentity>,
    menu_open: bool,
}

impl NavigationShell {
    pub fn new(current_path: impl Into<String>) -> Self {
        Self {
            current_path: current_path.into(),
            user: None,
            menu_open: false,
        }
    }

    /// Load the current user from the provider. Errors show the guest bar.
    pub async fn refresh(&mut self, provider: &dyn SessionProvider) {
        let session = provider.fetch_session().await.unwrap_or_else(|e| {
            warn!(error = %e, "navigation could not load session");
            None
        });
        self.set_session(session.as_ref());
    }

    pub fn observe(&mut self, change: &SessionChange) {
        self.set_session(change.session.as_ref());
    }

    fn set_session(&mut self, session: Option<&Session>) {
        self.user = session.map(|s| s.user.clone());
    }

    /// The drawer closes on every route change.
    pub fn on_route_change(&mut self, path: impl Into<String>) {
        self.current_path = path.into();
        self.menu_open = false;
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }

    pub fn model(&self) -> NavigationModel {
        let links = PRIMARY_LINKS
            .iter()
            .map(|&(route, label)| NavLink {
                route,
                label,
                active: route.path() == self.current_path,
            })
            .collect();

        let account = match &self.user {
            Some(user) => AccountArea::Menu {
                email: user.email.clone(),
            },
            None => AccountArea::Guest {
                log_in: Route::Login,
                sign_up: Route::SignUp,
            },
        };

        NavigationModel {
            links,
            account,
            menu_open: self.menu_open,
        }
    }
}
