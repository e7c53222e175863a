//! `careerdesk-client`
//!
//! **Responsibility:** client-side session gating and the few irreversible
//! user actions that depend on it.
//!
//! This crate provides:
//! - The session provider contract and an in-memory provider
//! - The session authorization gate and its race-safe sync driver
//! - Confirmed account deletion
//! - One-shot signed resource links
//! - Verification email resend and the navigation view model
//!
//! The identity provider stays the authority for sessions; nothing here
//! mutates a session except the explicit sign-out after account deletion.

pub mod config;
pub mod confirm;
pub mod deletion;
pub mod gate;
#[cfg(feature = "http")]
pub mod http;
pub mod in_memory;
pub mod lifecycle;
pub mod navigation;
pub mod provider;
pub mod resource;
pub mod route;
pub mod services;
pub mod sync;
pub mod verification;

pub use config::{ClientConfig, ConfigError};
pub use confirm::ConfirmationAttempt;
pub use deletion::{AccountDeletion, DELETE_ACCOUNT_PHRASE, DeletionModal};
pub use gate::{GateHandle, GateView, SessionGate};
#[cfg(feature = "http")]
pub use http::HttpRemote;
pub use in_memory::{
    InMemoryAccountService, InMemoryResourceService, InMemorySessionProvider, RecordingNavigator,
    RecordingOpener,
};
pub use lifecycle::MountHandle;
pub use navigation::{AccountArea, NavLink, NavigationModel, NavigationShell};
pub use provider::{
    AuthChangeEvent, ProviderError, SessionChange, SessionProvider, SessionSubscription,
    Unsubscribe,
};
pub use resource::{LinkOutcome, SignedLinkFetcher};
pub use route::{NavigateOptions, Navigator, Route};
pub use services::{AccountService, LinkOpener, ResourceGrant, ResourceService};
pub use verification::{ResendNotice, VerificationPage};

pub use careerdesk_auth::{AccessToken, AuthorizationVerdict, Session, UserIdentity};
pub use careerdesk_core::{ActionError, ActionResult, PreconditionError, RemoteError};
