//! Session and user identity as delivered by the identity provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use careerdesk_core::UserId;

/// Bearer credential of a session.
///
/// `Debug` is redacted so tokens never reach logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for attaching to a privileged request.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Identity attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,

    #[serde(default)]
    pub email: Option<String>,

    /// When the user confirmed their email. Absent until verified.
    ///
    /// Providers sometimes send an empty string instead of `null`; both
    /// decode to `None`.
    #[serde(default, deserialize_with = "deserialize_confirmed_at")]
    pub email_confirmed_at: Option<DateTime<Utc>>,
}

impl UserIdentity {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: Some(email.into()),
            email_confirmed_at: None,
        }
    }

    pub fn confirmed_at(mut self, at: DateTime<Utc>) -> Self {
        self.email_confirmed_at = Some(at);
        self
    }

    pub fn is_email_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

/// Credential bundle owned by the identity provider.
///
/// Consumers only ever hold snapshots of it; it is never mutated locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: AccessToken,
    pub user: UserIdentity,
}

impl Session {
    pub fn new(access_token: AccessToken, user: UserIdentity) -> Self {
        Self { access_token, user }
    }

    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    pub fn email(&self) -> Option<&str> {
        self.user.email.as_deref().filter(|e| !e.trim().is_empty())
    }
}

fn deserialize_confirmed_at<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match DateTime::parse_from_rfc3339(trimmed) {
        Ok(at) => Ok(Some(at.with_timezone(&Utc))),
        Err(e) => {
            // Unreadable timestamps are treated as unconfirmed.
            tracing::warn!(value = trimmed, error = %e, "unparseable email_confirmed_at");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_json(confirmed: serde_json::Value) -> serde_json::Value {
        json!({
            "access_token": "tok-123",
            "user": {
                "id": "0190a6e2-7b3c-7d4e-8f00-112233445566",
                "email": "alice@example.com",
                "email_confirmed_at": confirmed,
            }
        })
    }

    #[test]
    fn decodes_confirmed_timestamp() {
        let session: Session = serde_json::from_value(user_json(json!("2024-01-01T00:00:00Z"))).unwrap();
        let at = session.user.email_confirmed_at.unwrap();
        assert_eq!(at.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert!(session.user.is_email_confirmed());
    }

    #[test]
    fn empty_string_is_unconfirmed() {
        let session: Session = serde_json::from_value(user_json(json!(""))).unwrap();
        assert!(session.user.email_confirmed_at.is_none());
    }

    #[test]
    fn null_and_missing_are_unconfirmed() {
        let session: Session = serde_json::from_value(user_json(json!(null))).unwrap();
        assert!(session.user.email_confirmed_at.is_none());

        let session: Session = serde_json::from_value(json!({
            "access_token": "tok",
            "user": { "id": "0190a6e2-7b3c-7d4e-8f00-112233445566" }
        }))
        .unwrap();
        assert!(session.user.email_confirmed_at.is_none());
        assert!(session.email().is_none());
    }

    #[test]
    fn garbage_timestamp_is_unconfirmed() {
        let session: Session = serde_json::from_value(user_json(json!("yesterday"))).unwrap();
        assert!(session.user.email_confirmed_at.is_none());
    }

    #[test]
    fn token_is_redacted_in_debug() {
        let session: Session = serde_json::from_value(user_json(json!(null))).unwrap();
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("tok-123"));
        assert!(rendered.contains("AccessToken(***)"));
        assert_eq!(session.access_token.expose(), "tok-123");
    }
}
