//! Privileged remote functions over HTTP.
//!
//! Endpoints (relative to [`ClientConfig::api_url`]):
//!
//! - `POST /functions/v1/delete-account`: body `{"confirmation": ...}`
//! - `POST /functions/v1/download-cv`: bearer token, returns a signed link
//! - `POST /auth/v1/resend`: body `{"type": "signup", "email": ...}`
//!
//! Calls carry the current session token when one exists and the project
//! `apikey` when configured. There is no retry: callers decide.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use careerdesk_auth::AccessToken;
use careerdesk_core::RemoteError;

use crate::config::{ClientConfig, ConfigError};
use crate::provider::SessionProvider;
use crate::services::{AccountService, ResourceGrant, ResourceService};

const DELETE_ACCOUNT_PATH: &str = "/functions/v1/delete-account";
const DOWNLOAD_CV_PATH: &str = "/functions/v1/download-cv";
const RESEND_PATH: &str = "/auth/v1/resend";

pub struct HttpRemote {
    client: reqwest::Client,
    config: ClientConfig,
    sessions: Arc<dyn SessionProvider>,
}

impl HttpRemote {
    pub fn new(config: ClientConfig, sessions: Arc<dyn SessionProvider>) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(Self {
            client,
            config,
            sessions,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn post(&self, path: &str, token: Option<&AccessToken>) -> reqwest::RequestBuilder {
        let mut req = self.client.post(self.config.endpoint(path));
        if let Some(key) = &self.config.anon_key {
            req = req.header("apikey", key);
        }
        if let Some(token) = token {
            req = req.bearer_auth(token.expose());
        }
        req
    }

    /// Token of the current session, if any. Lookup failures send the call
    /// unauthenticated and let the server refuse it.
    async fn current_token(&self) -> Option<AccessToken> {
        match self.sessions.fetch_session().await {
            Ok(session) => session.map(|s| s.access_token),
            Err(e) => {
                debug!(error = %e, "no session token for remote call");
                None
            }
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, RemoteError> {
        let resp = req
            .send()
            .await
            .map_err(|e| RemoteError::new(e.to_string()))?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(remote_error(resp).await)
        }
    }
}

/// Turn a non-2xx response into the message the user should see.
async fn remote_error(resp: reqwest::Response) -> RemoteError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();

    let from_json = serde_json::from_str::<Value>(&body).ok().and_then(|v| {
        ["message", "error", "msg"]
            .iter()
            .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_owned))
    });

    let message = match from_json {
        Some(m) => m,
        None if !body.trim().is_empty() => body,
        None => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };
    debug!(status = status.as_u16(), %message, "remote call failed");
    RemoteError::new(message)
}

#[async_trait]
impl AccountService for HttpRemote {
    async fn delete_account(&self, confirmation: &str) -> Result<(), RemoteError> {
        let token = self.current_token().await;
        let req = self
            .post(DELETE_ACCOUNT_PATH, token.as_ref())
            .json(&json!({ "confirmation": confirmation }));
        self.send(req).await?;
        Ok(())
    }

    async fn resend_verification(&self, email: &str) -> Result<(), RemoteError> {
        let req = self
            .post(RESEND_PATH, None)
            .json(&json!({ "type": "signup", "email": email }));
        self.send(req).await?;
        Ok(())
    }
}

#[async_trait]
impl ResourceService for HttpRemote {
    async fn signed_link(&self, token: &AccessToken) -> Result<ResourceGrant, RemoteError> {
        let resp = self.send(self.post(DOWNLOAD_CV_PATH, Some(token))).await?;
        resp.json::<ResourceGrant>()
            .await
            .map_err(|e| RemoteError::new(format!("invalid signed link response: {e}")))
    }
}
