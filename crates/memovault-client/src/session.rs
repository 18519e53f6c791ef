//! Login token lifecycle for the remote note service.
//!
//! A session wraps the shared settings handle and lazily logs in the first
//! time an authenticated call needs a token. When the API layer sees a 401 it
//! invalidates the cached token and asks the session to log in again, once.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use memovault_core::{Error, Result, ServerConfig, Settings, SettingsStore};

/// Manages the cached login token shared by all authenticated calls.
pub struct AuthSession {
    client: Client,
    settings: Arc<RwLock<Settings>>,
    store: Arc<dyn SettingsStore>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

impl AuthSession {
    /// Create a session over a shared settings handle.
    ///
    /// Token updates are written back into `settings` and persisted through
    /// `store` so they survive restarts.
    pub fn new(
        client: Client,
        settings: Arc<RwLock<Settings>>,
        store: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            client,
            settings,
            store,
        }
    }

    /// Snapshot of the server section of the settings.
    pub async fn server_config(&self) -> ServerConfig {
        self.settings.read().await.server.clone()
    }

    /// Currently cached token, if any.
    pub async fn token(&self) -> Option<String> {
        let settings = self.settings.read().await;
        if settings.server.token.is_empty() {
            None
        } else {
            Some(settings.server.token.clone())
        }
    }

    /// Return a usable token, logging in first when none is cached.
    #[instrument(skip(self), fields(subsystem = "client", component = "session", op = "ensure_token"))]
    pub async fn ensure_token(&self) -> Result<String> {
        if let Some(token) = self.token().await {
            return Ok(token);
        }

        let server = self.server_config().await;
        if !server.has_credentials() {
            return Err(Error::AuthenticationRequired(
                "server URL, username, or password is not configured".to_string(),
            ));
        }

        info!(username = %server.username, "Logging in to remote service");
        let response = self
            .client
            .post(endpoint(&server.base_url, "/api/auth/login/"))
            .timeout(Duration::from_secs(server.timeout_secs))
            .json(&LoginRequest {
                username: &server.username,
                password: &server.password,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            warn!(status, "Login rejected");
            return Err(Error::AuthenticationFailed(format!(
                "login returned {status}: {detail}"
            )));
        }

        let payload: LoginResponse = response.json().await?;
        {
            let mut settings = self.settings.write().await;
            settings.server.token = payload.token.clone();
        }
        self.persist().await;
        debug!("Login succeeded, token cached");
        Ok(payload.token)
    }

    /// Drop the cached token, forcing the next authenticated call to log in
    /// again.
    pub async fn invalidate(&self) {
        {
            let mut settings = self.settings.write().await;
            settings.server.token.clear();
        }
        self.persist().await;
    }

    /// Write settings through the persistence seam. A failed write leaves the
    /// in-memory token usable, so it is logged rather than propagated.
    async fn persist(&self) {
        let snapshot = self.settings.read().await.clone();
        if let Err(e) = self.store.persist(&snapshot).await {
            warn!(error = %e, "Failed to persist settings");
        }
    }
}

/// Join the configured base URL and an absolute API path, tolerating a
/// trailing slash on the base.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
