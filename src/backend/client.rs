//! Backend client seam and its reqwest implementation.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::capability::{CredentialCapabilityTable, OP_LOGIN, OP_LOGIN_STATUS, OP_LOGOUT};
use super::protocol::{decode_login, decode_login_status, LoginCheck, LoginOutcome};
use crate::config::SessionConfig;
use crate::error::SessionError;

/// The three logical operations the console backend exposes for
/// authentication. Implemented over HTTP in production, scripted in tests.
#[async_trait]
pub trait LoginBackend: Send + Sync {
    /// Ask the backend whether the current client session is live.
    async fn check_login(&self) -> Result<LoginCheck, SessionError>;

    /// Submit credentials. The password arrives pre-encrypted by the caller.
    async fn login(
        &self,
        user_name: &str,
        encrypted_password: &str,
    ) -> Result<LoginOutcome, SessionError>;

    /// Terminate the backend session. Best-effort; callers tolerate failure.
    async fn logout(&self) -> Result<(), SessionError>;
}

/// HTTP backend speaking the console's `{status, ...}` JSON envelopes.
///
/// Keeps two clients: one with a cookie store for credentialed operations,
/// one without. The capability table picks per operation.
pub struct HttpBackend {
    base_url: String,
    login_status_path: String,
    login_path: String,
    logout_path: String,
    capabilities: CredentialCapabilityTable,
    credentialed: reqwest::Client,
    plain: reqwest::Client,
}

impl HttpBackend {
    /// Build the backend from configuration.
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        let timeout = config.request_timeout();
        let credentialed = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| SessionError::Network(format!("failed to create HTTP client: {e}")))?;
        let plain = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            login_status_path: config.login_status_path.clone(),
            login_path: config.login_path.clone(),
            logout_path: config.logout_path.clone(),
            capabilities: CredentialCapabilityTable::new(&config.credentialed_operations),
            credentialed,
            plain,
        })
    }

    fn client_for(&self, operation: &str) -> &reqwest::Client {
        if self.capabilities.supports_credentials(operation) {
            &self.credentialed
        } else {
            &self.plain
        }
    }

    async fn post(&self, operation: &str, path: &str, body: &Value) -> Result<Value, SessionError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(
            operation,
            url = %url,
            credentialed = self.capabilities.supports_credentials(operation),
            "Calling backend"
        );

        let response = self
            .client_for(operation)
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| SessionError::Network(format!("{operation} request failed: {e}")))?;

        let status = response.status();
        if status.is_server_error() {
            // Backend trouble is indistinguishable from unreachability for
            // our purposes; neither revokes the session.
            return Err(SessionError::Network(format!(
                "{operation} returned status {status}"
            )));
        }
        if !status.is_success() {
            return Err(SessionError::BackendRejected(format!(
                "{operation} returned status {status}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| SessionError::BackendRejected(format!("{operation} body unreadable: {e}")))
    }
}

#[async_trait]
impl LoginBackend for HttpBackend {
    async fn check_login(&self) -> Result<LoginCheck, SessionError> {
        let body = self
            .post(OP_LOGIN_STATUS, &self.login_status_path, &json!({}))
            .await?;
        decode_login_status(&body)
    }

    async fn login(
        &self,
        user_name: &str,
        encrypted_password: &str,
    ) -> Result<LoginOutcome, SessionError> {
        let body = self
            .post(
                OP_LOGIN,
                &self.login_path,
                &json!({"userName": user_name, "password": encrypted_password}),
            )
            .await?;
        decode_login(&body)
    }

    async fn logout(&self) -> Result<(), SessionError> {
        // The body is not relied upon, only that the call went through.
        self.post(OP_LOGOUT, &self.logout_path, &json!({})).await?;
        Ok(())
    }
}
