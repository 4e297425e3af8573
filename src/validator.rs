//! Session validation orchestrating the cache, the persisted store and the
//! backend.
//!
//! `check_session` always resolves to a definite answer: cache hits short-
//! circuit the network, confirmed backend answers overwrite local state, and
//! network failures fall back to the persisted session within its grace
//! window before failing closed to logged-out.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::backend::{LoginBackend, LoginCheck, LoginOutcome};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::gate::SingleFlightGate;
use crate::identity::Identity;
use crate::session::{PersistedSession, PersistedSessionStore, ValidationCache};

/// Gate key for login-status round-trips.
const SESSION_CHECK_KEY: &str = "session-check";

/// Definite answer to "is this client logged in".
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub is_logged_in: bool,
    pub identity: Option<Identity>,
}

impl SessionStatus {
    fn logged_in(identity: Identity) -> Self {
        Self {
            is_logged_in: true,
            identity: Some(identity),
        }
    }

    fn logged_out() -> Self {
        Self {
            is_logged_in: false,
            identity: None,
        }
    }
}

/// Outcome of a login attempt.
///
/// `message` distinguishes rejected credentials (the backend's own words)
/// from an unreachable server.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginResult {
    pub success: bool,
    pub identity: Option<Identity>,
    pub message: Option<String>,
}

/// Decides whether the client holds a valid authenticated identity.
///
/// Sole owner of the persisted store, the validation cache and the
/// single-flight gate; nothing else writes to them.
pub struct SessionValidator {
    backend: Arc<dyn LoginBackend>,
    store: PersistedSessionStore,
    cache: ValidationCache,
    gate: SingleFlightGate<SessionStatus>,
    cache_ttl: Duration,
    persisted_ttl: Duration,
    grace: Duration,
}

impl SessionValidator {
    pub fn new(
        backend: Arc<dyn LoginBackend>,
        store: PersistedSessionStore,
        config: &SessionConfig,
    ) -> Self {
        Self {
            backend,
            store,
            cache: ValidationCache::new(),
            gate: SingleFlightGate::new(),
            cache_ttl: config.cache_ttl(),
            persisted_ttl: config.persisted_ttl(),
            grace: config.grace(),
        }
    }

    /// Answer "is the session valid", hitting the network only when the
    /// cached answer is stale. Concurrent calls share one round-trip.
    pub async fn check_session(&self) -> SessionStatus {
        // Fresh confirmed answer: no network.
        if let Some(entry) = self.cache.get(self.cache_ttl) {
            debug!(valid = entry.is_valid, "Session check served from cache");
            return match entry.identity {
                Some(identity) if entry.is_valid => SessionStatus::logged_in(identity),
                _ => SessionStatus::logged_out(),
            };
        }

        let result = self
            .gate
            .run_exclusive(SESSION_CHECK_KEY, || self.confirm_with_backend())
            .await;

        match result {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "Session check did not complete; treating as logged out");
                SessionStatus::logged_out()
            }
        }
    }

    async fn confirm_with_backend(&self) -> Result<SessionStatus, SessionError> {
        let persisted = self.load_persisted();

        match self.backend.check_login().await {
            Ok(LoginCheck::Active(status_identity)) => {
                let identity =
                    status_identity.into_identity(persisted.as_ref().map(|p| &p.identity));
                self.cache.set(Some(identity.clone()), true);
                if let Err(e) = self.store.save(&identity, self.persisted_ttl) {
                    warn!(error = %e, "Failed to refresh persisted session");
                }
                debug!(user = %identity.user_name, "Backend confirmed active session");
                Ok(SessionStatus::logged_in(identity))
            }
            Ok(LoginCheck::NotLoggedIn) => {
                self.clear_local_state("backend reported logged out");
                Ok(SessionStatus::logged_out())
            }
            Err(SessionError::BackendRejected(reason)) => {
                self.clear_local_state(&reason);
                Ok(SessionStatus::logged_out())
            }
            Err(SessionError::Network(reason)) => {
                // The backend did not answer; the persisted session carries
                // us through short outages.
                if let Some(session) = persisted {
                    if self.within_grace(&session) {
                        warn!(
                            error = %reason,
                            user = %session.identity.user_name,
                            "Backend unreachable; trusting persisted session within grace window"
                        );
                        return Ok(SessionStatus::logged_in(session.identity));
                    }
                }
                warn!(error = %reason, "Backend unreachable and no session within grace window");
                Ok(SessionStatus::logged_out())
            }
            Err(e @ SessionError::Storage(_)) => {
                warn!(error = %e, "Session check failed");
                Ok(SessionStatus::logged_out())
            }
        }
    }

    /// Send credentials to the backend. On acceptance the new identity is
    /// written through to cache and store before returning, so an immediate
    /// `check_session` is answered locally. A rejection leaves any prior
    /// session untouched.
    pub async fn login(&self, user_name: &str, encrypted_password: &str) -> LoginResult {
        match self.backend.login(user_name, encrypted_password).await {
            Ok(LoginOutcome::Accepted(identity)) => {
                self.cache.set(Some(identity.clone()), true);
                if let Err(e) = self.store.save(&identity, self.persisted_ttl) {
                    warn!(error = %e, "Failed to persist session after login");
                }
                info!(user = %identity.user_name, role = %identity.role, "Login succeeded");
                LoginResult {
                    success: true,
                    identity: Some(identity),
                    message: None,
                }
            }
            Ok(LoginOutcome::Rejected { message }) => {
                info!(user = user_name, message = %message, "Login rejected");
                LoginResult {
                    success: false,
                    identity: None,
                    message: Some(message),
                }
            }
            Err(SessionError::Network(reason)) => {
                warn!(error = %reason, "Login request failed");
                LoginResult {
                    success: false,
                    identity: None,
                    message: Some("server unreachable, try again later".to_string()),
                }
            }
            Err(e) => {
                warn!(error = %e, "Login request rejected");
                LoginResult {
                    success: false,
                    identity: None,
                    message: Some(e.to_string()),
                }
            }
        }
    }

    /// Terminate the session. The backend call is best-effort; local state
    /// ends logged-out regardless of backend reachability.
    pub async fn logout(&self) {
        if let Err(e) = self.backend.logout().await {
            warn!(error = %e, "Backend logout failed; clearing local state anyway");
        }
        self.clear_local_state("logout requested");
    }

    fn load_persisted(&self) -> Option<PersistedSession> {
        match self.store.load() {
            Ok(session) => session,
            Err(e) => {
                // Storage trouble fails closed to "no session".
                warn!(error = %e, "Failed to read persisted session");
                None
            }
        }
    }

    fn clear_local_state(&self, reason: &str) {
        self.cache.invalidate();
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear persisted session");
        }
        info!(reason, "Cleared local session state");
    }

    fn within_grace(&self, session: &PersistedSession) -> bool {
        let Ok(lifetime) = chrono::Duration::from_std(self.persisted_ttl) else {
            return false;
        };
        let Ok(grace) = chrono::Duration::from_std(self.grace) else {
            return false;
        };
        session.age_since_confirmation(lifetime) <= grace
    }
}
