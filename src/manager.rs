//! Auth state machine with background revalidation.
//!
//! The single source of truth for identity in the application: UI components
//! read state from here and never touch the persisted store directly.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use crate::backend::{HttpBackend, LoginBackend};
use crate::config::SessionConfig;
use crate::identity::Identity;
use crate::session::PersistedSessionStore;
use crate::validator::{LoginResult, SessionStatus, SessionValidator};

/// Externally observable authentication state.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// No check has completed yet.
    Unknown,
    /// A validation round-trip is in progress.
    Checking,
    /// The backend (or the grace fallback) vouches for this identity.
    Authenticated(Identity),
    /// Definitely logged out.
    Anonymous,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }
}

/// Session manager driving auth state transitions.
///
/// Explicitly constructed, never a global: tests run several isolated
/// instances side by side.
pub struct SessionManager {
    validator: SessionValidator,
    state: watch::Sender<AuthState>,
    revalidation: Mutex<Option<JoinHandle<()>>>,
    revalidate_interval: Duration,
}

impl SessionManager {
    /// Build a manager speaking HTTP to the configured backend.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let backend = HttpBackend::new(config).map_err(|e| anyhow!(e))?;
        Self::with_backend(Arc::new(backend), config)
    }

    /// Build a manager around an arbitrary backend implementation.
    pub fn with_backend(backend: Arc<dyn LoginBackend>, config: &SessionConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow!("invalid session config: {e}"))?;

        let store = PersistedSessionStore::open(config.store_path.clone())
            .context("Failed to open session store")?;
        let (state, _) = watch::channel(AuthState::Unknown);

        Ok(Self {
            validator: SessionValidator::new(backend, store, config),
            state,
            revalidation: Mutex::new(None),
            revalidate_interval: config.revalidate_interval(),
        })
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Current state.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Current identity, if authenticated.
    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Validate the session and apply the resulting state.
    pub async fn check(&self) -> SessionStatus {
        self.transition(AuthState::Checking);
        let status = self.validator.check_session().await;
        self.apply(&status);
        status
    }

    /// Attempt a login. The password arrives pre-encrypted by the caller.
    /// A failed attempt restores the previous state.
    pub async fn login(&self, user_name: &str, encrypted_password: &str) -> LoginResult {
        let previous = self.state();
        self.transition(AuthState::Checking);

        let result = self.validator.login(user_name, encrypted_password).await;

        match &result.identity {
            Some(identity) if result.success => {
                self.transition(AuthState::Authenticated(identity.clone()));
            }
            _ => {
                // Prior session, if any, stays valid after a failed attempt.
                let restored = match previous {
                    AuthState::Checking => AuthState::Anonymous,
                    other => other,
                };
                self.transition(restored);
            }
        }
        result
    }

    /// Log out. Local state always ends `Anonymous`, even when the backend
    /// call fails.
    pub async fn logout(&self) {
        self.transition(AuthState::Checking);
        self.validator.logout().await;
        self.transition(AuthState::Anonymous);
    }

    /// Stop the background revalidation task. Also runs on drop.
    pub fn shutdown(&self) {
        if let Ok(mut slot) = self.revalidation.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
                debug!("Revalidation task stopped");
            }
        }
    }

    fn apply(&self, status: &SessionStatus) {
        match &status.identity {
            Some(identity) if status.is_logged_in => {
                self.transition(AuthState::Authenticated(identity.clone()));
            }
            _ => self.transition(AuthState::Anonymous),
        }
    }

    fn transition(&self, next: AuthState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            match &next {
                AuthState::Authenticated(identity) => {
                    info!(user = %identity.user_name, "Authenticated")
                }
                AuthState::Anonymous => info!("Anonymous"),
                _ => {}
            }
            *current = next;
            true
        });
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawn a background task that periodically revalidates the session,
/// replacing any prior task on the manager.
///
/// The task only confirms while the state is authenticated, and holds a weak
/// reference so dropping the manager stops it; `shutdown` aborts it early.
pub fn spawn_revalidation_task(manager: &Arc<SessionManager>) {
    let weak = Arc::downgrade(manager);
    let period = manager.revalidate_interval;

    let handle = tokio::spawn(async move {
        let mut ticker = interval(period);

        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let Some(manager) = weak.upgrade() else {
                break;
            };

            // Only an authenticated session needs confirming.
            if manager.is_authenticated() {
                let status = manager.check().await;
                if !status.is_logged_in {
                    info!("Background revalidation found the session revoked");
                } else {
                    debug!("Background revalidation confirmed the session");
                }
            }
        }
    });

    if let Ok(mut slot) = manager.revalidation.lock() {
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }
}
