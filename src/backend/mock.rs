//! Scripted backend for validator and manager tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::client::LoginBackend;
use super::protocol::{LoginCheck, LoginOutcome, StatusIdentity};
use crate::error::SessionError;
use crate::identity::{Identity, Role};

/// Backend stub with scripted responses and call counters.
pub(crate) struct MockBackend {
    pub check_response: Mutex<Result<LoginCheck, SessionError>>,
    pub login_response: Mutex<Result<LoginOutcome, SessionError>>,
    pub logout_response: Mutex<Result<(), SessionError>>,
    /// Sleep inserted before answering a status check, to widen the window
    /// in which concurrent callers overlap.
    pub check_delay: Mutex<Option<Duration>>,
    pub check_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            check_response: Mutex::new(Ok(LoginCheck::NotLoggedIn)),
            login_response: Mutex::new(Ok(LoginOutcome::Rejected {
                message: "invalid credentials".to_string(),
            })),
            logout_response: Mutex::new(Ok(())),
            check_delay: Mutex::new(None),
            check_calls: AtomicUsize::new(0),
            login_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
        }
    }

    pub fn identity() -> Identity {
        Identity {
            user_name: "a@x.com".to_string(),
            role: Role::Admin,
            user_id: Some(7),
        }
    }

    pub fn respond_active(&self) {
        *self.check_response.lock().unwrap() = Ok(LoginCheck::Active(StatusIdentity {
            user_id: 7,
            user_name: Some("a@x.com".to_string()),
            role: Some(Role::Admin),
        }));
    }

    pub fn respond_logged_out(&self) {
        *self.check_response.lock().unwrap() = Ok(LoginCheck::NotLoggedIn);
    }

    pub fn respond_network_down(&self) {
        let error = SessionError::Network("connection refused".to_string());
        *self.check_response.lock().unwrap() = Err(error.clone());
        *self.login_response.lock().unwrap() = Err(error.clone());
        *self.logout_response.lock().unwrap() = Err(error);
    }

    pub fn accept_login(&self) {
        *self.login_response.lock().unwrap() = Ok(LoginOutcome::Accepted(Self::identity()));
    }

    pub fn set_check_delay(&self, delay: Duration) {
        *self.check_delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl LoginBackend for MockBackend {
    async fn check_login(&self) -> Result<LoginCheck, SessionError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.check_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_response.lock().unwrap().clone()
    }

    async fn login(
        &self,
        _user_name: &str,
        _encrypted_password: &str,
    ) -> Result<LoginOutcome, SessionError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.login_response.lock().unwrap().clone()
    }

    async fn logout(&self) -> Result<(), SessionError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        self.logout_response.lock().unwrap().clone()
    }
}
