//! Which backend operations accept credentialed (cookie-bearing) requests.
//!
//! The backend's cross-origin policy is not uniform: some operations accept
//! credentialed requests, others reject them outright. This table is the
//! single point of truth for that inconsistency and is consulted before
//! every outgoing call.

use std::collections::HashMap;

/// Logical name of the login-status operation.
pub const OP_LOGIN_STATUS: &str = "isLoggedIn";
/// Logical name of the login operation.
pub const OP_LOGIN: &str = "login";
/// Logical name of the logout operation.
pub const OP_LOGOUT: &str = "logout";

/// Per-operation credential capability. Read-only after construction.
#[derive(Debug, Clone)]
pub struct CredentialCapabilityTable {
    operations: HashMap<String, bool>,
}

impl CredentialCapabilityTable {
    /// Build a table where exactly the listed operations carry credentials.
    pub fn new(credentialed: &[String]) -> Self {
        let operations = credentialed
            .iter()
            .map(|operation| (operation.clone(), true))
            .collect();
        Self { operations }
    }

    /// Whether the operation accepts cookie-bearing requests.
    /// Unknown operations default to non-credentialed.
    pub fn supports_credentials(&self, operation: &str) -> bool {
        self.operations.get(operation).copied().unwrap_or(false)
    }
}

impl Default for CredentialCapabilityTable {
    fn default() -> Self {
        Self::new(&[
            OP_LOGIN_STATUS.to_string(),
            OP_LOGIN.to_string(),
            OP_LOGOUT.to_string(),
        ])
    }
}
