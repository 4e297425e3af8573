//! Authenticated identity types.

use serde::{Deserialize, Serialize};

/// Account role as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Map the numeric account `type` field used on the wire.
    pub fn from_account_type(account_type: i64) -> Self {
        match account_type {
            0 => Role::Admin,
            _ => Role::User,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}

/// The authenticated principal for one session.
///
/// Immutable once issued by the backend; replaced wholesale on re-login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Login name. The console uses email addresses.
    pub user_name: String,
    /// Account role.
    pub role: Role,
    /// Numeric account ID when the backend reports one.
    pub user_id: Option<i64>,
}
