//! Backend collaborator: wire protocol, credential capabilities, HTTP client.

mod capability;
mod client;
#[cfg(test)]
pub(crate) mod mock;
mod protocol;

pub use capability::{CredentialCapabilityTable, OP_LOGIN, OP_LOGIN_STATUS, OP_LOGOUT};
pub use client::{HttpBackend, LoginBackend};
pub use protocol::{decode_login, decode_login_status, LoginCheck, LoginOutcome, StatusIdentity};
