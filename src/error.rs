//! Error taxonomy for session management.

use thiserror::Error;

/// Errors surfaced by backend calls and session plumbing.
///
/// Cloneable so a single in-flight failure can be fanned out to every waiter
/// on the single-flight gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The request never produced a definitive answer (DNS, connect, timeout).
    /// Recoverable through the persisted-session grace window.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered and the answer was "no": an explicit rejection or
    /// a response shape we do not recognize. Authoritative, no grace period.
    #[error("backend rejected: {0}")]
    BackendRejected(String),

    /// Durable storage failed. Treated as "no persisted session".
    #[error("storage error: {0}")]
    Storage(String),
}
