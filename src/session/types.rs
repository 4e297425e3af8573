//! Session record and cache entry types.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// Durable session record surviving restarts.
///
/// Never written without an identity; absence of the stored record means
/// "no durable session."
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    /// The principal this session belongs to.
    pub identity: Identity,

    /// Session expiry time.
    pub expires_at: DateTime<Utc>,
}

impl PersistedSession {
    /// Create a record expiring `ttl` from now.
    pub fn new(identity: Identity, ttl: Duration) -> Self {
        Self {
            identity,
            expires_at: Utc::now() + chrono::Duration::seconds(ttl.as_secs() as i64),
        }
    }

    /// Check if the record is expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// How long ago the backend last confirmed this session, assuming it was
    /// written with the given lifetime.
    pub fn age_since_confirmation(&self, lifetime: chrono::Duration) -> chrono::Duration {
        lifetime - (self.expires_at - Utc::now())
    }
}

/// Last server-confirmed login state. Process memory only; lost on restart.
///
/// `checked_at` uses the monotonic clock, so it is non-decreasing across
/// successive entries within one process lifetime.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Identity confirmed by the last check, if any.
    pub identity: Option<Identity>,

    /// When the backend last answered.
    pub checked_at: Instant,

    /// Whether that answer was "logged in".
    pub is_valid: bool,
}
