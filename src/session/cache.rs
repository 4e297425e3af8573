//! Short-TTL memory of the last server-confirmed login state.
//!
//! Avoids redundant network calls across rapid successive checks. Advisory
//! only: an entry older than the caller's freshness window is never used.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::identity::Identity;
use crate::session::types::CacheEntry;

/// In-memory record of the last confirmed login state.
pub struct ValidationCache {
    entry: RwLock<Option<CacheEntry>>,
}

impl ValidationCache {
    pub fn new() -> Self {
        Self {
            entry: RwLock::new(None),
        }
    }

    /// Return the entry only if it is at most `max_age` old.
    pub fn get(&self, max_age: Duration) -> Option<CacheEntry> {
        let guard = self.entry.read().ok()?;
        let entry = guard.as_ref()?;
        if entry.checked_at.elapsed() <= max_age {
            Some(entry.clone())
        } else {
            None
        }
    }

    /// Record a fresh entry stamped now.
    pub fn set(&self, identity: Option<Identity>, is_valid: bool) {
        if let Ok(mut guard) = self.entry.write() {
            *guard = Some(CacheEntry {
                identity,
                checked_at: Instant::now(),
                is_valid,
            });
        }
    }

    /// Clear the entry, forcing the next check past the cache.
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.entry.write() {
            *guard = None;
        }
    }
}

impl Default for ValidationCache {
    fn default() -> Self {
        Self::new()
    }
}
