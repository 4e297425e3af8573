//! Durable session record backed by redb embedded database.
//!
//! Holds at most one record under a fixed key. Expired or unparsable
//! records are cleared on load; storage failures are reported to the caller,
//! who treats them as "no session."

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use redb::{Database, TableDefinition};
use tracing::{debug, warn};

use super::types::PersistedSession;
use crate::identity::Identity;

/// redb table for the session record (key: fixed namespace, value: JSON bytes).
const SESSION_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("console_session");

/// Fixed namespace key. One record per store.
const SESSION_KEY: &str = "adconsole.session";

/// Durable store for the one session record of this client.
pub struct PersistedSessionStore {
    db: Database,
}

impl PersistedSessionStore {
    /// Open or create a session store at the given path.
    pub fn open(path: PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }
        }

        let db = Database::create(&path)
            .with_context(|| format!("Failed to open session database: {:?}", path))?;

        // Initialize table
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(SESSION_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Write a record expiring `ttl` from now, overwriting any prior value.
    pub fn save(&self, identity: &Identity, ttl: Duration) -> Result<()> {
        let record = PersistedSession::new(identity.clone(), ttl);
        let data = serde_json::to_vec(&record).context("Failed to serialize session record")?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSION_TABLE)?;
            table.insert(SESSION_KEY, data.as_slice())?;
        }
        write_txn.commit()?;

        debug!(
            user = %identity.user_name,
            expires_at = %record.expires_at,
            "Persisted session record"
        );

        Ok(())
    }

    /// Read the stored record.
    ///
    /// Returns `None` when the key is absent, the value does not parse, or
    /// the record is expired; the latter two also remove the stored value.
    pub fn load(&self) -> Result<Option<PersistedSession>> {
        let raw = {
            let read_txn = self.db.begin_read()?;
            let table = read_txn.open_table(SESSION_TABLE)?;
            table.get(SESSION_KEY)?.map(|value| value.value().to_vec())
        };

        let Some(bytes) = raw else {
            return Ok(None);
        };

        let record: PersistedSession = match serde_json::from_slice(&bytes) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Dropping unparsable session record");
                self.clear()?;
                return Ok(None);
            }
        };

        if record.is_expired() {
            debug!(expires_at = %record.expires_at, "Dropping expired session record");
            self.clear()?;
            return Ok(None);
        }

        Ok(Some(record))
    }

    /// Remove the stored record.
    pub fn clear(&self) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSION_TABLE)?;
            table.remove(SESSION_KEY)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Whether any bytes are stored under the session key.
    #[cfg(test)]
    fn has_record(&self) -> bool {
        let read_txn = self.db.begin_read().unwrap();
        let table = read_txn.open_table(SESSION_TABLE).unwrap();
        table.get(SESSION_KEY).unwrap().is_some()
    }

    /// Store raw bytes under the session key.
    #[cfg(test)]
    fn put_raw(&self, bytes: &[u8]) {
        let write_txn = self.db.begin_write().unwrap();
        {
            let mut table = write_txn.open_table(SESSION_TABLE).unwrap();
            table.insert(SESSION_KEY, bytes).unwrap();
        }
        write_txn.commit().unwrap();
    }
}
