//! SQLite persistence for the simulated brokerage account.
//!
//! The whole account is stored as one serialized blob under a fixed key,
//! mirroring how the dashboard treats the simulation: a single durable
//! value, written on every mutation, reloaded on startup.
//!
//! Reads are best-effort by design: a missing row, an unparsable payload,
//! an unknown schema version, or a blob older than the staleness window all
//! load as "absent" and the caller starts fresh. Writes surface their
//! errors so the caller can warn that state is not being saved.

use crate::types::Account;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Version of the persisted payload layout. Bump when fields change shape
/// and add a migration arm in [`migrate_payload`].
pub const SCHEMA_VERSION: i64 = 1;

/// Default persistence key. One account exists per key.
pub const DEFAULT_STORE_KEY: &str = "default";

/// Default staleness window: persisted state older than this is discarded
/// on load rather than silently resurrected.
pub const DEFAULT_STALE_AFTER_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Errors surfaced by [`AccountStore::save`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Single-key durable store for the account ledger.
pub struct AccountStore {
    conn: Mutex<Connection>,
    key: String,
    stale_after_ms: i64,
}

impl AccountStore {
    /// Open (or create) the store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
            key: DEFAULT_STORE_KEY.to_string(),
            stale_after_ms: DEFAULT_STALE_AFTER_MS,
        };
        store.init_schema()?;
        info!("Account store initialized");
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn new_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
            key: DEFAULT_STORE_KEY.to_string(),
            stale_after_ms: DEFAULT_STALE_AFTER_MS,
        };
        store.init_schema()?;
        debug!("In-memory account store initialized");
        Ok(store)
    }

    /// Use a different persistence key (one account per key).
    pub fn with_key(mut self, key: &str) -> Self {
        self.key = key.to_string();
        self
    }

    /// Override the staleness window.
    pub fn with_staleness(mut self, stale_after_ms: i64) -> Self {
        self.stale_after_ms = stale_after_ms;
        self
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<(), rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS account_state (
                key TEXT PRIMARY KEY,
                schema_version INTEGER NOT NULL,
                payload TEXT NOT NULL,
                last_updated INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Load the persisted account, or `None` when there is nothing usable.
    ///
    /// "Nothing usable" covers: no row, a read error, an unknown newer
    /// schema version, an unparsable payload, and state older than the
    /// staleness window. None of these are errors to the caller; the
    /// simulation simply starts fresh.
    pub fn load(&self) -> Option<Account> {
        let conn = self.conn.lock().unwrap();

        let row: Option<(i64, String, i64)> = match conn
            .query_row(
                "SELECT schema_version, payload, last_updated
                 FROM account_state WHERE key = ?1",
                params![self.key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
        {
            Ok(row) => row,
            Err(e) => {
                warn!("Account store read failed, starting fresh: {}", e);
                return None;
            }
        };

        let (version, payload, last_updated) = row?;

        let age_ms = chrono::Utc::now().timestamp_millis() - last_updated;
        if age_ms > self.stale_after_ms {
            info!(
                "Persisted account is {}h old (window {}h), discarding",
                age_ms / 3_600_000,
                self.stale_after_ms / 3_600_000
            );
            return None;
        }

        let payload = migrate_payload(version, payload)?;

        match serde_json::from_str::<Account>(&payload) {
            Ok(account) => {
                debug!(
                    "Loaded account under key '{}' ({} positions, {} trades)",
                    self.key,
                    account.positions.len(),
                    account.history.len()
                );
                Some(account)
            }
            Err(e) => {
                warn!("Persisted account is unparsable, starting fresh: {}", e);
                None
            }
        }
    }

    /// Persist the full account under the fixed key.
    ///
    /// The caller refreshes `account.last_updated` before saving; the store
    /// writes it through to the row so the staleness check on the next load
    /// sees the same timestamp the payload carries.
    pub fn save(&self, account: &Account) -> Result<(), StoreError> {
        let payload = serde_json::to_string(account)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO account_state (key, schema_version, payload, last_updated)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET
                schema_version = excluded.schema_version,
                payload = excluded.payload,
                last_updated = excluded.last_updated",
            params![self.key, SCHEMA_VERSION, payload, account.last_updated],
        )?;
        Ok(())
    }

    /// Sabotage the backing table so the next save fails.
    #[cfg(test)]
    pub(crate) fn break_for_tests(&self) {
        let conn = self.conn.lock().unwrap();
        conn.execute("DROP TABLE account_state", []).unwrap();
    }

    /// Overwrite the raw row, bypassing serialization.
    #[cfg(test)]
    fn put_raw_for_tests(&self, version: i64, payload: &str, last_updated: i64) {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO account_state (key, schema_version, payload, last_updated)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET
                schema_version = excluded.schema_version,
                payload = excluded.payload,
                last_updated = excluded.last_updated",
            params![self.key, version, payload, last_updated],
        )
        .unwrap();
    }
}

/// Bring an older payload up to the current schema. Returns `None` for
/// versions this build does not know how to read (including newer ones).
fn migrate_payload(version: i64, payload: String) -> Option<String> {
    match version {
        SCHEMA_VERSION => Some(payload),
        v => {
            warn!(
                "Persisted account has schema version {} (supported: {}), discarding",
                v, SCHEMA_VERSION
            );
            None
        }
    }
}
