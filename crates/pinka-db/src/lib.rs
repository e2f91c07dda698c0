pub mod migrations;
pub mod models;
pub mod queries;

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::Connection;
use thiserror::Error;
use tracing::info;

/// How long a storage call may sit on a locked database before it fails.
/// A timeout surfaces as `StoreError::Unavailable` — never a silent retry.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StoreError {
    /// Every allocation attempt collided with a stored kid.
    #[error("kid space exhausted after {0} attempts")]
    AllocationExhausted(u32),
    /// The kid uniqueness constraint rejected a persisted identifier.
    /// Retryable by allocating a fresh kid.
    #[error("kid already persisted: {0}")]
    DuplicateIdentifier(String),
    #[error("store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),
    #[error("store lock poisoned")]
    LockPoisoned,
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let db = Self::init(conn)?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&conn)
    }
}
