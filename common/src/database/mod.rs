//! sqlite access for the pipeline
//!
//! one connection is shared behind a mutex. callers on an async runtime are
//! expected to reach it through `spawn_blocking`.

pub mod executor;
pub mod format;
pub mod schema;

pub use executor::QueryOutcome;

use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub const DEFAULT_SAMPLE_ROWS: usize = 3;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// rows per table included in the schema description
    pub sample_rows: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sample_rows: DEFAULT_SAMPLE_ROWS,
        }
    }
}

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    config: DatabaseConfig,
}

impl Database {
    pub fn open(path: impl AsRef<Path>, config: DatabaseConfig) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        tracing::info!("opened database {}", path.display());
        Ok(Self::from_connection(conn, config))
    }

    pub fn open_in_memory(config: DatabaseConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn, config))
    }

    pub fn from_connection(conn: Connection, config: DatabaseConfig) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// run a batch of statements, e.g. to seed a fixture
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.lock().execute_batch(sql)?;
        Ok(())
    }

    // a panic while holding the lock leaves the connection itself intact
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
