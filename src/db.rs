use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;
use tokio::sync::{Mutex, MutexGuard};
use tracing::info;

/// Owns the SQLite connection. All storage access goes through the mutex so
/// multi-statement writes see a consistent connection.
pub struct DatabaseManager {
    conn: Mutex<Connection>,
}

impl DatabaseManager {
    /// Open (or create) the database file and apply the session pragmas.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening database at {}", path.as_ref().display());
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA foreign_keys=ON;
            "#,
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Apply the embedded schema migration.
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        let migration_sql = include_str!("../migrations/001_create_schema.sql");
        let conn = self.conn.lock().await;
        conn.execute_batch(migration_sql)?;

        info!("Database migrations completed");
        Ok(())
    }

    pub async fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
