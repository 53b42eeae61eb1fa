//! Single-connection SQLite pool in WAL mode.
//!
//! The store assumes a single writer. Capping the pool at one connection
//! makes that hold inside the process: every query, including migration
//! scripts, runs on the same connection in submission order.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

#[derive(Clone)]
pub struct DatabasePool {
    pub pool: SqlitePool,
}

impl DatabasePool {
    /// Open (creating if missing) the database file at `path`.
    ///
    /// Uses WAL journal mode, foreign key enforcement and the given busy timeout.
    pub async fn open(path: &Path, busy_timeout: Duration) -> Result<Self, sqlx::Error> {
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(busy_timeout)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;

        tracing::debug!(path = %path.display(), "opened database");
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
