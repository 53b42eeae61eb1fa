//! SQLite implementation of the core metadata repository.
//!
//! Rows live in `core_meta (key TEXT PRIMARY KEY, value TEXT)`, created by
//! core migration 1. Before that migration has run the table does not
//! exist; reads treat that as an empty table so the bootstrap can look up
//! its own watermark.

use sqlx::Row;
use strongbox_core::repository::meta::MetaRepository;
use strongbox_types::error::RepositoryError;
use strongbox_types::meta::MetaEntry;

use super::pool::DatabasePool;
use super::{is_missing_table, map_sqlx_error};

pub struct SqliteMetaRepository {
    pool: DatabasePool,
}

impl SqliteMetaRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl MetaRepository for SqliteMetaRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query("SELECT value FROM core_meta WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool.pool)
            .await;

        match row {
            Ok(Some(row)) => row.try_get("value").map(Some).map_err(map_sqlx_error),
            Ok(None) => Ok(None),
            Err(e) if is_missing_table(&e) => Ok(None),
            Err(e) => Err(map_sqlx_error(e)),
        }
    }

    async fn upsert(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO core_meta (key, value) VALUES (?, ?)
               ON CONFLICT (key) DO UPDATE SET value = excluded.value"#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM core_meta WHERE key = ?")
            .bind(key)
            .execute(&self.pool.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<MetaEntry>, RepositoryError> {
        // substr rather than LIKE: keys such as `migration_state-` contain `_`.
        let rows = sqlx::query(
            "SELECT key, value FROM core_meta WHERE substr(key, 1, length(?)) = ? ORDER BY key",
        )
        .bind(prefix)
        .bind(prefix)
        .fetch_all(&self.pool.pool)
        .await;

        let rows = match rows {
            Ok(rows) => rows,
            Err(e) if is_missing_table(&e) => return Ok(Vec::new()),
            Err(e) => return Err(map_sqlx_error(e)),
        };

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(MetaEntry {
                key: row.try_get("key").map_err(map_sqlx_error)?,
                value: row.try_get("value").map_err(map_sqlx_error)?,
            });
        }
        Ok(entries)
    }
}
