//! SQLite storage layer.
//!
//! Everything goes through one single-connection pool, which serializes all
//! reads, writes and migrations without any further locking.

pub mod meta;
pub mod migrate;
pub mod pool;
pub mod store;

use strongbox_types::error::RepositoryError;

/// Primary result codes SQLITE_BUSY and SQLITE_LOCKED.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Classify a sqlx error as transient (busy, locked, pool exhausted) or permanent.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => RepositoryError::Connection,
        sqlx::Error::Database(db) if is_busy_code(db.code().as_deref()) => {
            RepositoryError::Busy(db.message().to_string())
        }
        _ => RepositoryError::Query(err.to_string()),
    }
}

/// SQLite reports extended codes (e.g. 517 = BUSY_SNAPSHOT); the low byte is the primary code.
fn is_busy_code(code: Option<&str>) -> bool {
    code.and_then(|c| c.parse::<i32>().ok())
        .is_some_and(|c| matches!(c & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
}

pub(crate) fn is_missing_table(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.message().starts_with("no such table"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_codes() {
        assert!(is_busy_code(Some("5")));
        assert!(is_busy_code(Some("6")));
        assert!(is_busy_code(Some("517")));
        assert!(is_busy_code(Some("262")));
        assert!(!is_busy_code(Some("19")));
        assert!(!is_busy_code(Some("2067")));
        assert!(!is_busy_code(None));
    }

    #[test]
    fn test_pool_timeout_is_transient() {
        assert!(map_sqlx_error(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!map_sqlx_error(sqlx::Error::RowNotFound).is_transient());
    }
}
