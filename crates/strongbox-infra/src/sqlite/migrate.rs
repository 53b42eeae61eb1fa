//! Migration target that runs script bodies on the store's connection.

use sqlx::Executor;
use strongbox_core::migration::MigrationTarget;
use strongbox_types::error::RepositoryError;
use strongbox_types::migration::MigrationScript;

use super::map_sqlx_error;
use super::pool::DatabasePool;

/// Executes each script as one multi-statement batch.
///
/// Scripts are wrapped in a transaction, so a failing statement rolls back
/// the whole script and it can be retried verbatim. Scripts that manage
/// their own transaction (or issue a `PRAGMA`, which SQLite ignores inside
/// one) run unwrapped and are responsible for their own atomicity.
pub struct SqliteMigrationTarget {
    pool: DatabasePool,
}

impl SqliteMigrationTarget {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn execute_wrapped(&self, body: &str) -> Result<(), RepositoryError> {
        let mut tx = self.pool.pool.begin().await.map_err(map_sqlx_error)?;
        Executor::execute(&mut *tx, sqlx::raw_sql(body))
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn execute_unwrapped(&self, body: &str) -> Result<(), RepositoryError> {
        let mut conn = self.pool.pool.acquire().await.map_err(map_sqlx_error)?;
        let result = Executor::execute(&mut *conn, sqlx::raw_sql(body)).await;

        if let Err(err) = result {
            // A script that failed between its own BEGIN and COMMIT would
            // otherwise leave the shared connection inside a transaction.
            if let Err(rollback) = Executor::execute(&mut *conn, "ROLLBACK").await {
                tracing::trace!("no open transaction to roll back: {rollback}");
            }
            return Err(map_sqlx_error(err));
        }
        Ok(())
    }
}

impl MigrationTarget for SqliteMigrationTarget {
    async fn execute_script(&self, script: &MigrationScript) -> Result<(), RepositoryError> {
        let self_managed = manages_own_transaction(&script.body);
        if self_managed {
            self.execute_unwrapped(&script.body).await?;
        } else {
            self.execute_wrapped(&script.body).await?;
        }
        tracing::debug!(
            sequence = script.sequence,
            path = %script.path,
            self_managed,
            "executed migration script"
        );
        Ok(())
    }
}

/// Whether any statement of `body` controls transactions or sets a pragma.
///
/// Statements are split on `;` after dropping `--` line comments, which is
/// enough for the keywords checked here.
fn manages_own_transaction(body: &str) -> bool {
    let code: String = body
        .lines()
        .map(|line| line.split("--").next().unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n");

    code.split(';').any(|statement| {
        let keyword = statement
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        matches!(
            keyword.as_str(),
            "BEGIN" | "COMMIT" | "ROLLBACK" | "SAVEPOINT" | "RELEASE" | "PRAGMA"
        )
    })
}
