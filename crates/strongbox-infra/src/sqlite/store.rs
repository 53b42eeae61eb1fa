//! Opening the store: pool, core bootstrap, and the migrator wiring.

use std::path::Path;
use std::time::Duration;

use strongbox_core::crypto::cipher::Sealer;
use strongbox_core::migration::engine::Migrator;
use strongbox_core::retry::RetryPolicy;
use strongbox_core::service::meta::MetaStore;
use strongbox_types::config::StoreConfig;
use strongbox_types::error::{MigrationError, StoreError};
use strongbox_types::migration::{GapPolicy, MigrationReport, ScriptDir};

use super::meta::SqliteMetaRepository;
use super::migrate::SqliteMigrationTarget;
use super::pool::DatabasePool;

/// Module name of the store's own bootstrap schema.
pub const CORE_MODULE: &str = "core";

/// The core bootstrap scripts, embedded in the binary.
pub fn core_scripts() -> ScriptDir {
    ScriptDir::new(CORE_MODULE).file("1.sql", include_str!("../../migrations/core/1.sql"))
}

/// An open, bootstrapped store.
pub struct Store {
    pool: DatabasePool,
    meta: MetaStore<SqliteMetaRepository>,
    target: SqliteMigrationTarget,
    gap_policy: GapPolicy,
}

impl Store {
    /// Open the database at `path` and apply the core bootstrap migrations.
    ///
    /// The returned store is locked; call [`Store::unlock`] before using the
    /// encrypted accessors.
    pub async fn open(path: &Path, config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = DatabasePool::open(path, Duration::from_millis(config.busy_timeout_ms))
            .await
            .map_err(|e| StoreError::Open(e.to_string()))?;

        let store = Self {
            meta: MetaStore::new(SqliteMetaRepository::new(pool.clone()))
                .with_retry(RetryPolicy::from(config.retry)),
            target: SqliteMigrationTarget::new(pool.clone()),
            gap_policy: config.migrations.gap_policy,
            pool,
        };

        let report = store.migrate(CORE_MODULE, &core_scripts()).await?;
        if !report.applied.is_empty() {
            tracing::info!(watermark = report.watermark, "bootstrapped core schema");
        }
        Ok(store)
    }

    /// Attach the process-wide passphrase.
    pub fn unlock(self, sealer: Sealer) -> Self {
        Self {
            meta: self.meta.unlocked(sealer),
            ..self
        }
    }

    pub fn meta(&self) -> &MetaStore<SqliteMetaRepository> {
        &self.meta
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    pub fn migrator(&self) -> Migrator<'_, SqliteMetaRepository, SqliteMigrationTarget> {
        Migrator::new(&self.meta, &self.target).with_gap_policy(self.gap_policy)
    }

    /// Bring `module` up to date with `scripts`.
    pub async fn migrate(
        &self,
        module: &str,
        scripts: &ScriptDir,
    ) -> Result<MigrationReport, MigrationError> {
        self.migrator().migrate(module, scripts).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
