//! Ordered, idempotent schema migrations.
//!
//! Each module owns a tree of `{number}.sql` scripts and a watermark stored
//! in the core metadata table. [`engine::Migrator`] applies the scripts
//! after the watermark in numeric order, one at a time, advancing the
//! watermark after each success.

pub mod discovery;
pub mod engine;

use strongbox_types::error::RepositoryError;
use strongbox_types::migration::MigrationScript;

/// Executes migration script bodies against the store.
///
/// Implementations should run a body atomically (one transaction) so a
/// failed script leaves nothing behind and can be retried verbatim.
pub trait MigrationTarget: Send + Sync {
    fn execute_script(
        &self,
        script: &MigrationScript,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
