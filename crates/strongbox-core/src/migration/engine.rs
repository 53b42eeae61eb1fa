//! Watermark-driven migration application.
//!
//! For a module, the engine reads `migration_state-{module}` (absent means 0)
//! and repeatedly executes script `watermark + 1`, persisting the new
//! watermark after each success. It stops at the first missing number.
//! A failed script aborts the call without touching the watermark, so the
//! same script is retried on the next start.

use std::collections::BTreeMap;

use strongbox_types::error::{MigrationError, RepositoryError};
use strongbox_types::meta::watermark_key;
use strongbox_types::migration::{GapPolicy, MigrationReport, MigrationScript, ScriptDir};

use super::MigrationTarget;
use super::discovery::discover;
use crate::repository::meta::MetaRepository;
use crate::retry::retry_transient;
use crate::service::meta::MetaStore;

/// Applies module migrations against a target, tracking progress in the
/// core metadata store.
///
/// Callers must not interleave other reads or writes on a module's tables
/// with an in-flight `migrate` for that module.
pub struct Migrator<'a, R, T> {
    meta: &'a MetaStore<R>,
    target: &'a T,
    gap_policy: GapPolicy,
}

impl<'a, R: MetaRepository, T: MigrationTarget> Migrator<'a, R, T> {
    pub fn new(meta: &'a MetaStore<R>, target: &'a T) -> Self {
        Self {
            meta,
            target,
            gap_policy: GapPolicy::default(),
        }
    }

    pub fn with_gap_policy(mut self, gap_policy: GapPolicy) -> Self {
        self.gap_policy = gap_policy;
        self
    }

    /// Current watermark for a module (0 if it never migrated).
    pub async fn watermark(&self, module: &str) -> Result<u64, MigrationError> {
        Ok(self.meta.read_meta_or_default(&watermark_key(module)).await?)
    }

    /// Apply every contiguous unapplied script of `module` from `scripts`.
    ///
    /// Calling this again with the same scripts is a no-op.
    pub async fn migrate(
        &self,
        module: &str,
        scripts: &ScriptDir,
    ) -> Result<MigrationReport, MigrationError> {
        let scripts = discover(scripts)?;
        let starting_watermark = self.watermark(module).await?;

        let missing = first_missing(&scripts, starting_watermark);
        let stranded = missing
            .map(|missing| stranded_from(&scripts, missing))
            .unwrap_or_default();
        if let (Some(missing), Some(&first_stranded)) = (missing, stranded.first()) {
            match self.gap_policy {
                GapPolicy::Reject => {
                    return Err(MigrationError::Gap {
                        module: module.to_string(),
                        missing,
                        stranded,
                    });
                }
                GapPolicy::Stop => {
                    tracing::warn!(
                        module,
                        missing,
                        first_stranded,
                        "migration {missing} is missing; later migrations will not be applied: {stranded:?}"
                    );
                }
            }
        }

        let mut watermark = starting_watermark;
        let mut applied = Vec::new();

        while let Some(script) = next_script(&scripts, watermark) {
            self.apply(module, script).await?;
            watermark = script.sequence;
            self.meta
                .store_meta(&watermark_key(module), &watermark)
                .await
                .map_err(MigrationError::Watermark)?;
            applied.push(watermark);
            tracing::info!(module, sequence = watermark, path = %script.path, "applied migration");
        }

        if applied.is_empty() {
            tracing::debug!(module, watermark, "module is up to date");
        }

        Ok(MigrationReport {
            module: module.to_string(),
            starting_watermark,
            watermark,
            applied,
            stranded,
        })
    }

    async fn apply(&self, module: &str, script: &MigrationScript) -> Result<(), MigrationError> {
        let operation = format!("migration {} of '{module}'", script.sequence);
        retry_transient(&operation, self.meta.retry_policy(), || {
            self.target.execute_script(script)
        })
        .await
        .map_err(|e| script_error(module, script, e))
    }
}

/// The script numbered `watermark + 1`, if any. A watermark of `u64::MAX` has no successor.
fn next_script(
    scripts: &BTreeMap<u64, MigrationScript>,
    watermark: u64,
) -> Option<&MigrationScript> {
    scripts.get(&watermark.checked_add(1)?)
}

/// First sequence number after `watermark` with no script.
///
/// `None` when the numbers run contiguously up to `u64::MAX`.
fn first_missing(scripts: &BTreeMap<u64, MigrationScript>, watermark: u64) -> Option<u64> {
    let mut next = watermark.checked_add(1)?;
    while scripts.contains_key(&next) {
        next = next.checked_add(1)?;
    }
    Some(next)
}

/// Scripts beyond the first gap, which `migrate` can never reach.
fn stranded_from(scripts: &BTreeMap<u64, MigrationScript>, missing: u64) -> Vec<u64> {
    scripts.range(missing..).map(|(sequence, _)| *sequence).collect()
}

fn script_error(module: &str, script: &MigrationScript, err: RepositoryError) -> MigrationError {
    MigrationError::Script {
        module: module.to_string(),
        sequence: script.sequence,
        path: script.path.clone(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use crate::testing::{InMemoryMetaRepository, RecordingTarget};

    fn meta() -> MetaStore<InMemoryMetaRepository> {
        MetaStore::new(InMemoryMetaRepository::new()).with_retry(RetryPolicy::immediate(3))
    }

    fn counter_scripts() -> ScriptDir {
        ScriptDir::new("counter").file(
            "1.sql",
            "CREATE TABLE counters (name TEXT PRIMARY KEY, value INTEGER NOT NULL);",
        )
    }

    #[tokio::test]
    async fn test_fresh_module_applies_and_records_watermark() {
        let meta = meta();
        let target = RecordingTarget::new();
        let migrator = Migrator::new(&meta, &target);

        let report = migrator.migrate("counter", &counter_scripts()).await.unwrap();
        assert_eq!(report.applied, vec![1]);
        assert_eq!(report.starting_watermark, 0);
        assert_eq!(report.watermark, 1);
        assert_eq!(migrator.watermark("counter").await.unwrap(), 1);
        assert_eq!(meta.repository().raw("migration_state-counter").as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_second_run_is_noop() {
        let meta = meta();
        // Re-executing a script fails, like an unguarded CREATE TABLE.
        let target = RecordingTarget::new();
        let migrator = Migrator::new(&meta, &target);

        migrator.migrate("counter", &counter_scripts()).await.unwrap();
        let snapshot = meta.repository().snapshot();

        let report = migrator.migrate("counter", &counter_scripts()).await.unwrap();
        assert!(report.is_noop());
        assert_eq!(report.watermark, 1);
        assert_eq!(target.executed(), vec![1]);
        assert_eq!(meta.repository().snapshot(), snapshot);
    }

    #[tokio::test]
    async fn test_applies_in_numeric_order() {
        let meta = meta();
        let target = RecordingTarget::new();
        let scripts = ScriptDir::new("quotes")
            .file("3.sql", "-- three")
            .dir(ScriptDir::new("a").file("2.sql", "-- two"))
            .file("1.sql", "-- one");

        let report = Migrator::new(&meta, &target)
            .migrate("quotes", &scripts)
            .await
            .unwrap();
        assert_eq!(report.applied, vec![1, 2, 3]);
        assert_eq!(target.executed(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_gap_stops_catch_up_until_filled() {
        let meta = meta();
        let target = RecordingTarget::new();
        let migrator = Migrator::new(&meta, &target);
        let gapped = ScriptDir::new("m").file("1.sql", "-- one").file("3.sql", "-- three");

        let report = migrator.migrate("m", &gapped).await.unwrap();
        assert_eq!(report.applied, vec![1]);
        assert_eq!(report.stranded, vec![3]);

        let report = migrator.migrate("m", &gapped).await.unwrap();
        assert!(report.is_noop());
        assert_eq!(migrator.watermark("m").await.unwrap(), 1);

        let filled = gapped.file("2.sql", "-- two");
        let report = migrator.migrate("m", &filled).await.unwrap();
        assert_eq!(report.applied, vec![2, 3]);
        assert!(report.stranded.is_empty());
        assert_eq!(target.executed(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_reject_policy_fails_before_running_anything() {
        let meta = meta();
        let target = RecordingTarget::new();
        let migrator = Migrator::new(&meta, &target).with_gap_policy(GapPolicy::Reject);
        let gapped = ScriptDir::new("m")
            .file("1.sql", "")
            .file("2.sql", "")
            .file("4.sql", "");

        let err = migrator.migrate("m", &gapped).await.unwrap_err();
        match err {
            MigrationError::Gap {
                missing, stranded, ..
            } => {
                assert_eq!(missing, 3);
                assert_eq!(stranded, vec![4]);
            }
            other => panic!("expected gap error, got {other:?}"),
        }
        assert!(target.executed().is_empty());
        assert_eq!(migrator.watermark("m").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_script_keeps_watermark() {
        let meta = meta();
        let target = RecordingTarget::new().failing_on(2);
        let migrator = Migrator::new(&meta, &target);
        let scripts = ScriptDir::new("m")
            .file("1.sql", "")
            .file("2.sql", "")
            .file("3.sql", "");

        let err = migrator.migrate("m", &scripts).await.unwrap_err();
        match &err {
            MigrationError::Script { sequence, path, .. } => {
                assert_eq!(*sequence, 2);
                assert_eq!(path, "2.sql");
            }
            other => panic!("expected script error, got {other:?}"),
        }
        assert_eq!(migrator.watermark("m").await.unwrap(), 1);
        assert_eq!(target.executed(), vec![1]);
    }

    #[tokio::test]
    async fn test_busy_script_is_retried() {
        let meta = meta();
        let target = RecordingTarget::new().busy_times(2);
        let report = Migrator::new(&meta, &target)
            .migrate("counter", &counter_scripts())
            .await
            .unwrap();
        assert_eq!(report.applied, vec![1]);
    }

    #[tokio::test]
    async fn test_duplicate_scripts_abort_before_execution() {
        let meta = meta();
        let target = RecordingTarget::new();
        let scripts = ScriptDir::new("m")
            .file("1.sql", "")
            .dir(ScriptDir::new("dup").file("1.sql", ""));

        let err = Migrator::new(&meta, &target)
            .migrate("m", &scripts)
            .await
            .unwrap_err();
        assert!(err.is_configuration_error());
        assert!(target.executed().is_empty());
    }

    #[tokio::test]
    async fn test_maximal_watermark_has_no_next_script() {
        let meta = meta();
        let target = RecordingTarget::new();
        meta.store_meta(&watermark_key("m"), &u64::MAX).await.unwrap();

        let scripts = ScriptDir::new("m").file("1.sql", "").file("2.sql", "");
        let report = Migrator::new(&meta, &target)
            .migrate("m", &scripts)
            .await
            .unwrap();

        assert!(report.is_noop());
        assert!(report.stranded.is_empty());
        assert_eq!(report.watermark, u64::MAX);
        assert!(target.executed().is_empty());
    }

    #[tokio::test]
    async fn test_last_representable_sequence_is_applied() {
        let meta = meta();
        let target = RecordingTarget::new();
        meta.store_meta(&watermark_key("m"), &(u64::MAX - 1))
            .await
            .unwrap();

        let scripts = ScriptDir::new("m").file(format!("{}.sql", u64::MAX), "");
        let migrator = Migrator::new(&meta, &target);
        let report = migrator.migrate("m", &scripts).await.unwrap();
        assert_eq!(report.applied, vec![u64::MAX]);
        assert!(report.stranded.is_empty());

        let report = migrator.migrate("m", &scripts).await.unwrap();
        assert!(report.is_noop());
        assert_eq!(target.executed(), vec![u64::MAX]);
    }

    #[tokio::test]
    async fn test_modules_have_independent_watermarks() {
        let meta = meta();
        let counter_target = RecordingTarget::new();
        let quotes_target = RecordingTarget::new();

        Migrator::new(&meta, &counter_target)
            .migrate("counter", &counter_scripts())
            .await
            .unwrap();
        let quotes = ScriptDir::new("quotes").file("1.sql", "").file("2.sql", "");
        let migrator = Migrator::new(&meta, &quotes_target);
        migrator.migrate("quotes", &quotes).await.unwrap();

        assert_eq!(migrator.watermark("counter").await.unwrap(), 1);
        assert_eq!(migrator.watermark("quotes").await.unwrap(), 2);
        assert_eq!(quotes_target.executed(), vec![1, 2]);
    }
}
