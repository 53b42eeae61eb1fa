//! `sbx migrate`: apply a module's scripts from a directory.

use std::path::Path;

use anyhow::{Context, Result, bail};
use console::style;
use strongbox_infra::filesystem::scripts::load_script_dir;
use strongbox_types::migration::{GapPolicy, MigrationReport, ScriptDir};

use crate::state::AppState;

pub async fn migrate(
    state: &AppState,
    module: &str,
    dir: &Path,
    reject_gaps: bool,
    json: bool,
) -> Result<()> {
    let scripts = load_script_dir(dir)
        .await
        .with_context(|| format!("failed to read scripts from {}", dir.display()))?;
    ensure_scripts(dir, &scripts)?;

    let mut migrator = state.store.migrator();
    if reject_gaps {
        migrator = migrator.with_gap_policy(GapPolicy::Reject);
    }

    let report = migrator
        .migrate(module, &scripts)
        .await
        .with_context(|| format!("migration of module '{module}' failed"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

/// An empty tree is almost always a wrong path, not a module with nothing to do.
fn ensure_scripts(dir: &Path, scripts: &ScriptDir) -> Result<()> {
    if scripts.is_empty() {
        bail!("no .sql files found under {}", dir.display());
    }
    Ok(())
}

fn print_report(report: &MigrationReport) {
    println!();
    if report.is_noop() {
        println!(
            "  {} '{}' is up to date (watermark {})",
            style("ok").green(),
            style(&report.module).cyan(),
            style(report.watermark).bold(),
        );
    } else {
        println!(
            "  {} '{}' migrated {} -> {} ({} script{})",
            style("ok").green(),
            style(&report.module).cyan(),
            report.starting_watermark,
            style(report.watermark).bold(),
            report.applied.len(),
            if report.applied.len() == 1 { "" } else { "s" },
        );
    }

    if !report.stranded.is_empty() {
        println!(
            "  {} migration {} is missing; not applied: {}",
            style("!").yellow().bold(),
            report.watermark + 1,
            style(
                report
                    .stranded
                    .iter()
                    .map(u64::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            )
            .yellow(),
        );
    }
    println!();
}
