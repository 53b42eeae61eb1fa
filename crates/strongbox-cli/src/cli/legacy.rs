//! `sbx import-legacy`: move a pre-versioned-store snapshot into core metadata.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use strongbox_core::service::legacy::import_legacy_snapshot;
use strongbox_types::legacy::LegacySnapshot;

use crate::state::AppState;

pub async fn import_legacy(state: &AppState, file: &Path, force: bool, json: bool) -> Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let snapshot: LegacySnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a legacy settings snapshot", file.display()))?;

    let summary = import_legacy_snapshot(state.store.meta(), snapshot, force).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Imported {}",
        style("ok").green(),
        style(file.display()).cyan()
    );
    for key in &summary.plain_keys {
        println!("    {} {}", style("plain    ").dim(), key);
    }
    for key in &summary.encrypted_keys {
        println!("    {} {}", style("encrypted").green(), key);
    }
    for key in &summary.skipped_keys {
        println!("    {} {} (empty)", style("skipped  ").yellow(), key);
    }
    println!();
    Ok(())
}
