//! `sbx status`: module watermarks and store information.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use strongbox_infra::filesystem::database_path;
use strongbox_types::meta::LEGACY_IMPORTED_AT;

use crate::state::AppState;

pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let meta = state.store.meta();
    let watermarks = meta.list_watermarks().await?;
    let key_count = meta.list_keys("").await?.len();
    let imported_at: Option<String> = match meta.read_meta(LEGACY_IMPORTED_AT).await {
        Ok(at) => Some(at),
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(e.into()),
    };

    if json {
        let modules: serde_json::Map<String, serde_json::Value> = watermarks
            .iter()
            .map(|(module, watermark)| (module.clone(), serde_json::json!(watermark)))
            .collect();
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.env.data_dir.display().to_string(),
            "modules": modules,
            "meta_keys": key_count,
            "legacy_imported_at": imported_at,
            "gap_policy": state.env.config.migrations.gap_policy,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Strongbox v{}",
        style("*").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Modules ──").dim());
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Module").fg(Color::White),
        Cell::new("Watermark").fg(Color::White),
    ]);
    for (module, watermark) in &watermarks {
        table.add_row(vec![
            Cell::new(module).fg(Color::Cyan),
            Cell::new(watermark),
        ]);
    }
    println!("{table}");
    println!();

    println!("  {}", style("── Metadata ──").dim());
    println!("  Keys:          {}", style(key_count).bold());
    match &imported_at {
        Some(at) => println!("  Legacy import: {}", style(at).green()),
        None => println!("  Legacy import: {}", style("never").dim()),
    }
    println!();

    println!("  {}", style("── System ──").dim());
    println!(
        "  Database: {}",
        style(database_path(&state.env.data_dir).display()).dim()
    );
    println!(
        "  Mode:     {}",
        style("SQLite (WAL, single connection)").dim()
    );
    println!();

    Ok(())
}
