//! `sbx snapshot seal|unseal`: field-level encryption of JSON snapshot files.
//!
//! Sensitive members are named by dotted paths (`chat.oauth_token`) and
//! written in the `enc:`-prefixed form older releases understand.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;
use strongbox_core::crypto::json::{FieldSchema, process_json};
use strongbox_types::seal::SealAction;

use crate::state::Environment;

#[derive(Subcommand)]
pub enum SnapshotCommand {
    /// Encrypt the named fields (already-encrypted fields are left alone).
    Seal(SnapshotArgs),

    /// Decrypt the named fields (plaintext fields are left alone).
    Unseal(SnapshotArgs),
}

#[derive(Args)]
pub struct SnapshotArgs {
    /// JSON snapshot to read.
    pub file: PathBuf,

    /// Dotted path of a sensitive string field. Repeatable.
    #[arg(long = "sensitive", value_name = "PATH", required = true)]
    pub sensitive: Vec<String>,

    /// Write the result here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Build the schema, refusing path lists that name no field at all (`--sensitive .`).
fn schema_from_paths(paths: &[String]) -> Result<FieldSchema> {
    let schema = FieldSchema::from_paths(paths);
    if schema.is_empty() {
        bail!("--sensitive must name at least one field, e.g. chat.oauth_token");
    }
    Ok(schema)
}

pub async fn handle_snapshot_command(
    cmd: SnapshotCommand,
    env: &Environment,
    passphrase: Option<&str>,
    json: bool,
) -> Result<()> {
    let (args, action) = match cmd {
        SnapshotCommand::Seal(args) => (args, SealAction::Encrypt),
        SnapshotCommand::Unseal(args) => (args, SealAction::Decrypt),
    };

    let raw = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let mut document: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", args.file.display()))?;

    let schema = schema_from_paths(&args.sensitive)?;
    let sealer = env.sealer(passphrase)?;
    let changed = process_json(&mut document, &schema, &sealer, action)?;
    tracing::info!(?action, changed, file = %args.file.display(), "processed snapshot");

    let rendered = serde_json::to_string_pretty(&document)?;
    let Some(output) = &args.output else {
        println!("{rendered}");
        return Ok(());
    };

    tokio::fs::write(output, format!("{rendered}\n"))
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;

    if json {
        let result = serde_json::json!({
            "output": output.display().to_string(),
            "changed": changed,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let verb = match action {
            SealAction::Encrypt => "Sealed",
            SealAction::Decrypt => "Unsealed",
        };
        println!();
        println!(
            "  {} {} {} field{} into {}",
            style("ok").green(),
            verb,
            style(changed).bold(),
            if changed == 1 { "" } else { "s" },
            style(output.display()).cyan(),
        );
        println!();
    }
    Ok(())
}
