//! Core metadata CLI subcommands: get, set, delete, list.
//!
//! Values are arbitrary JSON. `--encrypted` switches to the encrypted
//! accessors, which need the passphrase.

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Password;
use serde_json::Value;

use crate::state::AppState;

#[derive(Subcommand)]
pub enum MetaCommand {
    /// Print the value stored under a key.
    Get {
        key: String,

        /// Read through the encrypted accessor.
        #[arg(long)]
        encrypted: bool,
    },

    /// Store a value (parsed as JSON, otherwise stored as a string).
    Set {
        key: String,

        /// Value to store. With --encrypted and no value, prompts with hidden input.
        value: Option<String>,

        /// Encrypt the value at rest.
        #[arg(long)]
        encrypted: bool,
    },

    /// Delete a key (no error if absent).
    #[command(alias = "rm")]
    Delete { key: String },

    /// List keys, optionally restricted to a prefix.
    #[command(alias = "ls")]
    List {
        #[arg(long, default_value = "")]
        prefix: String,
    },
}

impl MetaCommand {
    pub fn needs_passphrase(&self) -> bool {
        matches!(
            self,
            Self::Get {
                encrypted: true,
                ..
            } | Self::Set {
                encrypted: true,
                ..
            }
        )
    }
}

pub async fn handle_meta_command(cmd: MetaCommand, state: &AppState, json: bool) -> Result<()> {
    match cmd {
        MetaCommand::Get { key, encrypted } => meta_get(state, &key, encrypted, json).await,
        MetaCommand::Set {
            key,
            value,
            encrypted,
        } => meta_set(state, &key, value.as_deref(), encrypted, json).await,
        MetaCommand::Delete { key } => meta_delete(state, &key, json).await,
        MetaCommand::List { prefix } => meta_list(state, &prefix, json).await,
    }
}

/// Parse as JSON, falling back to a JSON string.
///
/// `sbx meta set name Alice` stores `"Alice"`, while
/// `sbx meta set timer '{"interval": 900}'` stores the object.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

async fn meta_get(state: &AppState, key: &str, encrypted: bool, json: bool) -> Result<()> {
    let meta = state.store.meta();
    let result = if encrypted {
        meta.read_encrypted_meta::<Value>(key).await
    } else {
        meta.read_meta::<Value>(key).await
    };

    let value = match result {
        Ok(value) => Some(value),
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(e).with_context(|| format!("failed to read '{key}'")),
    };

    if json {
        let result = serde_json::json!({ "key": key, "value": value });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    match value {
        Some(value) => println!(
            "  {} = {}",
            style(key).cyan().bold(),
            serde_json::to_string_pretty(&value)?,
        ),
        None => println!(
            "  {} Key '{}' not found",
            style("i").blue().bold(),
            style(key).cyan(),
        ),
    }
    println!();
    Ok(())
}

async fn meta_set(
    state: &AppState,
    key: &str,
    raw: Option<&str>,
    encrypted: bool,
    json: bool,
) -> Result<()> {
    let raw = match (raw, encrypted) {
        (Some(raw), _) => raw.to_string(),
        (None, true) => Password::new()
            .with_prompt(format!("Value for {}", style(key).bold()))
            .interact()?,
        (None, false) => bail!("a value is required unless --encrypted is set"),
    };
    let value = parse_value(&raw);

    let meta = state.store.meta();
    if encrypted {
        meta.store_encrypted_meta(key, &value).await?;
    } else {
        meta.store_meta(key, &value).await?;
    }

    if json {
        let result = serde_json::json!({ "set": key, "encrypted": encrypted });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        println!(
            "  {} Set '{}'{}",
            style("ok").green(),
            style(key).cyan(),
            if encrypted { " (encrypted)" } else { "" },
        );
        println!();
    }
    Ok(())
}

async fn meta_delete(state: &AppState, key: &str, json: bool) -> Result<()> {
    state.store.meta().delete_meta(key).await?;

    if json {
        println!("{}", serde_json::json!({ "deleted": key }));
    } else {
        println!();
        println!("  {} Deleted '{}'", style("ok").green(), style(key).cyan());
        println!();
    }
    Ok(())
}

async fn meta_list(state: &AppState, prefix: &str, json: bool) -> Result<()> {
    let keys = state.store.meta().list_keys(prefix).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&keys)?);
        return Ok(());
    }

    if keys.is_empty() {
        println!();
        println!(
            "  {} No keys stored. Add one with: {}",
            style("i").blue().bold(),
            style("sbx meta set <key> <value>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![Cell::new("Key").fg(Color::White)]);
    for key in &keys {
        table.add_row(vec![Cell::new(key).fg(Color::Cyan)]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} key{}",
        style(keys.len()).bold(),
        if keys.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}
