//! CLI command definitions for the `sbx` binary.

pub mod legacy;
pub mod meta;
pub mod migrate;
pub mod snapshot;
pub mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Versioned, encrypted-at-rest settings store.
#[derive(Parser)]
#[command(name = "sbx", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Only log errors. Command output on stdout is unaffected.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Passphrase for encrypted values. Prompted for when needed and not given.
    #[arg(
        long,
        global = true,
        env = "STRONGBOX_PASSPHRASE",
        hide_env_values = true
    )]
    pub passphrase: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply a module's pending migrations from a script directory.
    Migrate {
        /// Module name (namespaces the watermark).
        module: String,

        /// Directory containing `{number}.sql` scripts (searched recursively).
        dir: PathBuf,

        /// Fail instead of stopping when a script number is missing.
        #[arg(long)]
        reject_gaps: bool,
    },

    /// Show module watermarks and store information.
    Status,

    /// Read and write core metadata.
    Meta {
        #[command(subcommand)]
        action: meta::MetaCommand,
    },

    /// Import a settings snapshot exported by an older release.
    #[command(name = "import-legacy")]
    ImportLegacy {
        /// Path to the JSON snapshot.
        file: PathBuf,

        /// Import again even if a previous import completed.
        #[arg(long)]
        force: bool,
    },

    /// Encrypt or decrypt sensitive fields of a JSON snapshot file.
    Snapshot {
        #[command(subcommand)]
        action: snapshot::SnapshotCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
