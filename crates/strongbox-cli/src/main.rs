//! Strongbox CLI entry point.
//!
//! Binary name: `sbx`
//!
//! Parses CLI arguments, sets up tracing, opens the store and dispatches to
//! the command handlers.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use strongbox_observe::tracing_setup::{filter_for_verbosity, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::{AppState, Environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(filter_for_verbosity(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let env = Environment::load().await?;
    let passphrase = cli.passphrase.as_deref();

    match cli.command {
        // Shell completions don't need the store
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(shell, &mut cmd, "sbx", &mut std::io::stdout());
        }

        // Snapshot files are processed in memory; no database involved.
        Commands::Snapshot { action } => {
            cli::snapshot::handle_snapshot_command(action, &env, passphrase, cli.json).await?;
        }

        Commands::Migrate {
            module,
            dir,
            reject_gaps,
        } => {
            let state = AppState::init(env).await?;
            cli::migrate::migrate(&state, &module, &dir, reject_gaps, cli.json).await?;
            state.store.close().await;
        }

        Commands::Status => {
            let state = AppState::init(env).await?;
            cli::status::status(&state, cli.json).await?;
            state.store.close().await;
        }

        Commands::Meta { action } => {
            let mut state = AppState::init(env).await?;
            if action.needs_passphrase() {
                state = state.unlock(passphrase)?;
            }
            cli::meta::handle_meta_command(action, &state, cli.json).await?;
            state.store.close().await;
        }

        Commands::ImportLegacy { file, force } => {
            let state = AppState::init(env).await?.unlock(passphrase)?;
            cli::legacy::import_legacy(&state, &file, force, cli.json).await?;
            state.store.close().await;
        }
    }

    Ok(())
}
