//! Dehasher command-line shell
//!
//! Thin application shell that parses arguments, loads configuration and
//! wires the storage, key store and search crates together. Core logic
//! lives in the `crates/` directory.

mod args;
mod commands;
mod dates;
mod logging;
mod state;

pub use args::{Cli, Commands, CredsArgs, DbCommand, LogsArgs, ResultsArgs, RunsArgs, SearchArgs};
pub use state::AppState;

use anyhow::Context;
use dehasher_core::AppConfig;
use tracing::info;

/// Run the parsed command line.
///
/// # Errors
/// Returns the first error from configuration loading, storage or the
/// command itself.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config =
        AppConfig::load_with_env(cli.config.as_deref()).context("failed to load configuration")?;
    let log_dir = config
        .log_dir()
        .context("failed to resolve log directory")?;

    logging::init_tracing(cli.debug, log_dir.as_deref());
    info!("Starting dehasher v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::open(config, cli.db.as_deref()).await?;

    let result = match &cli.command {
        Commands::Search(args) => commands::search::handle(args, &state).await,
        Commands::SetKey { key } => commands::keys::set_key(key, &state).await,
        Commands::ClearKey => commands::keys::clear_key(&state).await,
        Commands::Db { action } => commands::db::handle(action, &state).await,
        Commands::Logs(args) => commands::logs::handle(args, log_dir.as_deref()),
    };

    state.close().await;
    result
}
