//! tenfoot - playback resolution for Jellyfin
//!
//! Fetches playback info for an item, applies the tracks remembered for its
//! season and hands the result to a local player.
//!
//! # Usage
//!
//! ```bash
//! tenfoot tracks <item-id>
//! tenfoot resolve <item-id> --json
//! tenfoot play <item-id> --from-beginning
//! ```

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tenfoot::cli::{Cli, Command, ExitCode, Output};
use tenfoot::commands;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run_cli(cli).await.into()
}

/// Log to stderr so JSON on stdout stays parseable
fn init_logging(verbose: bool) {
    let default = if verbose { "tenfoot=debug" } else { "tenfoot=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);

    let mut config = match commands::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return output.error(format!("{:#}", e), ExitCode::InvalidArgs),
    };

    match cli.command {
        Command::Tracks(cmd) => commands::tracks_cmd(cmd, &mut config, &output).await,
        Command::Resolve(cmd) => commands::resolve_cmd(cmd, &mut config, &output).await,
        Command::Play(cmd) => commands::play_cmd(cmd, &mut config, &output).await,
        Command::Prefs(cmd) => commands::prefs_cmd(cmd, &config, &output),
    }
}
