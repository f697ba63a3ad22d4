use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;

use voxpad::app::App;
use voxpad::config::Config;
use voxpad::logging::init_logging;

#[derive(Parser)]
#[command(name = "voxpad", about = "Voice-driven virtual gamepad bridge")]
struct Cli {
    /// Path to a config.toml (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Execute keymap envelopes from stdin on the virtual pad
    Bridge,
    /// Filter raw transcription fragments from stdin into clean words
    Words,
    /// Full session: match filtered words against a keyword profile
    Run {
        /// Keyword profile JSON (overrides the configured path)
        #[arg(long)]
        profile: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            Config::from_file(path).context(format!("Reading config {}", path.display()))?
        }
        None => Config::load_or_write_default(None)?,
    };

    // Ctrl-C flips the shutdown flag; in-flight suspensions select against
    // it instead of running to completion.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let mut app = App::new(config, shutdown_rx);
    match cli.command {
        Mode::Bridge => app.run_bridge().await?,
        Mode::Words => app.run_words().await?,
        Mode::Run { profile } => app.run_session(profile).await?,
    }
    Ok(())
}
