mod state_cmd;
mod watch;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rpwatch")]
#[command(about = "Watches a profile's repost tab and alerts on new items")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Watch until interrupted (default)
    Run,
    /// Run a single cycle and print its outcome
    Once,
    /// Inspect or clear the persisted last-seen reference
    State {
        /// State file to operate on
        #[arg(
            long,
            env = "RPWATCH_STATE_PATH",
            default_value = "./rpwatch_state.json",
            global = true
        )]
        path: PathBuf,

        #[command(subcommand)]
        command: StateCommands,
    },
}

#[derive(Debug, Subcommand)]
enum StateCommands {
    Show,
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::State { path, command }) => {
            init_tracing("warn")?;
            match command {
                StateCommands::Show => state_cmd::show(&path),
                StateCommands::Reset => state_cmd::reset(&path),
            }
        }
        Some(Commands::Once) => {
            let config = rpwatch_core::load_watch_config()?;
            init_tracing(config.log_filter())?;
            watch::run(config, watch::Mode::Once).await
        }
        Some(Commands::Run) | None => {
            let config = rpwatch_core::load_watch_config()?;
            init_tracing(config.log_filter())?;
            watch::run(config, watch::Mode::Forever).await
        }
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

#[cfg(test)]
mod tests;
