mod api;
mod cli;
mod daemon;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use daemon::manager::{logs_daemon, restart_daemon, run_background_child, start_daemon, status_daemon, stop_daemon};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--background-child" {
        return run_background_child().await;
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { foreground } => start_daemon(foreground).await,
        Commands::Stop { force } => stop_daemon(force),
        Commands::Restart { foreground } => restart_daemon(foreground).await,
        Commands::Status => status_daemon(),
        Commands::Logs { follow } => logs_daemon(follow),
    }
}
