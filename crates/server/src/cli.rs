use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "testbed-lbd")]
#[command(bin_name = "testbed-lbd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Testbed load balancer daemon", long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the testbed-lbd server
    Start {
        /// Run in foreground (don't daemonize)
        #[arg(short, long)]
        foreground: bool,
    },

    /// Stop the testbed-lbd server
    Stop {
        /// Force kill if graceful shutdown fails
        #[arg(short, long)]
        force: bool,
    },

    /// Restart the testbed-lbd server
    Restart {
        /// Run in foreground after restart
        #[arg(short, long)]
        foreground: bool,
    },

    /// Show testbed-lbd server status
    Status,

    /// Show testbed-lbd server logs
    Logs {
        /// Follow log output (like tail -f)
        #[arg(short, long)]
        follow: bool,
    },
}
