//! jobacct CLI
//!
//! Command-line interface for the job accounting server, plus an offline
//! mode that runs the aggregation engine over a captured accounting dump.

mod api;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "jobacct")]
#[command(about = "Slurm job accounting CLI", long_about = None)]
struct Cli {
    /// Accounting server URL
    #[arg(long, env = "JOBACCT_SERVER_URL", default_value = "http://localhost:8080")]
    server_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.server_url,
    };

    handle_command(cli.command, &config).await
}
