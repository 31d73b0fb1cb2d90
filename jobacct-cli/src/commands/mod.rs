//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod jobs;
mod parse;

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Jobs in your allocations over the recent window
    Jobs {
        /// Accept the server's last computed list
        #[arg(long)]
        cached: bool,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
    /// All of your jobs
    History {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Records for one job
    Job {
        /// Job id, e.g. 12345 or 12345_7
        jobid: String,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Your most recent queue entries
    Queue,
    /// Aggregate a captured accounting dump offline and print JSON
    Parse {
        /// File produced by `sacct -P -n -o <columns>`, or `-` for stdin
        input: PathBuf,

        /// User whose session directories are recognized
        #[arg(long, env = "USER")]
        user: String,

        /// Fail on the first malformed line instead of skipping it
        #[arg(long)]
        strict: bool,
    },
    /// Print the accounting column order
    Columns,
}

/// Handle a CLI command
///
/// Remote commands go through the API client; `parse` and `columns` run
/// locally.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Jobs { cached, json } => jobs::my_jobs(config, cached, json).await,
        Commands::History { json } => jobs::history(config, json).await,
        Commands::Job { jobid, json } => jobs::job(config, &jobid, json).await,
        Commands::Queue => jobs::queue(config).await,
        Commands::Parse {
            input,
            user,
            strict,
        } => parse::parse_dump(&input, &user, strict),
        Commands::Columns => {
            parse::print_columns();
            Ok(())
        }
    }
}
