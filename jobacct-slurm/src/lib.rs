//! jobacct Slurm adapter
//!
//! Feeds the aggregation engine from a Slurm cluster by running the
//! scheduler's command line tools (`sacct`, `squeue`, `scontrol`,
//! `sacctmgr`) and the site `jobinfo` helper, parsing their text output, and
//! caching what is expensive or slow-changing.
//!
//! # Example
//!
//! ```no_run
//! use jobacct_core::Aggregator;
//! use jobacct_core::billing::PartitionRates;
//! use jobacct_core::ports::Scope;
//! use jobacct_slurm::{SlurmConfig, SlurmSource};
//!
//! let source = SlurmSource::from_config(&SlurmConfig::default());
//! let rates = PartitionRates::default();
//! let scope = Scope::UserHistory { user: "alice".to_string() };
//!
//! let jobs = Aggregator::new(&source, &rates).collect(&scope, "alice")?;
//! println!("{} jobs", jobs.len());
//! # Ok::<(), jobacct_core::AccountingError>(())
//! ```

pub mod cache;
pub mod command;
pub mod config;
pub mod error;
pub mod jobinfo;
pub mod query;
pub mod scontrol;
pub mod source;
pub mod squeue;

// Re-export commonly used types
pub use cache::TtlCache;
pub use command::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use config::SlurmConfig;
pub use error::{Result, SlurmError};
pub use source::SlurmSource;
