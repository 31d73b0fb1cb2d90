//! Shared application state

use std::sync::Arc;

use jobacct_core::billing::PartitionRates;
use jobacct_core::domain::job::JobRecord;
use jobacct_slurm::{CommandRunner, SlurmSource, SystemCommandRunner, TtlCache};

use crate::config::Config;

/// Scheduler source as held by the server
pub type Source = SlurmSource<Box<dyn CommandRunner>>;

/// State handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub source: Arc<Source>,
    pub billing: Arc<PartitionRates>,

    /// Last computed "my jobs" list per user
    pub recent_jobs: Arc<TtlCache<Vec<JobRecord>>>,
}

impl AppState {
    /// State running the real scheduler binaries
    pub fn new(config: Config) -> Self {
        let runner: Box<dyn CommandRunner> =
            Box::new(SystemCommandRunner::new(config.slurm.bin_dir.clone()));
        Self::with_runner(config, runner)
    }

    /// State with a custom command runner
    pub fn with_runner(config: Config, runner: Box<dyn CommandRunner>) -> Self {
        let source = SlurmSource::with_runner(runner, &config.slurm);
        Self {
            config: Arc::new(config),
            source: Arc::new(source),
            billing: Arc::new(PartitionRates::default()),
            recent_jobs: Arc::new(TtlCache::unbounded("recent_jobs")),
        }
    }
}
