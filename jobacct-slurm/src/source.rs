//! Slurm-backed accounting source
//!
//! Implements the engine's ports on top of the scheduler command line tools,
//! with the process-wide caches the dashboard relies on.

use std::collections::HashMap;
use std::time::Duration;

use jobacct_core::SourceError;
use jobacct_core::domain::field::Field;
use jobacct_core::domain::job::JobId;
use jobacct_core::domain::queue::QueueEntry;
use jobacct_core::dto::JobInfo;
use jobacct_core::ports::{AccountingSource, JobLookups, Scope};
use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::command::{CommandRunner, SystemCommandRunner};
use crate::config::SlurmConfig;
use crate::error::{Result, SlurmError};
use crate::jobinfo::{is_final, parse_jobinfo};
use crate::query::{
    ID, JOBINFO, SACCT, SACCTMGR, SCONTROL, SQUEUE, allocations_args, job_detail_args,
    jobinfo_args, sacct_args, squeue_args, username_args,
};
use crate::scontrol::parse_scontrol;
use crate::squeue::parse_squeue;

/// Single key under which the queue snapshot is cached
const QUEUE_KEY: &str = "squeue";

/// Accounting source that shells out to Slurm
pub struct SlurmSource<R: CommandRunner = SystemCommandRunner> {
    runner: R,
    queue: TtlCache<Vec<QueueEntry>>,
    allocations: TtlCache<Vec<String>>,
    usernames: TtlCache<String>,
    job_info: TtlCache<JobInfo>,
}

impl SlurmSource<SystemCommandRunner> {
    /// Create a source running the real scheduler binaries
    pub fn from_config(config: &SlurmConfig) -> Self {
        info!(
            "Slurm source using binaries from {}",
            config
                .bin_dir
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| "PATH".to_string())
        );
        Self::with_runner(SystemCommandRunner::new(config.bin_dir.clone()), config)
    }
}

impl<R: CommandRunner> SlurmSource<R> {
    pub fn with_runner(runner: R, config: &SlurmConfig) -> Self {
        Self {
            runner,
            queue: TtlCache::new("queue", config.queue_ttl, config.queue_grace),
            allocations: TtlCache::new("allocations", config.allocations_ttl, Duration::ZERO),
            usernames: TtlCache::unbounded("usernames"),
            job_info: TtlCache::unbounded("job_info"),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn run(&self, program: &str, args: Vec<String>) -> Result<String> {
        self.runner.run(program, &args)?.into_stdout(program)
    }

    /// Accounts the user is associated with, in `sacctmgr` order
    pub fn user_allocations(&self, user: &str) -> Result<Vec<String>> {
        self.allocations.get_or_try_insert_with(user, || -> Result<Vec<String>> {
            let output = self.run(SACCTMGR, allocations_args(user))?;

            let mut accounts: Vec<String> = Vec::new();
            for account in output.split_whitespace() {
                if !accounts.iter().any(|a| a == account) {
                    accounts.push(account.to_string());
                }
            }

            debug!("User {} has {} allocations", user, accounts.len());
            Ok(accounts)
        })
    }

    /// Snapshot of the whole queue, shared between callers for a few seconds
    pub fn queue_snapshot(&self) -> Result<Vec<QueueEntry>> {
        self.queue.get_or_try_insert_with(QUEUE_KEY, || -> Result<Vec<QueueEntry>> {
            let output = self.run(SQUEUE, squeue_args())?;
            let entries = parse_squeue(&output);
            debug!("Queue snapshot holds {} jobs", entries.len());
            Ok(entries)
        })
    }

    /// Site report for one job
    ///
    /// Reports of finished jobs never change and are kept; reports of jobs
    /// still pending or running are fetched every time.
    pub fn job_info(&self, job_id: &JobId) -> Result<JobInfo> {
        if let Some(info) = self.job_info.get(job_id.as_str()) {
            debug!("Serving cached job info for {}", job_id);
            return Ok(info);
        }

        let output = self.run(JOBINFO, jobinfo_args(job_id.as_str()))?;
        let info = parse_jobinfo(&output);

        if is_final(&info) {
            self.job_info.insert(job_id.as_str(), info.clone());
        }

        Ok(info)
    }
}

impl<R: CommandRunner> JobLookups for SlurmSource<R> {
    fn resolve_username(&self, uid: u32) -> Option<String> {
        self.usernames
            .get_or_try_insert_with(&uid.to_string(), || -> Result<String> {
                let output = self.run(ID, username_args(uid))?;
                let name = output.trim().to_string();
                if name.is_empty() {
                    return Err(SlurmError::Output {
                        command: ID.to_string(),
                        detail: format!("empty name for uid {}", uid),
                    });
                }
                Ok(name)
            })
            .inspect_err(|e| warn!("Failed to resolve uid {}: {}", uid, e))
            .ok()
    }

    fn fetch_job_detail(&self, job_id: &str) -> Option<HashMap<String, String>> {
        self.run(SCONTROL, job_detail_args(job_id))
            .inspect_err(|e| warn!("Failed to fetch detail for job {}: {}", job_id, e))
            .ok()
            .and_then(|output| parse_scontrol(&output).into_iter().next())
    }
}

impl<R: CommandRunner> AccountingSource for SlurmSource<R> {
    fn run_accounting_query(&self, scope: &Scope, columns: &[Field]) -> std::result::Result<String, SourceError> {
        if let Scope::Allocations { user, accounts, .. } = scope {
            if accounts.is_empty() {
                warn!("User {} has no allocations, skipping accounting query", user);
                return Ok(String::new());
            }
        }

        let output = self.run(SACCT, sacct_args(scope, columns))?;
        debug!("{} returned {} lines", SACCT, output.lines().count());
        Ok(output)
    }

    fn live_queue(&self) -> std::result::Result<Vec<QueueEntry>, SourceError> {
        Ok(self.queue_snapshot()?)
    }
}
