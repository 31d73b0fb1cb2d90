//! Jobs Service
//!
//! Business logic behind the job endpoints. Every call into the engine or the
//! scheduler blocks on child processes, so it runs on the blocking pool.

use chrono::{Days, Local, NaiveDateTime, NaiveTime};
use jobacct_core::domain::job::{JobId, JobRecord};
use jobacct_core::domain::queue::QueueEntry;
use jobacct_core::dto::JobInfo;
use jobacct_core::ports::Scope;
use jobacct_core::{AccountingError, Aggregator, InvalidJobId};
use jobacct_slurm::SlurmError;
use jobacct_slurm::squeue::recent_for_user;

use crate::state::AppState;

/// Number of queue entries the job queue endpoint returns
pub const QUEUE_LIMIT: usize = 5;

/// Service error type
#[derive(Debug)]
pub enum JobsError {
    InvalidJobId(InvalidJobId),
    Accounting(AccountingError),
    Slurm(SlurmError),
    Task(String),
}

impl From<InvalidJobId> for JobsError {
    fn from(err: InvalidJobId) -> Self {
        JobsError::InvalidJobId(err)
    }
}

impl From<AccountingError> for JobsError {
    fn from(err: AccountingError) -> Self {
        JobsError::Accounting(err)
    }
}

impl From<SlurmError> for JobsError {
    fn from(err: SlurmError) -> Self {
        JobsError::Slurm(err)
    }
}

/// Run blocking work on the blocking pool
async fn blocking<T, F>(work: F) -> Result<T, JobsError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, JobsError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| JobsError::Task(e.to_string()))?
}

/// `[midnight `days` days ago, now]`
pub fn allocation_window(now: NaiveDateTime, days: u32) -> (NaiveDateTime, NaiveDateTime) {
    let first_day = now.date() - Days::new(u64::from(days));
    (first_day.and_time(NaiveTime::MIN), now)
}

fn aggregate(state: &AppState, scope: &Scope) -> Result<Vec<JobRecord>, JobsError> {
    let jobs = Aggregator::new(state.source.as_ref(), state.billing.as_ref())
        .with_malformed_policy(state.config.malformed_policy)
        .collect(scope, &state.config.user)?;
    Ok(jobs)
}

/// Jobs in the user's allocations over the configured window
///
/// With `use_cache`, the last computed list is returned when there is one.
/// Every fresh computation replaces the stored list.
pub async fn my_jobs(state: AppState, use_cache: bool) -> Result<Vec<JobRecord>, JobsError> {
    let user = state.config.user.clone();

    if use_cache {
        if let Some(jobs) = state.recent_jobs.get(&user) {
            tracing::debug!("Serving {} cached jobs for {}", jobs.len(), user);
            return Ok(jobs);
        }
    }

    blocking(move || {
        let accounts = state.source.user_allocations(&user)?;
        let (start, end) = allocation_window(Local::now().naive_local(), state.config.window_days);

        let scope = Scope::Allocations {
            user: user.clone(),
            accounts,
            start,
            end,
        };
        let jobs = aggregate(&state, &scope)?;

        tracing::info!("Computed {} jobs for {}", jobs.len(), user);
        state.recent_jobs.insert(&user, jobs.clone());
        Ok(jobs)
    })
    .await
}

/// The user's jobs over all time
pub async fn user_history(state: AppState) -> Result<Vec<JobRecord>, JobsError> {
    blocking(move || {
        let scope = Scope::UserHistory {
            user: state.config.user.clone(),
        };
        aggregate(&state, &scope)
    })
    .await
}

/// Every record for one job id
pub async fn job_history(state: AppState, job_id: &str) -> Result<Vec<JobRecord>, JobsError> {
    let job_id = JobId::parse(job_id)?;

    blocking(move || aggregate(&state, &Scope::Job { job_id })).await
}

/// Site report for one job id
pub async fn job_info(state: AppState, job_id: &str) -> Result<JobInfo, JobsError> {
    let job_id = JobId::parse(job_id)?;

    blocking(move || Ok(state.source.job_info(&job_id)?)).await
}

/// The user's most recent queue entries
///
/// An unavailable queue reads as an empty one.
pub async fn job_queue(state: AppState) -> Result<Vec<QueueEntry>, JobsError> {
    blocking(move || {
        let queue = state.source.queue_snapshot().unwrap_or_else(|e| {
            tracing::warn!("Queue snapshot unavailable: {}", e);
            Vec::new()
        });
        Ok(recent_for_user(&queue, &state.config.user, QUEUE_LIMIT))
    })
    .await
}
