//! Ports to the outside world
//!
//! The engine never runs commands itself. Everything it needs from the
//! scheduler comes through these traits, implemented by an adapter crate.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::domain::field::Field;
use crate::domain::job::JobId;
use crate::domain::queue::QueueEntry;
use crate::error::SourceError;

/// Which jobs an accounting query covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every job in the user's allocations within a time window
    Allocations {
        user: String,
        accounts: Vec<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// The user's own jobs, over all time
    UserHistory { user: String },
    /// One job's whole lifetime
    Job { job_id: JobId },
}

/// Secondary lookups the deriver performs for individual jobs
///
/// Both are best effort: `None` leaves the affected field untouched.
pub trait JobLookups: Send + Sync {
    /// Login name for a numeric user id
    fn resolve_username(&self, uid: u32) -> Option<String>;

    /// Key/value detail for one job, e.g. from `scontrol show job`
    fn fetch_job_detail(&self, job_id: &str) -> Option<HashMap<String, String>>;
}

/// Lookups that never find anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookups;

impl JobLookups for NoLookups {
    fn resolve_username(&self, _uid: u32) -> Option<String> {
        None
    }

    fn fetch_job_detail(&self, _job_id: &str) -> Option<HashMap<String, String>> {
        None
    }
}

/// Where raw accounting text and the live queue come from
pub trait AccountingSource: JobLookups {
    /// Run the accounting query for `scope`, requesting `columns` in order
    ///
    /// Returns the raw pipe-delimited output, one line per job step.
    fn run_accounting_query(&self, scope: &Scope, columns: &[Field]) -> Result<String, SourceError>;

    /// Current queue snapshot
    fn live_queue(&self) -> Result<Vec<QueueEntry>, SourceError>;
}
