//! Aggregation driver
//!
//! Runs the full pipeline for one query: fetch raw text, parse every line,
//! merge steps into jobs, derive the final records.

use tracing::{debug, error, warn};

use crate::billing::ServiceUnitPolicy;
use crate::derive::{DeriveContext, derive_job};
use crate::domain::field::{Field, SACCT_COLUMNS};
use crate::domain::job::JobRecord;
use crate::error::{AccountingError, Result};
use crate::merge::JobMerger;
use crate::parser::parse_line;
use crate::ports::{AccountingSource, Scope};
use crate::session::SessionPattern;

/// What to do with a line that does not fit the column contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedLinePolicy {
    /// Log a warning and drop the line
    #[default]
    Skip,
    /// Abort the whole aggregation
    Fail,
}

/// Aggregate an already-captured accounting blob
///
/// # Arguments
/// * `raw` - Output of the accounting query, one step per line
/// * `columns` - Column order the output was produced with
/// * `sessions` - Session pattern for the requesting user
/// * `ctx` - Queue snapshot, lookups and billing used during derivation
/// * `policy` - Handling of malformed lines
///
/// # Returns
/// One record per distinct job, in first-seen order
pub fn aggregate_text(
    raw: &str,
    columns: &[Field],
    sessions: &SessionPattern,
    ctx: &DeriveContext<'_>,
    policy: MalformedLinePolicy,
) -> Result<Vec<JobRecord>> {
    let mut merger = JobMerger::new(sessions);

    for (idx, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        match parse_line(line, columns) {
            Ok(record) => merger.push(record),
            Err(source) => match policy {
                MalformedLinePolicy::Skip => {
                    warn!("Skipping malformed accounting line {}: {}", idx + 1, source);
                }
                MalformedLinePolicy::Fail => {
                    return Err(AccountingError::MalformedLine {
                        line: idx + 1,
                        source,
                    });
                }
            },
        }
    }

    debug!("Merged accounting output into {} jobs", merger.len());

    Ok(merger
        .finish()
        .into_iter()
        .map(|job| derive_job(job, ctx))
        .collect())
}

/// Drives an [`AccountingSource`] through the pipeline
pub struct Aggregator<'a, S: AccountingSource> {
    source: &'a S,
    billing: &'a dyn ServiceUnitPolicy,
    columns: Vec<Field>,
    policy: MalformedLinePolicy,
}

impl<'a, S: AccountingSource> Aggregator<'a, S> {
    pub fn new(source: &'a S, billing: &'a dyn ServiceUnitPolicy) -> Self {
        Self {
            source,
            billing,
            columns: SACCT_COLUMNS.to_vec(),
            policy: MalformedLinePolicy::default(),
        }
    }

    /// Request a different column order from the source
    pub fn with_columns(mut self, columns: &[Field]) -> Self {
        self.columns = columns.to_vec();
        self
    }

    pub fn with_malformed_policy(mut self, policy: MalformedLinePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Collect the final records for `scope` as seen by `viewer`
    ///
    /// `viewer` is the user whose interactive sessions are recognized. A queue
    /// snapshot failure degrades to an empty queue; a failed accounting query
    /// fails the whole call.
    pub fn collect(&self, scope: &Scope, viewer: &str) -> Result<Vec<JobRecord>> {
        let raw = self
            .source
            .run_accounting_query(scope, &self.columns)
            .inspect_err(|e| error!("Accounting query failed: {}", e))?;

        let queue = self.source.live_queue().unwrap_or_else(|e| {
            warn!("Queue snapshot unavailable, continuing without it: {}", e);
            Vec::new()
        });

        let ctx = DeriveContext {
            queue: &queue,
            lookups: self.source,
            billing: self.billing,
        };

        aggregate_text(
            &raw,
            &self.columns,
            &SessionPattern::for_user(viewer),
            &ctx,
            self.policy,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::billing::PartitionRates;
    use crate::domain::queue::QueueEntry;
    use crate::error::{ParseError, SourceError};
    use crate::ports::{JobLookups, NoLookups};

    fn line(pairs: &[(Field, &str)]) -> String {
        SACCT_COLUMNS
            .iter()
            .map(|f| {
                pairs
                    .iter()
                    .find(|(k, _)| k == f)
                    .map(|(_, v)| *v)
                    .unwrap_or("")
            })
            .collect::<Vec<_>>()
            .join("|")
    }

    fn run(raw: &str, policy: MalformedLinePolicy) -> Result<Vec<JobRecord>> {
        let rates = PartitionRates::default();
        let ctx = DeriveContext {
            queue: &[],
            lookups: &NoLookups,
            billing: &rates,
        };
        aggregate_text(raw, &SACCT_COLUMNS, &SessionPattern::for_user("alice"), &ctx, policy)
    }

    struct FakeSource {
        output: std::result::Result<String, String>,
        queue_fails: bool,
        queries: Mutex<Vec<Scope>>,
    }

    impl FakeSource {
        fn ok(output: String) -> Self {
            Self {
                output: Ok(output),
                queue_fails: false,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    impl JobLookups for FakeSource {
        fn resolve_username(&self, _uid: u32) -> Option<String> {
            None
        }

        fn fetch_job_detail(&self, _job_id: &str) -> Option<HashMap<String, String>> {
            None
        }
    }

    impl AccountingSource for FakeSource {
        fn run_accounting_query(
            &self,
            scope: &Scope,
            _columns: &[Field],
        ) -> std::result::Result<String, SourceError> {
            self.queries.lock().unwrap().push(scope.clone());
            self.output
                .clone()
                .map_err(|detail| SourceError::command_failed("sacct", detail))
        }

        fn live_queue(&self) -> std::result::Result<Vec<QueueEntry>, SourceError> {
            if self.queue_fails {
                return Err(SourceError::command_failed("squeue", "exit status 1"));
            }
            Ok(vec![QueueEntry {
                jobid: "42".to_string(),
                partition: "shared".to_string(),
                name: "run".to_string(),
                user: "alice".to_string(),
                state: "RUNNING".to_string(),
                reason: "None".to_string(),
            }])
        }
    }

    #[test]
    fn test_two_steps_merge_to_one_job() {
        let raw = format!(
            "{}\n{}\n",
            line(&[(Field::JobId, "42"), (Field::Elapsed, "00:05:00"), (Field::State, "RUNNING")]),
            line(&[(Field::JobId, "42.batch"), (Field::Elapsed, "00:10:00"), (Field::State, "COMPLETED")]),
        );
        let jobs = run(&raw, MalformedLinePolicy::Skip).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_id, "42");
        assert_eq!(jobs[0].elapsed, 600);
        assert_eq!(jobs[0].state, "RUNNING");
    }

    #[test]
    fn test_empty_output_yields_no_jobs() {
        assert!(run("", MalformedLinePolicy::Fail).unwrap().is_empty());
        assert!(run("\n  \n", MalformedLinePolicy::Fail).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_line_skipped_by_default() {
        let raw = format!("garbage|line\n{}\n", line(&[(Field::JobId, "7")]));
        let jobs = run(&raw, MalformedLinePolicy::default()).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_id, "7");
    }

    #[test]
    fn test_malformed_line_fails_when_strict() {
        let raw = format!("{}\n\ngarbage|line\n", line(&[(Field::JobId, "7")]));
        match run(&raw, MalformedLinePolicy::Fail) {
            Err(AccountingError::MalformedLine { line, source }) => {
                assert_eq!(line, 3);
                assert_eq!(
                    source,
                    ParseError::ColumnCount {
                        expected: SACCT_COLUMNS.len(),
                        found: 2
                    }
                );
            }
            other => panic!("expected malformed line error, got {:?}", other),
        }
    }

    #[test]
    fn test_jobs_in_first_seen_order() {
        let raw = [
            line(&[(Field::JobId, "3")]),
            line(&[(Field::JobId, "1")]),
            line(&[(Field::JobId, "3.0")]),
            line(&[(Field::JobId, "2_1.batch")]),
        ]
        .join("\n");
        let ids: Vec<String> = run(&raw, MalformedLinePolicy::Skip)
            .unwrap()
            .into_iter()
            .map(|j| j.job_id)
            .collect();
        assert_eq!(ids, vec!["3", "1", "2_1"]);
    }

    #[test]
    fn test_collect_uses_source_and_queue() {
        let source = FakeSource::ok(line(&[
            (Field::JobId, "42"),
            (Field::State, "RUNNING"),
            (Field::Reason, "Priority"),
        ]));
        let rates = PartitionRates::default();
        let scope = Scope::UserHistory {
            user: "alice".to_string(),
        };

        let jobs = Aggregator::new(&source, &rates).collect(&scope, "alice").unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].reason, "None");
        assert_eq!(*source.queries.lock().unwrap(), vec![scope]);
    }

    #[test]
    fn test_collect_tolerates_queue_failure() {
        let mut source = FakeSource::ok(line(&[(Field::JobId, "42"), (Field::Reason, "Priority")]));
        source.queue_fails = true;
        let rates = PartitionRates::default();
        let scope = Scope::UserHistory {
            user: "alice".to_string(),
        };

        let jobs = Aggregator::new(&source, &rates).collect(&scope, "alice").unwrap();
        assert_eq!(jobs[0].reason, "Priority");
    }

    #[test]
    fn test_collect_propagates_source_failure() {
        let source = FakeSource {
            output: Err("exit status 1".to_string()),
            queue_fails: false,
            queries: Mutex::new(Vec::new()),
        };
        let rates = PartitionRates::default();
        let scope = Scope::UserHistory {
            user: "alice".to_string(),
        };

        let result = Aggregator::new(&source, &rates)
            .with_malformed_policy(MalformedLinePolicy::Fail)
            .collect(&scope, "alice");
        assert!(matches!(result, Err(AccountingError::Source(_))));
    }

    #[test]
    fn test_custom_columns() {
        let source = FakeSource::ok("5.0|FAILED\n5|COMPLETED\n".to_string());
        let rates = PartitionRates::default();
        let scope = Scope::UserHistory {
            user: "alice".to_string(),
        };

        let jobs = Aggregator::new(&source, &rates)
            .with_columns(&[Field::JobId, Field::State])
            .collect(&scope, "alice")
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].state, "FAILED");
        assert_eq!(jobs[0].elapsed, -1);
    }
}
