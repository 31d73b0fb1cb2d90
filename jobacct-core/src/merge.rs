//! Job merger
//!
//! Folds per-step accounting lines into one record per job. The schema's
//! merge policy decides, field by field, which line a value comes from.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::domain::field::{Field, FieldValues, MergePolicy, SCHEMA};
use crate::domain::job::SessionId;
use crate::parser::RawRecord;
use crate::session::SessionPattern;

/// One job after all of its lines have been folded together
#[derive(Debug, Clone, PartialEq)]
pub struct MergedJob {
    pub job_id: String,
    pub values: FieldValues,
    /// Session derived from the working directory of the first line
    pub session_id: SessionId,
}

/// Accumulates raw records into merged jobs, preserving first-seen order
pub struct JobMerger<'a> {
    jobs: Vec<MergedJob>,
    index: HashMap<String, usize>,
    sessions: &'a SessionPattern,
}

impl<'a> JobMerger<'a> {
    pub fn new(sessions: &'a SessionPattern) -> Self {
        Self {
            jobs: Vec::new(),
            index: HashMap::new(),
            sessions,
        }
    }

    /// Fold one line into the job it belongs to
    pub fn push(&mut self, record: RawRecord) {
        match self.index.get(&record.job_id) {
            Some(&slot) => merge_into(&mut self.jobs[slot].values, &record.values),
            None => {
                let mut values = record.values;
                values.set(Field::JobId, record.job_id.clone());
                let session_id = self.sessions.extract(values.get(Field::WorkDir));

                self.index.insert(record.job_id.clone(), self.jobs.len());
                self.jobs.push(MergedJob {
                    job_id: record.job_id,
                    values,
                    session_id,
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Merged jobs in the order their first line was seen
    pub fn finish(self) -> Vec<MergedJob> {
        self.jobs
    }
}

/// Apply every `Max` field of `incoming` to `stored`
///
/// A stored value is replaced only when the incoming one is strictly greater,
/// so ties keep whatever was seen first.
fn merge_into(stored: &mut FieldValues, incoming: &FieldValues) {
    for spec in SCHEMA.iter() {
        if let MergePolicy::Max(compare) = spec.merge {
            let candidate = incoming.get(spec.field);
            if compare(candidate, stored.get(spec.field)) == Ordering::Greater {
                stored.set(spec.field, candidate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::field::SACCT_COLUMNS;
    use crate::parser::parse_line;

    fn record(pairs: &[(Field, &str)]) -> RawRecord {
        let cols: Vec<&str> = SACCT_COLUMNS
            .iter()
            .map(|f| {
                pairs
                    .iter()
                    .find(|(k, _)| k == f)
                    .map(|(_, v)| *v)
                    .unwrap_or("")
            })
            .collect();
        parse_line(&cols.join("|"), &SACCT_COLUMNS).unwrap()
    }

    fn merge_all(records: Vec<RawRecord>) -> Vec<MergedJob> {
        let pattern = SessionPattern::for_user("alice");
        let mut merger = JobMerger::new(&pattern);
        for r in records {
            merger.push(r);
        }
        merger.finish()
    }

    #[test]
    fn test_first_fields_keep_first_line() {
        let jobs = merge_all(vec![
            record(&[(Field::JobId, "42"), (Field::State, "RUNNING"), (Field::JobName, "run")]),
            record(&[(Field::JobId, "42.batch"), (Field::State, "COMPLETED"), (Field::JobName, "batch")]),
        ]);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].values.get(Field::State), "RUNNING");
        assert_eq!(jobs[0].values.get(Field::JobName), "run");
    }

    #[test]
    fn test_max_fields_independent_of_order() {
        let a = record(&[(Field::JobId, "42"), (Field::Elapsed, "00:05:00"), (Field::MaxRss, "2G")]);
        let b = record(&[(Field::JobId, "42.0"), (Field::Elapsed, "00:10:00"), (Field::MaxRss, "1G")]);

        for lines in [vec![a.clone(), b.clone()], vec![b, a]] {
            let jobs = merge_all(lines);
            assert_eq!(jobs[0].values.get(Field::Elapsed), "00:10:00");
            assert_eq!(jobs[0].values.get(Field::MaxRss), "2G");
        }
    }

    #[test]
    fn test_ties_keep_stored_value() {
        let jobs = merge_all(vec![
            record(&[(Field::JobId, "1"), (Field::MaxRss, "1024K")]),
            record(&[(Field::JobId, "1.0"), (Field::MaxRss, "1M")]),
        ]);
        assert_eq!(jobs[0].values.get(Field::MaxRss), "1024K");
    }

    #[test]
    fn test_unparseable_duration_loses_to_known() {
        let jobs = merge_all(vec![
            record(&[(Field::JobId, "1"), (Field::TimeLimit, "UNLIMITED")]),
            record(&[(Field::JobId, "1.0"), (Field::TimeLimit, "00:00:00")]),
        ]);
        assert_eq!(jobs[0].values.get(Field::TimeLimit), "00:00:00");
    }

    #[test]
    fn test_job_id_is_stripped_and_order_preserved() {
        let jobs = merge_all(vec![
            record(&[(Field::JobId, "9.batch")]),
            record(&[(Field::JobId, "3")]),
            record(&[(Field::JobId, "9.extern")]),
        ]);
        let ids: Vec<&str> = jobs.iter().map(|j| j.job_id.as_str()).collect();
        assert_eq!(ids, vec!["9", "3"]);
        assert_eq!(jobs[0].values.get(Field::JobId), "9");
    }

    #[test]
    fn test_session_from_first_line_only() {
        let workdir = "/home/alice/ondemand/data/sys/dashboard/batch_connect/sys/jupyter/output/0b1c2d3e-4f50-4a6b-8c7d-9e0f1a2b3c4d";
        let jobs = merge_all(vec![
            record(&[(Field::JobId, "5"), (Field::WorkDir, "/tmp")]),
            record(&[(Field::JobId, "5.0"), (Field::WorkDir, workdir)]),
            record(&[(Field::JobId, "6"), (Field::WorkDir, workdir)]),
        ]);
        assert_eq!(jobs[0].session_id, SessionId(None));
        assert!(jobs[1].session_id.0.is_some());
    }
}
