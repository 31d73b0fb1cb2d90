//! Offline command handlers
//!
//! Runs the aggregation engine over an accounting dump captured earlier with
//! `sacct -P -n -o <columns>`. There is no scheduler to ask, so no secondary
//! lookups happen and the queue is empty.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use jobacct_core::billing::PartitionRates;
use jobacct_core::derive::DeriveContext;
use jobacct_core::domain::field::{SACCT_COLUMNS, format_columns};
use jobacct_core::domain::job::JobRecord;
use jobacct_core::ports::NoLookups;
use jobacct_core::session::SessionPattern;
use jobacct_core::{MalformedLinePolicy, aggregate_text};

/// Aggregate a dump and print the records as JSON
pub fn parse_dump(input: &Path, user: &str, strict: bool) -> Result<()> {
    let raw = read_input(input)?;
    let jobs = aggregate_dump(&raw, user, strict)?;

    println!("{}", serde_json::to_string_pretty(&jobs)?);
    Ok(())
}

/// Print the column order dumps must be captured with
pub fn print_columns() {
    println!("{}", format_columns(&SACCT_COLUMNS));
}

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read accounting dump from stdin")?;
        return Ok(raw);
    }

    std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read accounting dump {}", input.display()))
}

fn aggregate_dump(raw: &str, user: &str, strict: bool) -> Result<Vec<JobRecord>> {
    let rates = PartitionRates::default();
    let ctx = DeriveContext {
        queue: &[],
        lookups: &NoLookups,
        billing: &rates,
    };
    let policy = if strict {
        MalformedLinePolicy::Fail
    } else {
        MalformedLinePolicy::Skip
    };

    let jobs = aggregate_text(raw, &SACCT_COLUMNS, &SessionPattern::for_user(user), &ctx, policy)
        .context("Failed to aggregate accounting dump")?;
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobacct_core::domain::field::Field;

    fn line(jobid: &str, elapsed: &str) -> String {
        SACCT_COLUMNS
            .iter()
            .map(|field| match field {
                Field::JobId => jobid,
                Field::Elapsed => elapsed,
                Field::State => "COMPLETED",
                Field::User => "alice",
                _ => "",
            })
            .collect::<Vec<_>>()
            .join("|")
    }

    #[test]
    fn test_dump_merges_steps() {
        let raw = format!("{}\n{}\n", line("5", "00:01:00"), line("5.0", "00:02:30"));
        let jobs = aggregate_dump(&raw, "alice", true).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_id, "5");
        assert_eq!(jobs[0].elapsed, 150);
    }

    #[test]
    fn test_strict_rejects_malformed_lines() {
        let raw = format!("{}\nnot|a|record\n", line("5", "00:01:00"));
        assert!(aggregate_dump(&raw, "alice", true).is_err());

        let jobs = aggregate_dump(&raw, "alice", false).unwrap();
        assert_eq!(jobs.len(), 1);
    }
}
