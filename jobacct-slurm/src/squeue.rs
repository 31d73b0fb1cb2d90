//! Live queue parsing

use jobacct_core::domain::queue::QueueEntry;
use tracing::warn;

/// Parse `squeue -h -o "%i|%P|%j|%u|%T|%r"` output
///
/// Blank lines are skipped, and so are rows with fewer than six columns.
/// Anything after the sixth delimiter stays part of the reason, which is
/// free text.
pub fn parse_squeue(output: &str) -> Vec<QueueEntry> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(parse_row)
        .collect()
}

fn parse_row(line: &str) -> Option<QueueEntry> {
    let cols: Vec<&str> = line.trim_end().splitn(6, '|').collect();

    let [jobid, partition, name, user, state, reason] = cols[..] else {
        warn!("Skipping queue row with {} columns: {:?}", cols.len(), line);
        return None;
    };

    Some(QueueEntry {
        jobid: jobid.trim().to_string(),
        partition: partition.to_string(),
        name: name.to_string(),
        user: user.to_string(),
        state: state.to_string(),
        reason: reason.to_string(),
    })
}

/// Sort key ordering `123` and `123_4` style ids numerically
fn job_id_key(jobid: &str) -> (u64, u64) {
    let (job, index) = jobid.split_once('_').unwrap_or((jobid, "0"));
    (job.parse().unwrap_or(0), index.parse().unwrap_or(0))
}

/// The `limit` most recent queue entries belonging to `user`
///
/// Most recent means highest job id first.
pub fn recent_for_user(queue: &[QueueEntry], user: &str, limit: usize) -> Vec<QueueEntry> {
    let mut mine: Vec<QueueEntry> = queue.iter().filter(|e| e.user == user).cloned().collect();
    mine.sort_by(|a, b| {
        job_id_key(&b.jobid)
            .cmp(&job_id_key(&a.jobid))
            .then_with(|| b.jobid.cmp(&a.jobid))
    });
    mine.truncate(limit);
    mine
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = "\
101|shared|train|alice|RUNNING|None
99|gpu|infer|alice|PENDING|Priority
100_2|shared|sweep|bob|PENDING|QOSMaxJobsPerUserLimit

102|debug|x|alice|COMPLETED|None
";

    #[test]
    fn test_parse_rows() {
        let queue = parse_squeue(OUTPUT);
        assert_eq!(queue.len(), 4);
        assert_eq!(queue[1].jobid, "99");
        assert_eq!(queue[1].partition, "gpu");
        assert_eq!(queue[1].reason, "Priority");
        assert_eq!(queue[2].user, "bob");
    }

    #[test]
    fn test_reason_may_contain_delimiter() {
        let queue = parse_squeue("1|p|n|u|PENDING|a|b\n");
        assert_eq!(queue[0].reason, "a|b");
    }

    #[test]
    fn test_short_row_is_skipped() {
        let queue = parse_squeue("1|p|n\n2|shared|run|alice|RUNNING|None\n3|gpu\n");
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].jobid, "2");
        assert_eq!(queue[0].reason, "None");
    }

    #[test]
    fn test_empty_output() {
        assert!(parse_squeue("").is_empty());
    }

    #[test]
    fn test_recent_for_user_sorts_numerically() {
        let queue = parse_squeue(OUTPUT);
        let recent = recent_for_user(&queue, "alice", 2);
        let ids: Vec<&str> = recent.iter().map(|e| e.jobid.as_str()).collect();
        assert_eq!(ids, vec!["102", "101"]);

        let all = recent_for_user(&queue, "alice", 5);
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].jobid, "99");
        assert!(recent_for_user(&queue, "carol", 5).is_empty());
    }
}
