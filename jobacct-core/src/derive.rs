//! Metric deriver
//!
//! Turns a merged job into its final [`JobRecord`]: raw values are
//! canonicalized once, then the computed fields are filled in.

use tracing::{debug, warn};

use crate::billing::ServiceUnitPolicy;
use crate::canonical::{byte_size_to_bytes, duration_to_seconds, timestamp_to_epoch};
use crate::domain::field::Field;
use crate::domain::job::{JobRecord, TimeAnchor};
use crate::domain::queue::QueueEntry;
use crate::domain::resources::ResourceRequest;
use crate::merge::MergedJob;
use crate::nodelist::expand_node_list;
use crate::ports::JobLookups;

/// State recorded for jobs that went back to the queue
pub const REQUEUED: &str = "REQUEUED";

/// Detail key holding a job's restart count
const RESTARTS_KEY: &str = "Restarts";

const CANCELLED_BY: &str = "CANCELLED by ";

/// Everything outside the merged job that derivation depends on
pub struct DeriveContext<'a> {
    pub queue: &'a [QueueEntry],
    pub lookups: &'a dyn JobLookups,
    pub billing: &'a dyn ServiceUnitPolicy,
}

/// Derive the final record for one merged job
pub fn derive_job(merged: MergedJob, ctx: &DeriveContext<'_>) -> JobRecord {
    let MergedJob {
        job_id,
        values,
        session_id,
    } = merged;
    let raw = |field: Field| values.get(field);

    // Canonical values
    let start = timestamp_to_epoch(raw(Field::Start));
    let end = timestamp_to_epoch(raw(Field::End));
    let submit = timestamp_to_epoch(raw(Field::Submit));
    let elapsed = duration_to_seconds(raw(Field::Elapsed));
    let planned = duration_to_seconds(raw(Field::Planned));
    let time_limit = duration_to_seconds(raw(Field::TimeLimit));
    let total_cpu = duration_to_seconds(raw(Field::TotalCpu));
    let requested_memory = byte_size_to_bytes(raw(Field::RequestedMemory));
    let max_rss = byte_size_to_bytes(raw(Field::MaxRss));
    let max_disk_write = byte_size_to_bytes(raw(Field::MaxDiskWrite));
    let max_disk_read = byte_size_to_bytes(raw(Field::MaxDiskRead));
    let alloc_cpus = raw(Field::AllocCpus).trim().parse::<u32>().unwrap_or(0);

    let state = attribute_cancellation(raw(Field::State), ctx.lookups);
    let reason = ctx
        .queue
        .iter()
        .find(|entry| entry.jobid == job_id && entry.state == state)
        .map(|entry| entry.reason.clone())
        .unwrap_or_else(|| raw(Field::Reason).to_string());

    let requeue_count = if state == REQUEUED {
        requeue_count(&job_id, ctx.lookups)
    } else {
        None
    };

    let partition = raw(Field::Partition).to_string();
    let requested_tres = ResourceRequest::parse(raw(Field::RequestedTres));
    let su = ctx
        .billing
        .charge(&partition, elapsed, time_limit, &requested_tres);

    JobRecord {
        job_name: raw(Field::JobName).to_string(),
        user: raw(Field::User).to_string(),
        account: raw(Field::Account).to_string(),
        start,
        end,
        elapsed,
        submit,
        planned,
        used_su: su.used,
        required_su: su.required,
        time_efficiency: time_efficiency(elapsed, time_limit),
        cpu_efficiency: cpu_efficiency(total_cpu, alloc_cpus, elapsed),
        memory_efficiency: memory_efficiency(max_rss, requested_memory),
        partition,
        state,
        reason,
        time_limit,
        requested_memory,
        alloc_cpus,
        total_cpu,
        work_dir: raw(Field::WorkDir).to_string(),
        session_id,
        requeue_count,
        max_rss,
        max_disk_write,
        max_disk_read,
        node_list: expand_node_list(raw(Field::NodeList)),
        requested_tres,
        timestamp: TimeAnchor::first_known(&[start, submit, end]),
        job_id,
    }
}

/// Replace the numeric uid in `CANCELLED by <uid>` with the user's name
fn attribute_cancellation(state: &str, lookups: &dyn JobLookups) -> String {
    let uid = state
        .strip_prefix(CANCELLED_BY)
        .filter(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|rest| rest.parse::<u32>().ok());

    let Some(uid) = uid else {
        return state.to_string();
    };

    match lookups.resolve_username(uid) {
        Some(name) => format!("{}{}", CANCELLED_BY, name),
        None => {
            warn!("Could not resolve uid {} for cancelled job", uid);
            state.to_string()
        }
    }
}

fn requeue_count(job_id: &str, lookups: &dyn JobLookups) -> Option<u32> {
    debug!("Fetching restart count for requeued job {}", job_id);

    let Some(detail) = lookups.fetch_job_detail(job_id) else {
        warn!("No job detail available for requeued job {}", job_id);
        return None;
    };

    detail
        .get(RESTARTS_KEY)
        .and_then(|restarts| restarts.trim().parse().ok())
}

// =============================================================================
// Efficiency ratios
// =============================================================================

/// Round to two decimal places, half away from zero
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `numerator * 100 / denominator` rounded to two decimals, `None` unless finite
pub fn percentage(numerator: f64, denominator: f64) -> Option<f64> {
    let ratio = numerator * 100.0 / denominator;
    ratio.is_finite().then(|| round2(ratio))
}

/// Share of the time limit actually used
pub fn time_efficiency(elapsed: i64, time_limit: i64) -> Option<f64> {
    percentage(elapsed as f64, time_limit as f64)
}

/// CPU time used over CPU time allocated
pub fn cpu_efficiency(total_cpu: i64, alloc_cpus: u32, elapsed: i64) -> Option<f64> {
    percentage(total_cpu as f64, alloc_cpus as f64 * elapsed as f64)
}

/// Peak resident memory over requested memory
pub fn memory_efficiency(max_rss: f64, requested_memory: f64) -> Option<f64> {
    percentage(max_rss, requested_memory)
}
