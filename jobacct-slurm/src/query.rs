//! Command lines for the scheduler tools
//!
//! Pure builders, kept separate from execution so the exact arguments can be
//! asserted in tests.

use chrono::NaiveDateTime;
use jobacct_core::domain::field::{Field, format_columns};
use jobacct_core::ports::Scope;

pub const SACCT: &str = "sacct";
pub const SACCTMGR: &str = "sacctmgr";
pub const SQUEUE: &str = "squeue";
pub const SCONTROL: &str = "scontrol";
pub const ID: &str = "id";
pub const JOBINFO: &str = "jobinfo";

/// Time format accepted by `sacct -S/-E`
const SACCT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Start of a user's full history
const ALL_TIME: &str = "now-100000days";

/// `squeue -o` layout parsed by [`crate::squeue::parse_squeue`]
pub const SQUEUE_FORMAT: &str = "%i|%P|%j|%u|%T|%r";

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn sacct_time(time: &NaiveDateTime) -> String {
    time.format(SACCT_TIME_FORMAT).to_string()
}

/// `sacct` arguments for a query scope
///
/// Output is always parsable (`-P`) without a header (`-n`), columns in the
/// given order.
pub fn sacct_args(scope: &Scope, columns: &[Field]) -> Vec<String> {
    let format = format_columns(columns);

    match scope {
        Scope::Allocations {
            accounts,
            start,
            end,
            ..
        } => {
            let (start, end) = (sacct_time(start), sacct_time(end));
            let accounts = accounts.join(",");
            args(&[
                "-S",
                start.as_str(),
                "-E",
                end.as_str(),
                "-P",
                "-n",
                "-a",
                "-o",
                format.as_str(),
                "-A",
                accounts.as_str(),
            ])
        }
        Scope::UserHistory { user } => {
            args(&["-S", ALL_TIME, "-P", "-n", "-u", user.as_str(), "-o", format.as_str()])
        }
        Scope::Job { job_id } => args(&["-j", job_id.as_str(), "-P", "-n", "-o", format.as_str()]),
    }
}

/// `sacctmgr` arguments listing the accounts a user is associated with
pub fn allocations_args(user: &str) -> Vec<String> {
    args(&["show", "user", user, "withassoc", "format=account", "-P", "-n", "-r"])
}

/// `squeue` arguments for a snapshot of every job in every state
pub fn squeue_args() -> Vec<String> {
    args(&["-t", "all", "-h", "-o", SQUEUE_FORMAT])
}

/// `scontrol` arguments for one job on a single line
pub fn job_detail_args(job_id: &str) -> Vec<String> {
    args(&["show", "job", job_id, "-o"])
}

/// `id` arguments resolving a uid to a login name
pub fn username_args(uid: u32) -> Vec<String> {
    vec!["-un".to_string(), uid.to_string()]
}

/// `jobinfo` arguments for the verbose report of one job
pub fn jobinfo_args(job_id: &str) -> Vec<String> {
    args(&["-v", job_id])
}
