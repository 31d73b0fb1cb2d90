//! Site `jobinfo -v` report parsing

use jobacct_core::dto::JobInfo;

/// Key whose value is `--` until the job has finished
pub const EXIT_CODE_KEY: &str = "ExitCode";

/// Parse `Key : value` lines, splitting on the first colon
///
/// Lines without a colon become keys with an empty value; for repeated keys
/// the last line wins.
pub fn parse_jobinfo(output: &str) -> JobInfo {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match line.split_once(':') {
            Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
            None => (line.trim().to_string(), String::new()),
        })
        .collect()
}

/// Whether a report describes a finished job and can be kept indefinitely
pub fn is_final(info: &JobInfo) -> bool {
    info.get(EXIT_CODE_KEY).is_some_and(|code| code != "--")
}
