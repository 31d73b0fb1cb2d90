//! Job command handlers
//!
//! Fetches job records from the server and renders them either as JSON or as
//! a colored summary.

use anyhow::Result;
use chrono::{Local, TimeZone};
use colored::*;
use jobacct_core::domain::job::{JobId, JobRecord, SessionId, Timestamp};
use jobacct_core::domain::queue::QueueEntry;

use crate::api::ApiClient;
use crate::config::Config;

/// Jobs in the user's allocations
pub async fn my_jobs(config: &Config, cached: bool, json: bool) -> Result<()> {
    let client = ApiClient::new(&config.server_url);
    let jobs = client.my_jobs(cached).await?;

    print_jobs(&jobs, json)
}

/// The user's full history
pub async fn history(config: &Config, json: bool) -> Result<()> {
    let client = ApiClient::new(&config.server_url);
    let jobs = client.user_history().await?;

    print_jobs(&jobs, json)
}

/// Details of one job
pub async fn job(config: &Config, jobid: &str, json: bool) -> Result<()> {
    let job_id = JobId::parse(jobid)?;

    let client = ApiClient::new(&config.server_url);
    let jobs = client.job_history(&job_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
        return Ok(());
    }

    for job in &jobs {
        print_job_details(job);
    }

    Ok(())
}

/// The user's most recent queue entries
pub async fn queue(config: &Config) -> Result<()> {
    let client = ApiClient::new(&config.server_url);
    let entries = client.job_queue().await?;

    if entries.is_empty() {
        println!("{}", "No queued jobs.".yellow());
        return Ok(());
    }

    println!("{}", format!("{} recent queue entries:", entries.len()).bold());
    println!();
    for entry in &entries {
        print_queue_entry(entry);
    }

    Ok(())
}

fn print_jobs(jobs: &[JobRecord], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(jobs)?);
        return Ok(());
    }

    if jobs.is_empty() {
        println!("{}", "No jobs found.".yellow());
    } else {
        println!("{}", format!("Found {} job(s):", jobs.len()).bold());
        println!();
        for job in jobs {
            print_job_summary(job);
        }
    }

    Ok(())
}

fn print_job_summary(job: &JobRecord) {
    println!("  {} Job {} {}", "▸".cyan(), job.job_id.bold(), job.job_name.dimmed());
    println!("    State:     {}", colorize_state(&job.state));
    println!("    Partition: {}", job.partition);
    println!("    Started:   {}", format_timestamp(job.start).dimmed());
    println!("    Elapsed:   {}", format_duration(job.elapsed));
    println!("    SU:        {:.2}", job.used_su);
    println!();
}

fn print_job_details(job: &JobRecord) {
    println!("{}", "Job Details:".bold());
    println!("  ID:          {}", job.job_id.cyan());
    println!("  Name:        {}", job.job_name);
    println!("  User:        {}", job.user);
    println!("  Account:     {}", job.account);
    println!("  Partition:   {}", job.partition);
    println!("  State:       {}", colorize_state(&job.state));
    if !job.reason.is_empty() && job.reason != "None" {
        println!("  Reason:      {}", job.reason.dimmed());
    }
    if let Some(count) = job.requeue_count {
        println!("  Requeued:    {} time(s)", count);
    }

    println!("\n{}", "Timing:".bold());
    println!("  Submitted:   {}", format_timestamp(job.submit));
    println!("  Started:     {}", format_timestamp(job.start));
    println!("  Ended:       {}", format_timestamp(job.end));
    println!("  Waited:      {}", format_duration(job.planned));
    println!("  Elapsed:     {}", format_duration(job.elapsed));
    println!("  Time limit:  {}", format_duration(job.time_limit));

    println!("\n{}", "Resources:".bold());
    println!("  CPUs:        {}", job.alloc_cpus);
    println!("  Memory:      {}", format_bytes(job.requested_memory));
    println!("  Max RSS:     {}", format_bytes(job.max_rss));
    println!("  Disk read:   {}", format_bytes(job.max_disk_read));
    println!("  Disk write:  {}", format_bytes(job.max_disk_write));
    println!("  Nodes:       {}", job.node_list);
    if job.requested_tres.gpus() > 0 {
        println!("  GPUs:        {}", job.requested_tres.gpus());
    }

    println!("\n{}", "Usage:".bold());
    println!("  SU used:     {:.2} of {:.2}", job.used_su, job.required_su);
    println!("  Time eff.:   {}", format_percent(job.time_efficiency));
    println!("  CPU eff.:    {}", format_percent(job.cpu_efficiency));
    println!("  Memory eff.: {}", format_percent(job.memory_efficiency));

    println!("\n  Work dir:    {}", job.work_dir.dimmed());
    if let SessionId(Some(session)) = job.session_id {
        println!("  Session:     {}", session.to_string().cyan());
    }
    println!();
}

fn print_queue_entry(entry: &QueueEntry) {
    println!(
        "  {} {:<12} {:<10} {:<24} {}",
        "▸".cyan(),
        entry.jobid,
        entry.partition,
        entry.name,
        colorize_state(&entry.state)
    );
    if entry.reason != "None" {
        println!("    {}", entry.reason.dimmed());
    }
}

/// Colorize a scheduler state for display
fn colorize_state(state: &str) -> ColoredString {
    match state {
        "RUNNING" | "COMPLETING" => state.cyan(),
        "COMPLETED" => state.green(),
        "PENDING" | "REQUEUED" | "SUSPENDED" => state.yellow(),
        "FAILED" | "TIMEOUT" | "OUT_OF_MEMORY" | "NODE_FAIL" | "BOOT_FAIL" => state.red(),
        s if s.starts_with("CANCELLED") => state.dimmed(),
        _ => state.normal(),
    }
}

/// `H:MM:SS`, or `-` for an unknown duration
fn format_duration(seconds: i64) -> String {
    if seconds < 0 {
        return "-".to_string();
    }
    format!(
        "{}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

fn format_timestamp(ts: Timestamp) -> String {
    ts.epoch()
        .and_then(|secs| Local.timestamp_opt(secs, 0).single())
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Binary-prefixed size, e.g. `1.50 GiB`
fn format_bytes(bytes: f64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

    let mut value = bytes.max(0.0);
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} B", value)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

fn format_percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}%", v))
        .unwrap_or_else(|| "n/a".to_string())
}
