//! Server configuration
//!
//! Defines all configurable parameters for the server: where it listens,
//! whose jobs it reports, and how the Slurm adapter behaves.

use std::time::Duration;

use jobacct_core::MalformedLinePolicy;
use jobacct_slurm::SlurmConfig;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP listener to (e.g., "0.0.0.0:8080")
    pub bind_addr: String,

    /// User whose jobs, allocations and sessions are reported
    pub user: String,

    /// Length of the "my jobs" window, in days before today
    pub window_days: u32,

    /// Handling of accounting lines that do not fit the column layout
    pub malformed_policy: MalformedLinePolicy,

    /// Scheduler adapter settings
    pub slurm: SlurmConfig,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(user: String) -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            user,
            window_days: 7,
            malformed_policy: MalformedLinePolicy::Skip,
            slurm: SlurmConfig::default(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - JOBACCT_USER (optional, falls back to USER; one of them required)
    /// - JOBACCT_BIND_ADDR (optional, default: 0.0.0.0:8080)
    /// - JOBACCT_WINDOW_DAYS (optional, default: 7)
    /// - JOBACCT_SKIP_MALFORMED (optional, default: true)
    /// - JOBACCT_SLURM_BIN_DIR (optional, default: resolve through PATH)
    /// - JOBACCT_QUEUE_TTL (optional, seconds, default: 10)
    /// - JOBACCT_QUEUE_GRACE (optional, seconds, default: 2)
    /// - JOBACCT_ALLOCATIONS_TTL (optional, seconds, default: 86400)
    pub fn from_env() -> anyhow::Result<Self> {
        let user = std::env::var("JOBACCT_USER")
            .or_else(|_| std::env::var("USER"))
            .map_err(|_| anyhow::anyhow!("Neither JOBACCT_USER nor USER is set"))?;

        let mut config = Self::new(user);

        if let Ok(addr) = std::env::var("JOBACCT_BIND_ADDR") {
            config.bind_addr = addr;
        }

        config.window_days = std::env::var("JOBACCT_WINDOW_DAYS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(config.window_days);

        let skip = std::env::var("JOBACCT_SKIP_MALFORMED")
            .ok()
            .and_then(|s| s.parse::<bool>().ok())
            .unwrap_or(true);
        config.malformed_policy = if skip {
            MalformedLinePolicy::Skip
        } else {
            MalformedLinePolicy::Fail
        };

        if let Ok(dir) = std::env::var("JOBACCT_SLURM_BIN_DIR") {
            config.slurm = config.slurm.with_bin_dir(dir);
        }

        config.slurm.queue_ttl = seconds_var("JOBACCT_QUEUE_TTL").unwrap_or(config.slurm.queue_ttl);
        config.slurm.queue_grace =
            seconds_var("JOBACCT_QUEUE_GRACE").unwrap_or(config.slurm.queue_grace);
        config.slurm.allocations_ttl =
            seconds_var("JOBACCT_ALLOCATIONS_TTL").unwrap_or(config.slurm.allocations_ttl);

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.user.is_empty() {
            anyhow::bail!("user cannot be empty");
        }

        if self.user.contains('/') || self.user.chars().any(char::is_whitespace) {
            anyhow::bail!("user must be a plain login name");
        }

        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.window_days == 0 {
            anyhow::bail!("window_days must be greater than 0");
        }

        self.slurm.validate()?;

        Ok(())
    }
}

fn seconds_var(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

impl Default for Config {
    fn default() -> Self {
        Self::new("nobody".to_string())
    }
}
