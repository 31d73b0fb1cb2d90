//! Adapter configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, SlurmError};

/// Slurm adapter configuration
///
/// Cache lifetimes are tuned for a dashboard polled every few seconds: the
/// queue changes constantly, allocations almost never.
#[derive(Debug, Clone, PartialEq)]
pub struct SlurmConfig {
    /// Directory holding the scheduler binaries; `PATH` lookup when unset
    pub bin_dir: Option<PathBuf>,

    /// How long a queue snapshot is served as fresh
    pub queue_ttl: Duration,

    /// How long an expired snapshot may still be served during a refresh
    pub queue_grace: Duration,

    /// How long a user's account list is kept
    pub allocations_ttl: Duration,
}

impl Default for SlurmConfig {
    fn default() -> Self {
        Self {
            bin_dir: None,
            queue_ttl: Duration::from_secs(10),
            queue_grace: Duration::from_secs(2),
            allocations_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl SlurmConfig {
    pub fn with_bin_dir(mut self, bin_dir: impl Into<PathBuf>) -> Self {
        self.bin_dir = Some(bin_dir.into());
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.bin_dir {
            if dir.as_os_str().is_empty() {
                return Err(SlurmError::Config("bin_dir cannot be empty".to_string()));
            }
        }

        if self.queue_ttl.is_zero() {
            return Err(SlurmError::Config("queue_ttl must be greater than 0".to_string()));
        }

        if self.allocations_ttl.is_zero() {
            return Err(SlurmError::Config(
                "allocations_ttl must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
