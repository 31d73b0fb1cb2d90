//! Service-unit billing
//!
//! Converts a job's requested resources and run time into service units.

use serde::{Deserialize, Serialize};

use crate::domain::resources::ResourceRequest;

/// Used and reserved service units for one job
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceUnits {
    pub used: f64,
    pub required: f64,
}

/// Pricing policy applied to every derived job
pub trait ServiceUnitPolicy: Send + Sync {
    /// Charge a job
    ///
    /// # Arguments
    /// * `partition` - Partition the job ran in
    /// * `elapsed` - Run time in seconds
    /// * `time_limit` - Requested wall time in seconds
    /// * `tres` - Requested resources
    fn charge(&self, partition: &str, elapsed: i64, time_limit: i64, tres: &ResourceRequest) -> ServiceUnits;
}

/// Partition-based billing rates
///
/// Premium partitions multiply the charge, GPU partitions bill requested GPUs,
/// whole-node partitions bill every core of every requested node, and
/// everything else bills requested CPUs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionRates {
    pub premium_partitions: Vec<String>,
    pub premium_factor: f64,
    pub gpu_partitions: Vec<String>,
    pub whole_node_partitions: Vec<String>,
    pub cores_per_node: u64,
}

impl Default for PartitionRates {
    fn default() -> Self {
        Self {
            premium_partitions: vec!["highmem".to_string()],
            premium_factor: 4.0,
            gpu_partitions: vec!["gpu".to_string(), "gpu-debug".to_string()],
            whole_node_partitions: vec!["wholenode".to_string()],
            cores_per_node: 128,
        }
    }
}

impl PartitionRates {
    fn is_in(list: &[String], partition: &str) -> bool {
        list.iter().any(|p| p == partition)
    }

    /// Units billed per hour before the charge factor
    fn billed_units(&self, partition: &str, tres: &ResourceRequest) -> u64 {
        if Self::is_in(&self.gpu_partitions, partition) {
            tres.gpus()
        } else if Self::is_in(&self.whole_node_partitions, partition) {
            tres.nodes() * self.cores_per_node
        } else {
            tres.cpus()
        }
    }

    fn factor(&self, partition: &str) -> f64 {
        if Self::is_in(&self.premium_partitions, partition) {
            self.premium_factor
        } else {
            1.0
        }
    }
}

impl ServiceUnitPolicy for PartitionRates {
    fn charge(&self, partition: &str, elapsed: i64, time_limit: i64, tres: &ResourceRequest) -> ServiceUnits {
        let units = self.billed_units(partition, tres) as f64;
        let factor = self.factor(partition);

        ServiceUnits {
            used: units * (elapsed as f64 / 3600.0) * factor,
            required: units * (time_limit as f64 / 3600.0) * factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_partition_bills_cpus() {
        let tres = ResourceRequest::parse("cpu=4,node=1");
        let su = PartitionRates::default().charge("shared", 3600, 7200, &tres);
        assert_eq!(su, ServiceUnits { used: 4.0, required: 8.0 });
    }

    #[test]
    fn test_highmem_is_four_times_standard() {
        let rates = PartitionRates::default();
        let tres = ResourceRequest::parse("cpu=2");
        let standard = rates.charge("shared", 1800, 3600, &tres);
        let premium = rates.charge("highmem", 1800, 3600, &tres);
        assert_eq!(premium.used, standard.used * 4.0);
        assert_eq!(premium.required, standard.required * 4.0);
    }

    #[test]
    fn test_gpu_partitions_bill_gpus() {
        let tres = ResourceRequest::parse("cpu=32,gres/gpu=2");
        let rates = PartitionRates::default();
        assert_eq!(rates.charge("gpu", 3600, 3600, &tres).used, 2.0);
        assert_eq!(rates.charge("gpu-debug", 3600, 3600, &tres).used, 2.0);
    }

    #[test]
    fn test_wholenode_bills_all_cores() {
        let tres = ResourceRequest::parse("cpu=1,node=2");
        let su = PartitionRates::default().charge("wholenode", 3600, 3600, &tres);
        assert_eq!(su.used, 256.0);
    }

    #[test]
    fn test_missing_quantities_count_as_zero() {
        let su = PartitionRates::default().charge("gpu", 3600, 3600, &ResourceRequest::default());
        assert_eq!(su, ServiceUnits::default());
    }

    #[test]
    fn test_custom_rates() {
        let rates = PartitionRates {
            premium_partitions: vec!["bigmem".to_string()],
            premium_factor: 2.0,
            cores_per_node: 64,
            ..PartitionRates::default()
        };
        let tres = ResourceRequest::parse("cpu=1,node=1");
        assert_eq!(rates.charge("bigmem", 3600, 0, &tres).used, 2.0);
        assert_eq!(rates.charge("wholenode", 3600, 0, &tres).used, 64.0);
    }
}
