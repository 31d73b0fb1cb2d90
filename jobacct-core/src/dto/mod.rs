//! Data Transfer Objects shared by the HTTP service and its clients

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Query string of the "my jobs" endpoint
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct JobsQuery {
    /// Serve the last computed list if one exists
    #[serde(default)]
    pub use_cache: bool,
}

/// Error body returned by the HTTP service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Site job report, one entry per `Key: value` line
pub type JobInfo = BTreeMap<String, String>;
