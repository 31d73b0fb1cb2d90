//! Live queue domain types

use serde::{Deserialize, Serialize};

/// One job as currently seen by the scheduler queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub jobid: String,
    pub partition: String,
    pub name: String,
    pub user: String,
    pub state: String,
    pub reason: String,
}
