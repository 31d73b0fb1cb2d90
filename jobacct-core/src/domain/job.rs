//! Job domain types
//!
//! The canonical per-job record produced by the aggregation engine, plus the
//! small value types whose "unknown" state serializes as a sentinel string.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::domain::resources::ResourceRequest;
use crate::error::InvalidJobId;

/// Sentinel for a value that could not be determined
pub const NOT_AVAILABLE: &str = "N/A";

/// Sentinel for a job with no usable timestamp at all
pub const NO_TIMESTAMP: &str = "--";

/// Validated scheduler job identifier: `<number>` or `<number>_<array-index>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(String);

impl JobId {
    pub fn parse(input: &str) -> Result<Self, InvalidJobId> {
        let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

        let valid = match input.split_once('_') {
            Some((job, index)) => digits(job) && digits(index),
            None => digits(input),
        };

        if valid {
            Ok(JobId(input.to_string()))
        } else {
            Err(InvalidJobId(input.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for JobId {
    type Err = InvalidJobId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobId::parse(s)
    }
}

impl TryFrom<String> for JobId {
    type Error = InvalidJobId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        JobId::parse(&value)
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wire shape shared by the sentinel-bearing value types
#[derive(Deserialize)]
#[serde(untagged)]
enum SentinelRepr {
    Number(i64),
    Text(String),
}

/// A point in time as epoch seconds, or `"N/A"` when it could not be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Epoch(i64),
    Unknown,
}

impl Timestamp {
    pub fn epoch(self) -> Option<i64> {
        match self {
            Timestamp::Epoch(secs) => Some(secs),
            Timestamp::Unknown => None,
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Timestamp::Epoch(secs) => serializer.serialize_i64(*secs),
            Timestamp::Unknown => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match SentinelRepr::deserialize(deserializer)? {
            SentinelRepr::Number(secs) => Ok(Timestamp::Epoch(secs)),
            SentinelRepr::Text(text) if text == NOT_AVAILABLE => Ok(Timestamp::Unknown),
            SentinelRepr::Text(text) => Err(D::Error::custom(format!(
                "expected epoch seconds or \"{}\", found \"{}\"",
                NOT_AVAILABLE, text
            ))),
        }
    }
}

/// Sort/display anchor of a job: the first known of start, submit and end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeAnchor {
    Epoch(i64),
    Missing,
}

impl TimeAnchor {
    pub fn first_known(candidates: &[Timestamp]) -> Self {
        candidates
            .iter()
            .find_map(|t| t.epoch())
            .map(TimeAnchor::Epoch)
            .unwrap_or(TimeAnchor::Missing)
    }
}

impl Serialize for TimeAnchor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TimeAnchor::Epoch(secs) => serializer.serialize_i64(*secs),
            TimeAnchor::Missing => serializer.serialize_str(NO_TIMESTAMP),
        }
    }
}

impl<'de> Deserialize<'de> for TimeAnchor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match SentinelRepr::deserialize(deserializer)? {
            SentinelRepr::Number(secs) => Ok(TimeAnchor::Epoch(secs)),
            SentinelRepr::Text(text) if text == NO_TIMESTAMP => Ok(TimeAnchor::Missing),
            SentinelRepr::Text(text) => Err(D::Error::custom(format!(
                "expected epoch seconds or \"{}\", found \"{}\"",
                NO_TIMESTAMP, text
            ))),
        }
    }
}

/// Interactive (batch connect) session a job belongs to, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionId(pub Option<Uuid>);

impl Serialize for SessionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            Some(uuid) => serializer.collect_str(&uuid.hyphenated()),
            None => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        if text == NOT_AVAILABLE {
            return Ok(SessionId(None));
        }
        Uuid::parse_str(&text)
            .map(|uuid| SessionId(Some(uuid)))
            .map_err(D::Error::custom)
    }
}

/// Canonical accounting record for one job
///
/// Serialized field names are the schema's wire names. Durations are seconds
/// (`-1` when unknown), sizes are bytes, efficiencies are percentages rounded
/// to two decimals and `null` when the ratio is not finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(rename = "jobid")]
    pub job_id: String,
    #[serde(rename = "jobname")]
    pub job_name: String,
    pub user: String,
    pub account: String,
    pub start: Timestamp,
    pub end: Timestamp,
    pub elapsed: i64,
    pub submit: Timestamp,
    pub planned: i64,
    pub used_su: f64,
    pub required_su: f64,
    #[serde(rename = "timeeff")]
    pub time_efficiency: Option<f64>,
    #[serde(rename = "cpueff")]
    pub cpu_efficiency: Option<f64>,
    #[serde(rename = "memeff")]
    pub memory_efficiency: Option<f64>,
    pub partition: String,
    pub state: String,
    pub reason: String,
    #[serde(rename = "timelimit")]
    pub time_limit: i64,
    #[serde(rename = "reqmem")]
    pub requested_memory: f64,
    #[serde(rename = "alloccpus")]
    pub alloc_cpus: u32,
    #[serde(rename = "totalcpu")]
    pub total_cpu: i64,
    #[serde(rename = "workdir")]
    pub work_dir: String,
    #[serde(rename = "sessionid")]
    pub session_id: SessionId,
    pub requeue_count: Option<u32>,
    #[serde(rename = "maxrss")]
    pub max_rss: f64,
    #[serde(rename = "maxdiskwrite")]
    pub max_disk_write: f64,
    #[serde(rename = "maxdiskread")]
    pub max_disk_read: f64,
    #[serde(rename = "nodelist")]
    pub node_list: String,
    #[serde(rename = "reqtres")]
    pub requested_tres: ResourceRequest,
    pub timestamp: TimeAnchor,
}
