//! Field schema
//!
//! Static, declarative description of every job field: its value domain and
//! how it is chosen when one job spans several accounting lines (one per job
//! step). The merger and the column-order contract are both driven from here.

use std::cmp::Ordering;

use crate::canonical::{byte_size_to_bytes, duration_to_seconds};

/// Number of fields in the schema
pub const FIELD_COUNT: usize = 30;

/// Number of fields requested from the accounting tool
pub const COLUMN_COUNT: usize = 22;

/// Every field a job record carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    JobId,
    JobName,
    User,
    Account,
    Start,
    End,
    Elapsed,
    Submit,
    Planned,
    UsedSu,
    RequiredSu,
    TimeEfficiency,
    CpuEfficiency,
    MemoryEfficiency,
    Partition,
    State,
    Reason,
    TimeLimit,
    RequestedMemory,
    AllocCpus,
    TotalCpu,
    WorkDir,
    SessionId,
    RequeueCount,
    MaxRss,
    MaxDiskWrite,
    MaxDiskRead,
    NodeList,
    RequestedTres,
    Timestamp,
}

/// Value domain of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Text,
    Duration,
    ByteSize,
    Timestamp,
    Computed,
}

/// Total order over raw field values
pub type Comparator = fn(&str, &str) -> Ordering;

/// How a field's value is chosen across the lines of one job
#[derive(Debug, Clone, Copy)]
pub enum MergePolicy {
    /// The first line seen for a job wins
    First,
    /// The greatest value under the comparator wins; ties keep the stored value
    Max(Comparator),
    /// Never read from raw lines; filled in after the merge
    Computed,
}

impl MergePolicy {
    pub fn is_computed(&self) -> bool {
        matches!(self, MergePolicy::Computed)
    }
}

/// Schema entry for one field
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: Field,
    /// Wire name, used both for the `sacct -o` argument and JSON output
    pub name: &'static str,
    pub kind: ValueKind,
    pub merge: MergePolicy,
}

const fn spec(field: Field, name: &'static str, kind: ValueKind, merge: MergePolicy) -> FieldSpec {
    FieldSpec {
        field,
        name,
        kind,
        merge,
    }
}

use MergePolicy::{Computed, First, Max};

/// The field schema, in wire order
pub static SCHEMA: [FieldSpec; FIELD_COUNT] = [
    spec(Field::JobId, "jobid", ValueKind::Number, First),
    spec(Field::JobName, "jobname", ValueKind::Text, First),
    spec(Field::User, "user", ValueKind::Text, First),
    spec(Field::Account, "account", ValueKind::Text, First),
    spec(Field::Start, "start", ValueKind::Timestamp, First),
    spec(Field::End, "end", ValueKind::Timestamp, First),
    spec(Field::Elapsed, "elapsed", ValueKind::Duration, Max(compare_durations)),
    spec(Field::Submit, "submit", ValueKind::Timestamp, First),
    spec(Field::Planned, "planned", ValueKind::Duration, Max(compare_durations)),
    spec(Field::UsedSu, "used_su", ValueKind::Computed, Computed),
    spec(Field::RequiredSu, "required_su", ValueKind::Computed, Computed),
    spec(Field::TimeEfficiency, "timeeff", ValueKind::Computed, Computed),
    spec(Field::CpuEfficiency, "cpueff", ValueKind::Computed, Computed),
    spec(Field::MemoryEfficiency, "memeff", ValueKind::Computed, Computed),
    spec(Field::Partition, "partition", ValueKind::Text, First),
    spec(Field::State, "state", ValueKind::Text, First),
    spec(Field::Reason, "reason", ValueKind::Text, First),
    spec(Field::TimeLimit, "timelimit", ValueKind::Duration, Max(compare_durations)),
    spec(Field::RequestedMemory, "reqmem", ValueKind::ByteSize, First),
    spec(Field::AllocCpus, "alloccpus", ValueKind::Number, First),
    spec(Field::TotalCpu, "totalcpu", ValueKind::Duration, Max(compare_durations)),
    spec(Field::WorkDir, "workdir", ValueKind::Text, First),
    spec(Field::SessionId, "sessionid", ValueKind::Computed, Computed),
    spec(Field::RequeueCount, "requeue_count", ValueKind::Computed, Computed),
    spec(Field::MaxRss, "maxrss", ValueKind::ByteSize, Max(compare_byte_sizes)),
    spec(Field::MaxDiskWrite, "maxdiskwrite", ValueKind::ByteSize, Max(compare_byte_sizes)),
    spec(Field::MaxDiskRead, "maxdiskread", ValueKind::ByteSize, Max(compare_byte_sizes)),
    spec(Field::NodeList, "nodelist", ValueKind::Text, First),
    spec(Field::RequestedTres, "reqtres", ValueKind::Text, First),
    spec(Field::Timestamp, "timestamp", ValueKind::Computed, Computed),
];

/// Column order of the accounting query.
///
/// Must stay in lockstep with the `-o` argument passed to `sacct`: the parser
/// maps output columns to fields purely by position.
pub const SACCT_COLUMNS: [Field; COLUMN_COUNT] = [
    Field::JobId,
    Field::JobName,
    Field::User,
    Field::Account,
    Field::Start,
    Field::End,
    Field::Elapsed,
    Field::Submit,
    Field::Planned,
    Field::Partition,
    Field::State,
    Field::Reason,
    Field::TimeLimit,
    Field::RequestedMemory,
    Field::AllocCpus,
    Field::TotalCpu,
    Field::WorkDir,
    Field::MaxRss,
    Field::MaxDiskWrite,
    Field::MaxDiskRead,
    Field::NodeList,
    Field::RequestedTres,
];

impl Field {
    /// Schema entry for this field
    pub fn spec(self) -> &'static FieldSpec {
        &SCHEMA[self as usize]
    }

    /// Wire name of this field
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Look up a field by its wire name
    pub fn from_name(name: &str) -> Option<Field> {
        SCHEMA.iter().find(|s| s.name == name).map(|s| s.field)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Comma-joined column names, suitable for `sacct -o`
pub fn format_columns(columns: &[Field]) -> String {
    columns
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>()
        .join(",")
}

/// Orders duration strings by their length in seconds
pub fn compare_durations(a: &str, b: &str) -> Ordering {
    duration_to_seconds(a).cmp(&duration_to_seconds(b))
}

/// Orders byte-size strings by their size in bytes
pub fn compare_byte_sizes(a: &str, b: &str) -> Ordering {
    byte_size_to_bytes(a).total_cmp(&byte_size_to_bytes(b))
}

/// Raw string value for every schema field, indexed by [`Field`]
///
/// Starts with every field set to the empty placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValues {
    values: [String; FIELD_COUNT],
}

impl FieldValues {
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|_| String::new()),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        &self.values[field as usize]
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values[field as usize] = value.into();
    }
}

impl Default for FieldValues {
    fn default() -> Self {
        Self::new()
    }
}
