//! Error types for the aggregation engine

use thiserror::Error;

/// Result type alias for aggregation operations
pub type Result<T> = std::result::Result<T, AccountingError>;

/// Errors that abort an aggregation call
#[derive(Debug, Error)]
pub enum AccountingError {
    /// The accounting query could not be run
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A raw line did not fit the column contract
    #[error("Malformed accounting line {line}: {source}")]
    MalformedLine {
        /// 1-based line number within the captured output
        line: usize,
        #[source]
        source: ParseError,
    },
}

/// Failure reported by an accounting source
#[derive(Debug, Error)]
pub enum SourceError {
    /// External command failed to start or exited unsuccessfully
    #[error("Command `{command}` failed: {detail}")]
    CommandFailed { command: String, detail: String },

    /// Command output could not be interpreted
    #[error("Unexpected output from `{command}`: {detail}")]
    UnexpectedOutput { command: String, detail: String },
}

impl SourceError {
    pub fn command_failed(command: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            detail: detail.into(),
        }
    }
}

/// Failure to split one raw line into fields
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },
}

/// A job identifier that is not `<number>` or `<number>_<number>`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid job id: {0:?}")]
pub struct InvalidJobId(pub String);
