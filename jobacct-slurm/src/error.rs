//! Error types for the Slurm adapter

use jobacct_core::SourceError;
use thiserror::Error;

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, SlurmError>;

/// Errors that can occur when talking to the scheduler
#[derive(Debug, Error)]
pub enum SlurmError {
    /// Command could not be started at all
    #[error("Failed to execute `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Command ran but reported failure
    #[error("`{command}` exited with {}: {stderr}", describe_exit(.exit_code))]
    Exit {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// Command output did not have the expected shape
    #[error("Unexpected output from `{command}`: {detail}")]
    Output { command: String, detail: String },

    /// Invalid adapter configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "signal".to_string(),
    }
}

impl SlurmError {
    /// Name of the command this error is about, if any
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::Spawn { command, .. } | Self::Exit { command, .. } | Self::Output { command, .. } => {
                Some(command)
            }
            Self::Config(_) => None,
        }
    }
}

impl From<SlurmError> for SourceError {
    fn from(err: SlurmError) -> Self {
        match err {
            SlurmError::Output { command, detail } => SourceError::UnexpectedOutput { command, detail },
            other => SourceError::CommandFailed {
                command: other.command().unwrap_or("slurm").to_string(),
                detail: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_error_message() {
        let err = SlurmError::Exit {
            command: "sacct".to_string(),
            exit_code: Some(1),
            stderr: "slurmdbd unreachable".to_string(),
        };
        assert_eq!(err.to_string(), "`sacct` exited with status 1: slurmdbd unreachable");

        let killed = SlurmError::Exit {
            command: "squeue".to_string(),
            exit_code: None,
            stderr: String::new(),
        };
        assert!(killed.to_string().contains("signal"));
    }

    #[test]
    fn test_into_source_error() {
        let err: SourceError = SlurmError::Output {
            command: "squeue".to_string(),
            detail: "short row".to_string(),
        }
        .into();
        assert!(matches!(err, SourceError::UnexpectedOutput { .. }));

        let err: SourceError = SlurmError::Exit {
            command: "sacct".to_string(),
            exit_code: Some(1),
            stderr: String::new(),
        }
        .into();
        match err {
            SourceError::CommandFailed { command, .. } => assert_eq!(command, "sacct"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
