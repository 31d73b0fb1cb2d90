//! External command execution
//!
//! Every scheduler tool is run through a [`CommandRunner`], which captures
//! stdout/stderr and the exit status. The system implementation shells out
//! with `std::process::Command`; tests substitute a scripted runner.

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::error::{Result, SlurmError};

/// Captured result of one command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout of a successful run, or an [`SlurmError::Exit`] naming `program`
    pub fn into_stdout(self, program: &str) -> Result<String> {
        if self.success() {
            Ok(self.stdout)
        } else {
            Err(SlurmError::Exit {
                command: program.to_string(),
                exit_code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Runs an external program to completion
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, without a shell
    ///
    /// Only failing to start the program is an error here; a non-zero exit is
    /// reported through [`CommandOutput::exit_code`].
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for Box<R> {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        (**self).run(program, args)
    }
}

/// Runs commands on the local system
///
/// When `bin_dir` is set, programs are resolved inside it instead of through
/// `PATH`, which is how tests and staging hosts point at stand-in binaries.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner {
    bin_dir: Option<PathBuf>,
}

impl SystemCommandRunner {
    pub fn new(bin_dir: Option<PathBuf>) -> Self {
        Self { bin_dir }
    }

    fn resolve(&self, program: &str) -> PathBuf {
        match &self.bin_dir {
            Some(dir) => dir.join(program),
            None => PathBuf::from(program),
        }
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let path = self.resolve(program);
        debug!("Executing {} {}", path.display(), args.join(" "));

        let output = Command::new(&path)
            .args(args)
            .output()
            .map_err(|source| SlurmError::Spawn {
                command: program.to_string(),
                source,
            })?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };

        debug!(
            "{} finished with {:?} ({} bytes of output)",
            program,
            result.exit_code,
            result.stdout.len()
        );

        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted runner for adapter tests

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays canned outputs per program and records every invocation
    #[derive(Default)]
    pub struct ScriptedRunner {
        responses: Mutex<Vec<(String, VecDeque<Result<CommandOutput>>)>>,
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a successful run of `program` printing `stdout`
        pub fn ok(self, program: &str, stdout: &str) -> Self {
            self.push(
                program,
                Ok(CommandOutput {
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                    exit_code: Some(0),
                }),
            )
        }

        /// Queue a failing run of `program`
        pub fn fail(self, program: &str, exit_code: i32, stderr: &str) -> Self {
            self.push(
                program,
                Ok(CommandOutput {
                    stdout: String::new(),
                    stderr: stderr.to_string(),
                    exit_code: Some(exit_code),
                }),
            )
        }

        fn push(self, program: &str, response: Result<CommandOutput>) -> Self {
            {
                let mut responses = self.responses.lock().unwrap();
                match responses.iter_mut().find(|(p, _)| p == program) {
                    Some((_, queue)) => queue.push_back(response),
                    None => responses.push((program.to_string(), VecDeque::from([response]))),
                }
            }
            self
        }

        pub fn calls(&self) -> Vec<(String, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }

        pub fn calls_to(&self, program: &str) -> Vec<Vec<String>> {
            self.calls()
                .into_iter()
                .filter(|(p, _)| p == program)
                .map(|(_, args)| args)
                .collect()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
            self.calls
                .lock()
                .unwrap()
                .push((program.to_string(), args.to_vec()));

            let mut responses = self.responses.lock().unwrap();
            let queue = responses
                .iter_mut()
                .find(|(p, _)| p == program)
                .map(|(_, q)| q);

            match queue.and_then(|q| q.pop_front()) {
                Some(response) => response,
                None => Err(SlurmError::Spawn {
                    command: program.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not scripted"),
                }),
            }
        }
    }
}
