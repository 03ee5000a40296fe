//! Subprocess execution abstraction used by the execution loop (C9) to
//! invoke the code-generation agent, and by the tracker adapter (C10) to
//! invoke the tracker binary.
//!
//! All execution goes through [`CommandSpec`] / argv-style `Command::new`,
//! never through a shell string, so arguments can never be reinterpreted.

mod native;

pub use native::NativeRunner;

use std::ffi::OsString;
use std::process::Command;
use std::time::Duration;

use crate::error::SubprocessError;

/// An argv-style command to run, built incrementally with [`CommandSpec::arg`].
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub current_dir: Option<OsString>,
}

impl CommandSpec {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<OsString>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<OsString>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
    }
}

/// The captured result of running a [`CommandSpec`].
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<i32>,
    pub killed_by_timeout: bool,
}

impl ProcessOutput {
    #[must_use]
    pub fn new(stdout: Vec<u8>, stderr: Vec<u8>, exit_code: Option<i32>, killed_by_timeout: bool) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
            killed_by_timeout,
        }
    }

    #[must_use]
    pub fn success(&self) -> bool {
        !self.killed_by_timeout && self.exit_code == Some(0)
    }

    #[must_use]
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    #[must_use]
    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Last `n` lines of stderr, for compact error reporting.
    #[must_use]
    pub fn stderr_tail(&self, n: usize) -> String {
        let text = self.stderr_string();
        let lines: Vec<&str> = text.lines().collect();
        let start = lines.len().saturating_sub(n);
        lines[start..].join("\n")
    }
}

/// Abstraction over process execution so the runner/tracker can be tested
/// without spawning real subprocesses.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, cmd: &CommandSpec, timeout: Duration) -> Result<ProcessOutput, SubprocessError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_spec_builds_args_in_order() {
        let cmd = CommandSpec::new("echo").arg("a").arg("b");
        assert_eq!(cmd.args.len(), 2);
        assert_eq!(cmd.program_name(), "echo");
    }

    #[test]
    fn process_output_success_requires_zero_exit_and_no_timeout() {
        let ok = ProcessOutput::new(vec![], vec![], Some(0), false);
        assert!(ok.success());

        let timed_out = ProcessOutput::new(vec![], vec![], Some(0), true);
        assert!(!timed_out.success());

        let failed = ProcessOutput::new(vec![], vec![], Some(1), false);
        assert!(!failed.success());
    }

    #[test]
    fn stderr_tail_returns_last_n_lines() {
        let output = ProcessOutput::new(vec![], b"one\ntwo\nthree\n".to_vec(), Some(1), false);
        assert_eq!(output.stderr_tail(2), "two\nthree");
    }
}
