use crate::error::SubprocessError;
use std::process::Stdio;
use std::time::Duration;

use super::{CommandSpec, ProcessOutput, ProcessRunner};

/// Native process runner using `std::process::Command`.
///
/// Uses argv-style APIs only (`Command::new().args()`), never a shell, so
/// shell metacharacters in arguments are never interpreted. Timeout
/// handling runs on a helper thread so the public interface stays
/// synchronous; callers that need async wrap this in `spawn_blocking`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRunner;

impl NativeRunner {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ProcessRunner for NativeRunner {
    fn run(&self, cmd: &CommandSpec, timeout: Duration) -> Result<ProcessOutput, SubprocessError> {
        use std::sync::mpsc;
        use std::thread;

        let mut command = cmd.to_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = command.spawn().map_err(|e| SubprocessError::SpawnFailed {
            program: cmd.program_name(),
            reason: e.to_string(),
        })?;

        let (tx, rx) = mpsc::channel();
        let child_id = child.id();

        let handle = thread::spawn(move || {
            let output = child.wait_with_output();
            let _ = tx.send(output);
        });

        match rx.recv_timeout(timeout) {
            Ok(output_result) => {
                let _ = handle.join();
                let output = output_result.map_err(|e| SubprocessError::SpawnFailed {
                    program: cmd.program_name(),
                    reason: format!("failed to wait for process: {e}"),
                })?;

                Ok(ProcessOutput::new(
                    output.stdout,
                    output.stderr,
                    output.status.code(),
                    false,
                ))
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                Self::terminate_process(child_id);
                let _ = handle.join();
                Err(SubprocessError::Timeout {
                    program: cmd.program_name(),
                    timeout_seconds: timeout.as_secs(),
                })
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(SubprocessError::MonitorDisconnected {
                program: cmd.program_name(),
            }),
        }
    }
}

impl NativeRunner {
    /// Terminate a process by PID: `SIGKILL` on Unix, `TerminateProcess` on Windows.
    fn terminate_process(pid: u32) {
        #[cfg(unix)]
        {
            unsafe {
                libc::kill(pid as i32, libc::SIGKILL);
            }
        }

        #[cfg(windows)]
        {
            use winapi::um::handleapi::CloseHandle;
            use winapi::um::processthreadsapi::{OpenProcess, TerminateProcess};
            use winapi::um::winnt::PROCESS_TERMINATE;

            unsafe {
                let handle = OpenProcess(PROCESS_TERMINATE, 0, pid);
                if !handle.is_null() {
                    TerminateProcess(handle, 1);
                    CloseHandle(handle);
                }
            }
        }

        #[cfg(not(any(unix, windows)))]
        {
            let _ = pid;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized() {
        let runner = NativeRunner::new();
        assert_eq!(std::mem::size_of_val(&runner), 0);
    }

    #[test]
    fn runs_echo_and_captures_stdout() {
        let runner = NativeRunner::new();

        #[cfg(not(windows))]
        let cmd = CommandSpec::new("echo").arg("hello world");
        #[cfg(windows)]
        let cmd = CommandSpec::new("cmd").arg("/C").arg("echo").arg("hello world");

        let output = runner.run(&cmd, Duration::from_secs(10)).unwrap();
        assert!(output.success());
        assert!(output.stdout_string().contains("hello world"));
    }

    #[test]
    fn nonexistent_command_spawns_to_error() {
        let runner = NativeRunner::new();
        let cmd = CommandSpec::new("this_command_definitely_does_not_exist_12345");
        let result = runner.run(&cmd, Duration::from_secs(5));
        assert!(matches!(result, Err(SubprocessError::SpawnFailed { .. })));
    }

    #[test]
    fn nonzero_exit_code_is_propagated_without_erroring() {
        let runner = NativeRunner::new();

        #[cfg(not(windows))]
        let cmd = CommandSpec::new("sh").arg("-c").arg("exit 42");
        #[cfg(windows)]
        let cmd = CommandSpec::new("cmd").arg("/C").arg("exit").arg("42");

        let output = runner.run(&cmd, Duration::from_secs(10)).unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code, Some(42));
    }

    #[test]
    fn slow_command_times_out() {
        let runner = NativeRunner::new();

        #[cfg(not(windows))]
        let cmd = CommandSpec::new("sleep").arg("5");
        #[cfg(windows)]
        let cmd = CommandSpec::new("cmd").arg("/C").arg("timeout").arg("5");

        let result = runner.run(&cmd, Duration::from_millis(100));
        assert!(matches!(result, Err(SubprocessError::Timeout { .. })));
    }
}
