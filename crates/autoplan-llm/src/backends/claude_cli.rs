//! Subprocess-based fallback backend.
//!
//! Issues the same prompt to the `claude` CLI and parses the JSON substring
//! bounded by the first `{` and last `}`, for use when the structured HTTP
//! path is unavailable.

use async_trait::async_trait;
use autoplan_utils::error::{LlmError, SubprocessError};
use autoplan_utils::runner::{CommandSpec, ProcessRunner};
use std::sync::Arc;

use crate::types::{LlmBackend, LlmInvocation, LlmResult, Role};

pub struct ClaudeCliBackend {
    binary: String,
    runner: Arc<dyn ProcessRunner>,
}

impl ClaudeCliBackend {
    #[must_use]
    pub fn new(binary: impl Into<String>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            binary: binary.into(),
            runner,
        }
    }

    /// Discover the `claude` binary on `PATH`.
    ///
    /// # Errors
    /// Returns `LlmError::Misconfiguration` if it cannot be found.
    pub fn discover_binary() -> Result<String, LlmError> {
        which::which("claude")
            .map(|p| p.to_string_lossy().into_owned())
            .map_err(|e| LlmError::Misconfiguration {
                backend: "claude-cli".to_string(),
                reason: format!("'claude' not found on PATH: {e}"),
            })
    }

    fn messages_to_prompt(inv: &LlmInvocation) -> String {
        let mut prompt = String::new();
        for msg in &inv.messages {
            let prefix = match msg.role {
                Role::System => "System: ",
                Role::User => "User: ",
                Role::Assistant => "Assistant: ",
            };
            prompt.push_str(prefix);
            prompt.push_str(&msg.content);
            prompt.push_str("\n\n");
        }
        prompt.push_str(
            "Return only a single JSON object matching the schema above. \
             No prose, no markdown code fences.",
        );
        prompt
    }
}

#[async_trait]
impl LlmBackend for ClaudeCliBackend {
    fn name(&self) -> &str {
        "claude-cli"
    }

    async fn invoke(&self, inv: &LlmInvocation) -> Result<LlmResult, LlmError> {
        let prompt = Self::messages_to_prompt(inv);
        let cmd = CommandSpec::new(self.binary.clone())
            .arg("--print")
            .arg("--output-format")
            .arg("text")
            .arg(prompt);

        let runner = self.runner.clone();
        let timeout = inv.timeout;
        let output = tokio::task::spawn_blocking(move || runner.run(&cmd, timeout))
            .await
            .map_err(|e| LlmError::Transport {
                backend: "claude-cli".to_string(),
                reason: format!("subprocess task panicked: {e}"),
            })?
            .map_err(subprocess_to_llm_error)?;

        if output.killed_by_timeout {
            return Err(LlmError::Timeout {
                backend: "claude-cli".to_string(),
                timeout_seconds: inv.timeout.as_secs(),
            });
        }

        if !output.success() {
            return Err(LlmError::Transport {
                backend: "claude-cli".to_string(),
                reason: format!(
                    "exit code {:?}: {}",
                    output.exit_code,
                    output.stderr_tail(20)
                ),
            });
        }

        let model = if inv.model.is_empty() {
            "claude-cli".to_string()
        } else {
            inv.model.clone()
        };
        Ok(LlmResult::new(output.stdout_string(), "claude-cli", model))
    }
}

fn subprocess_to_llm_error(e: SubprocessError) -> LlmError {
    match e {
        SubprocessError::Timeout { program, timeout_seconds } => LlmError::Timeout {
            backend: program,
            timeout_seconds,
        },
        SubprocessError::NotInstalled { program } => LlmError::Misconfiguration {
            backend: program,
            reason: "binary not installed".to_string(),
        },
        other => LlmError::Transport {
            backend: "claude-cli".to_string(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use autoplan_utils::runner::ProcessOutput;
    use std::time::Duration;

    struct StubRunner {
        stdout: &'static str,
    }

    impl ProcessRunner for StubRunner {
        fn run(&self, _cmd: &CommandSpec, _timeout: Duration) -> Result<ProcessOutput, SubprocessError> {
            Ok(ProcessOutput::new(
                self.stdout.as_bytes().to_vec(),
                vec![],
                Some(0),
                false,
            ))
        }
    }

    #[test]
    fn messages_to_prompt_includes_role_prefixes_and_json_instruction() {
        let inv = LlmInvocation::new(
            "schema",
            "claude-cli",
            Duration::from_secs(5),
            vec![Message::system("be terse"), Message::user("hello")],
        );
        let prompt = ClaudeCliBackend::messages_to_prompt(&inv);
        assert!(prompt.contains("System: be terse"));
        assert!(prompt.contains("User: hello"));
        assert!(prompt.contains("JSON object"));
    }

    #[tokio::test]
    async fn invoke_returns_stdout_as_raw_response() {
        let backend = ClaudeCliBackend::new("claude", Arc::new(StubRunner { stdout: "{\"ok\":true}" }));
        let inv = LlmInvocation::new(
            "schema",
            "",
            Duration::from_secs(5),
            vec![Message::user("hi")],
        );
        let result = backend.invoke(&inv).await.unwrap();
        assert_eq!(result.raw_response, "{\"ok\":true}");
        assert_eq!(result.provider, "claude-cli");
    }
}
