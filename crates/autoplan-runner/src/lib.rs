//! Execution Loop Runner (C9): drives the external coding agent through
//! one phase at a time, optionally backed by a feature tracker.

mod prompt;
mod state;

pub use prompt::build_prompt;
pub use state::RunnerState;

use std::sync::Arc;
use std::time::{Duration, Instant};

use autoplan_config::RunnerConfig;
use autoplan_model::{FeatureStatus, PhaseResult};
use autoplan_tracker::TrackerAdapter;
use autoplan_utils::error::{AutoplanError, PipelineError, SubprocessError};
use autoplan_utils::runner::{CommandSpec, ProcessRunner};
use camino::Utf8PathBuf;

///: beyond this many consecutive `BLOCKED` features, the loop
/// gives up rather than spinning forever.
const MAX_BLOCKED_SKIP: u32 = 100;

/// Drives one plan (tracker-backed, or a single explicit plan file)
/// through the external coding agent, phase by phase.
pub struct ExecutionLoopRunner {
    agent_binary: String,
    agent_timeout: Duration,
    max_iterations: u32,
    process_runner: Arc<dyn ProcessRunner>,
    tracker: Option<TrackerAdapter>,
    project_path: Utf8PathBuf,
    plan_path: Option<Utf8PathBuf>,
    state: RunnerState,
    current_phase: Option<String>,
    last_result: Option<PhaseResult>,
}

impl ExecutionLoopRunner {
    #[must_use]
    pub fn new(
        config: &RunnerConfig,
        process_runner: Arc<dyn ProcessRunner>,
        project_path: Utf8PathBuf,
        tracker: Option<TrackerAdapter>,
    ) -> Self {
        Self {
            agent_binary: config.agent_binary.clone(),
            agent_timeout: Duration::from_secs(config.agent_timeout_secs),
            max_iterations: config.max_iterations,
            process_runner,
            tracker,
            project_path,
            plan_path: None,
            state: RunnerState::Idle,
            current_phase: None,
            last_result: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> RunnerState {
        self.state
    }

    #[must_use]
    pub fn current_phase(&self) -> Option<&str> {
        self.current_phase.as_deref()
    }

    #[must_use]
    pub fn last_result(&self) -> Option<&PhaseResult> {
        self.last_result.as_ref()
    }

    pub fn set_plan_path(&mut self, path: Utf8PathBuf) {
        self.plan_path = Some(path);
    }

    /// Allowed only from `RUNNING`; honored at the top of the next loop
    /// iteration, never mid-subprocess.
    pub fn pause(&mut self) -> Result<(), PipelineError> {
        self.transition(RunnerState::Running, RunnerState::Paused)
    }

    /// Allowed only from `PAUSED`. Restores `current_phase` from the
    /// tracker's `get_current_feature()` when one is `IN_PROGRESS`;
    /// otherwise the previously stored phase is reused.
    pub fn resume(&mut self) -> Result<(), PipelineError> {
        self.transition(RunnerState::Paused, RunnerState::Running)?;

        if let Some(tracker) = &self.tracker {
            if let Ok(Some(feature)) = tracker.get_current_feature(&self.project_path) {
                if feature.status == FeatureStatus::InProgress {
                    self.current_phase = Some(feature.phase);
                }
            }
        }
        Ok(())
    }

    fn transition(&mut self, from: RunnerState, to: RunnerState) -> Result<(), PipelineError> {
        if self.state != from {
            return Err(PipelineError::InvalidTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        self.state = to;
        Ok(())
    }

    /// Runs until the loop reaches `COMPLETED` or `FAILED`, or is paused.
    pub async fn run(&mut self) -> Result<(), AutoplanError> {
        self.state = RunnerState::Running;

        let Some(tracker) = self.tracker.clone() else {
            return self.run_single_plan().await;
        };

        if self.plan_path.is_none() {
            let plans = tracker.discover_plans(&self.project_path)?;
            let best = plans
                .into_iter()
                .max_by_key(|p| p.priority)
                .ok_or(PipelineError::NoPlansAvailable)?;
            self.plan_path = Some(Utf8PathBuf::from(best.path));
        }

        let mut iterations: u32 = 0;
        while self.state == RunnerState::Running {
            if iterations >= self.max_iterations {
                self.state = RunnerState::Failed;
                return Err(PipelineError::MaxIterationsReached {
                    max_iterations: self.max_iterations,
                }
                .into());
            }
            iterations += 1;

            let Some(feature) = self.next_unblocked_feature(&tracker)? else {
                self.state = RunnerState::Completed;
                break;
            };

            self.current_phase = Some(feature.phase.clone());
            self.set_status_best_effort(&tracker, &feature.name, FeatureStatus::InProgress);

            let plan_contents = self.read_plan_contents()?;
            let prompt = build_prompt(&plan_contents, &feature.phase);
            let result = self.invoke_agent(&prompt).await?;

            self.check_git_status_non_fatal().await;
            if let Err(e) = tracker.sync(&self.project_path) {
                tracing::warn!(error = %e, "tracker sync failed; continuing");
            }

            if result.success {
                self.set_status_best_effort(&tracker, &feature.name, FeatureStatus::Completed);
                self.last_result = Some(result);
            } else {
                self.set_status_best_effort(&tracker, &feature.name, FeatureStatus::Failed);
                self.last_result = Some(result);
                self.state = RunnerState::Failed;
            }
        }

        Ok(())
    }

    /// Backward-compatible single-plan mode: no tracker configured, so the
    /// loop executes exactly one phase against the explicitly set plan path.
    async fn run_single_plan(&mut self) -> Result<(), AutoplanError> {
        let plan_contents = self.read_plan_contents()?;
        let phase_identifier = self.current_phase.clone().unwrap_or_else(|| "single-plan".to_string());
        let prompt = build_prompt(&plan_contents, &phase_identifier);

        let result = self.invoke_agent(&prompt).await?;
        self.check_git_status_non_fatal().await;

        self.state = if result.success {
            RunnerState::Completed
        } else {
            RunnerState::Failed
        };
        self.last_result = Some(result);
        Ok(())
    }

    /// Repeatedly asks the tracker for the next feature, skipping `BLOCKED`
    /// ones, up to `MAX_BLOCKED_SKIP` times.
    fn next_unblocked_feature(
        &self,
        tracker: &TrackerAdapter,
    ) -> Result<Option<autoplan_model::FeatureInfo>, AutoplanError> {
        for _ in 0..MAX_BLOCKED_SKIP {
            match tracker.get_next_feature(&self.project_path)? {
                None => return Ok(None),
                Some(feature) if feature.status == FeatureStatus::Blocked => continue,
                Some(feature) => return Ok(Some(feature)),
            }
        }
        Err(PipelineError::TooManyBlocked { limit: MAX_BLOCKED_SKIP }.into())
    }

    fn read_plan_contents(&self) -> Result<String, PipelineError> {
        let path = self
            .plan_path
            .as_ref()
            .ok_or(PipelineError::NoPlansAvailable)?;

        if !path.exists() {
            return Err(PipelineError::FileNotFound {
                path: path.to_string(),
            });
        }
        std::fs::read_to_string(path).map_err(|e| PipelineError::FileNotFound {
            path: format!("{path}: {e}"),
        })
    }

    async fn invoke_agent(&self, prompt: &str) -> Result<PhaseResult, AutoplanError> {
        let cmd = CommandSpec::new(self.agent_binary.clone())
            .arg("--print")
            .arg("--permission-mode")
            .arg("bypassPermissions")
            .arg("-p")
            .arg(prompt);

        let runner = self.process_runner.clone();
        let timeout = self.agent_timeout;
        let program = self.agent_binary.clone();
        let start = Instant::now();

        let run_result = tokio::task::spawn_blocking(move || runner.run(&cmd, timeout))
            .await
            .map_err(|_| AutoplanError::Subprocess(SubprocessError::MonitorDisconnected { program }))?;

        let elapsed = start.elapsed();

        // A timed-out subprocess is a failed phase, not a pipeline error: the
        // loop still needs to record FAILED status against the tracker below.
        let output = match run_result {
            Ok(output) => output,
            Err(e @ SubprocessError::Timeout { .. }) => {
                return Ok(PhaseResult::failure(1, elapsed, format!("agent subprocess timed out: {e}")));
            }
            Err(e) => return Err(AutoplanError::Subprocess(e)),
        };

        if output.killed_by_timeout {
            return Ok(PhaseResult::failure(1, elapsed, "agent subprocess timed out"));
        }
        if !output.success() {
            return Ok(PhaseResult::failure(
                1,
                elapsed,
                format!("agent exited with {:?}: {}", output.exit_code, output.stderr_tail(20)),
            ));
        }
        Ok(PhaseResult::success(1, elapsed))
    }

    /// `git status --porcelain`, never fatal: a missing repo or missing
    /// `git` binary just means "no change detection this run".
    async fn check_git_status_non_fatal(&self) -> bool {
        let cmd = CommandSpec::new("git")
            .arg("-C")
            .arg(self.project_path.as_str())
            .arg("status")
            .arg("--porcelain");
        let runner = self.process_runner.clone();

        let result = tokio::task::spawn_blocking(move || runner.run(&cmd, Duration::from_secs(10))).await;
        match result {
            Ok(Ok(output)) if output.success() => !output.stdout_string().trim().is_empty(),
            Ok(Ok(_)) => false,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "git status check failed; continuing");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "git status check task panicked; continuing");
                false
            }
        }
    }

    fn set_status_best_effort(&self, tracker: &TrackerAdapter, name: &str, status: FeatureStatus) {
        if let Err(e) = tracker.update_feature_status(&self.project_path, name, status) {
            tracing::warn!(error = %e, feature = name, "tracker status update failed; continuing");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoplan_tracker::TrackerAdapter;
    use autoplan_utils::error::SubprocessError;
    use autoplan_utils::runner::ProcessOutput;
    use std::fs;
    use tempfile::TempDir;

    struct StubProcessRunner {
        agent_exit_code: i32,
    }

    impl ProcessRunner for StubProcessRunner {
        fn run(&self, cmd: &CommandSpec, _timeout: Duration) -> Result<ProcessOutput, SubprocessError> {
            if cmd.program_name() == "git" {
                return Ok(ProcessOutput::new(Vec::new(), Vec::new(), Some(0), false));
            }
            Ok(ProcessOutput::new(
                b"done".to_vec(),
                Vec::new(),
                Some(self.agent_exit_code),
                false,
            ))
        }
    }

    fn test_config() -> RunnerConfig {
        RunnerConfig {
            agent_binary: "fake-agent".to_string(),
            agent_timeout_secs: 30,
            ..RunnerConfig::default()
        }
    }

    fn write_plan(dir: &TempDir, contents: &str) -> Utf8PathBuf {
        let path = dir.path().join("00-overview.md");
        fs::write(&path, contents).unwrap();
        Utf8PathBuf::from_path_buf(path).unwrap()
    }

    #[tokio::test]
    async fn single_plan_mode_succeeds_and_completes() {
        let dir = TempDir::new().unwrap();
        let plan_path = write_plan(&dir, "do the thing");
        let project_path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        let runner: Arc<dyn ProcessRunner> = Arc::new(StubProcessRunner { agent_exit_code: 0 });
        let mut loop_runner = ExecutionLoopRunner::new(&test_config(), runner, project_path, None);
        loop_runner.set_plan_path(plan_path);

        loop_runner.run().await.unwrap();
        assert_eq!(loop_runner.state(), RunnerState::Completed);
        assert!(loop_runner.last_result().unwrap().success);
    }

    #[tokio::test]
    async fn single_plan_mode_failure_transitions_to_failed() {
        let dir = TempDir::new().unwrap();
        let plan_path = write_plan(&dir, "do the thing");
        let project_path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        let runner: Arc<dyn ProcessRunner> = Arc::new(StubProcessRunner { agent_exit_code: 1 });
        let mut loop_runner = ExecutionLoopRunner::new(&test_config(), runner, project_path, None);
        loop_runner.set_plan_path(plan_path);

        loop_runner.run().await.unwrap();
        assert_eq!(loop_runner.state(), RunnerState::Failed);
        assert!(!loop_runner.last_result().unwrap().success);
    }

    #[tokio::test]
    async fn agent_subprocess_timeout_fails_the_phase_instead_of_erroring() {
        use autoplan_utils::runner::NativeRunner;

        let dir = TempDir::new().unwrap();
        let plan_path = write_plan(&dir, "do the thing");
        let project_path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        let mut config = test_config();
        #[cfg(not(windows))]
        {
            config.agent_binary = "sleep".to_string();
        }
        #[cfg(windows)]
        {
            config.agent_binary = "cmd".to_string();
        }
        config.agent_timeout_secs = 0;

        let runner: Arc<dyn ProcessRunner> = Arc::new(NativeRunner::new());
        let mut loop_runner = ExecutionLoopRunner::new(&config, runner, project_path, None);
        loop_runner.set_plan_path(plan_path);

        loop_runner.run().await.unwrap();
        assert_eq!(loop_runner.state(), RunnerState::Failed);
        let result = loop_runner.last_result().unwrap();
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap_or_default().contains("timed out"));
    }

    #[tokio::test]
    async fn missing_plan_file_is_a_file_not_found_error() {
        let dir = TempDir::new().unwrap();
        let project_path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let runner: Arc<dyn ProcessRunner> = Arc::new(StubProcessRunner { agent_exit_code: 0 });
        let mut loop_runner = ExecutionLoopRunner::new(&test_config(), runner, project_path, None);
        loop_runner.set_plan_path(Utf8PathBuf::from("/nonexistent/plan.md"));

        let err = loop_runner.run().await.unwrap_err();
        assert!(matches!(
            err,
            AutoplanError::Pipeline(PipelineError::FileNotFound { .. })
        ));
    }

    #[test]
    fn pause_is_only_allowed_from_running() {
        let dir = TempDir::new().unwrap();
        let project_path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let runner: Arc<dyn ProcessRunner> = Arc::new(StubProcessRunner { agent_exit_code: 0 });
        let mut loop_runner = ExecutionLoopRunner::new(&test_config(), runner, project_path, None);

        assert!(loop_runner.pause().is_err());
    }

    #[test]
    fn resume_is_only_allowed_from_paused() {
        let dir = TempDir::new().unwrap();
        let project_path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let runner: Arc<dyn ProcessRunner> = Arc::new(StubProcessRunner { agent_exit_code: 0 });
        let mut loop_runner = ExecutionLoopRunner::new(&test_config(), runner, project_path, None);

        assert!(loop_runner.resume().is_err());
    }

    struct AlwaysAvailableRunner;
    impl ProcessRunner for AlwaysAvailableRunner {
        fn run(&self, _cmd: &CommandSpec, _timeout: Duration) -> Result<ProcessOutput, SubprocessError> {
            let body = r#"{"name": "never-ending", "phase": "01", "status": "NOT_STARTED", "priority": 1}"#;
            Ok(ProcessOutput::new(body.as_bytes().to_vec(), Vec::new(), Some(0), false))
        }
    }

    #[tokio::test]
    async fn a_tracker_that_never_reports_completion_is_bounded_by_max_iterations() {
        let dir = TempDir::new().unwrap();
        let project_path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        #[cfg(not(windows))]
        let tracker_binary = "true";
        #[cfg(windows)]
        let tracker_binary = "cmd";

        let tracker_runner: Arc<dyn ProcessRunner> = Arc::new(AlwaysAvailableRunner);
        let tracker = TrackerAdapter::new(tracker_binary, tracker_runner, Duration::from_secs(5));

        let mut config = test_config();
        config.max_iterations = 3;

        let agent_runner: Arc<dyn ProcessRunner> = Arc::new(StubProcessRunner { agent_exit_code: 0 });
        let mut loop_runner = ExecutionLoopRunner::new(&config, agent_runner, project_path, Some(tracker));
        loop_runner.set_plan_path(Utf8PathBuf::from("/unused/plan.md"));

        let err = loop_runner.run().await.unwrap_err();
        assert!(matches!(
            err,
            AutoplanError::Pipeline(PipelineError::MaxIterationsReached { max_iterations: 3 })
        ));
        assert_eq!(loop_runner.state(), RunnerState::Failed);
    }

    struct AlwaysBlockedRunner;
    impl ProcessRunner for AlwaysBlockedRunner {
        fn run(&self, _cmd: &CommandSpec, _timeout: Duration) -> Result<ProcessOutput, SubprocessError> {
            let body = r#"{"name": "blocked-feature", "phase": "01", "status": "BLOCKED", "priority": 1}"#;
            Ok(ProcessOutput::new(body.as_bytes().to_vec(), Vec::new(), Some(0), false))
        }
    }

    #[tokio::test]
    async fn exceeding_the_blocked_skip_limit_is_an_error() {
        let dir = TempDir::new().unwrap();
        let project_path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        #[cfg(not(windows))]
        let tracker_binary = "true";
        #[cfg(windows)]
        let tracker_binary = "cmd";

        let tracker_runner: Arc<dyn ProcessRunner> = Arc::new(AlwaysBlockedRunner);
        let tracker = TrackerAdapter::new(tracker_binary, tracker_runner, Duration::from_secs(5));

        let agent_runner: Arc<dyn ProcessRunner> = Arc::new(StubProcessRunner { agent_exit_code: 0 });
        let mut loop_runner =
            ExecutionLoopRunner::new(&test_config(), agent_runner, project_path, Some(tracker));
        loop_runner.set_plan_path(Utf8PathBuf::from("/unused/plan.md"));

        let err = loop_runner.run().await.unwrap_err();
        assert!(matches!(
            err,
            AutoplanError::Pipeline(PipelineError::TooManyBlocked { .. })
        ));
    }
}
