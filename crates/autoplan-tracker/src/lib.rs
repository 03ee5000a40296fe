//! Feature/issue tracker adapter (C10): a synchronous wrapper around an
//! external tracker CLI.
//!
//! `NotInstalled` is a distinguished outcome, not an error path callers need
//! to branch on defensively — [`TrackerAdapter::is_available`] lets the
//! execution loop (C9) check once up front and degrade gracefully.

use std::sync::Arc;
use std::time::Duration;

use autoplan_model::{FeatureInfo, FeatureStatus, PlanInfo};
use autoplan_utils::error::{SubprocessError, TrackerError};
use autoplan_utils::runner::{CommandSpec, ProcessOutput, ProcessRunner};
use camino::Utf8Path;
use serde::de::DeserializeOwned;

/// Default per-call timeout, within the 30-60s range tracker calls are
/// expected to complete in.
pub const DEFAULT_TRACKER_TIMEOUT: Duration = Duration::from_secs(30);

fn status_arg(status: FeatureStatus) -> &'static str {
    match status {
        FeatureStatus::NotStarted => "NOT_STARTED",
        FeatureStatus::InProgress => "IN_PROGRESS",
        FeatureStatus::Completed => "COMPLETED",
        FeatureStatus::Failed => "FAILED",
        FeatureStatus::Blocked => "BLOCKED",
        FeatureStatus::Skipped => "SKIPPED",
    }
}

/// Wraps an external tracker CLI (default `bd`) behind the uniform
/// interface describes.
#[derive(Clone)]
pub struct TrackerAdapter {
    binary: String,
    runner: Arc<dyn ProcessRunner>,
    timeout: Duration,
}

impl TrackerAdapter {
    #[must_use]
    pub fn new(binary: impl Into<String>, runner: Arc<dyn ProcessRunner>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            runner,
            timeout,
        }
    }

    /// Whether the tracker binary can be found on `PATH`. Callers should
    /// check this once and skip tracker integration entirely if `false`,
    /// rather than treating every subsequent call as a hard failure.
    #[must_use]
    pub fn is_available(&self) -> bool {
        which::which(&self.binary).is_ok()
    }

    pub fn discover_plans(&self, project_path: &Utf8Path) -> Result<Vec<PlanInfo>, TrackerError> {
        #[derive(serde::Deserialize)]
        struct Response {
            plans: Vec<PlanInfo>,
        }
        let response: Response = self.run_json(project_path, &["plans", "--json"])?;
        Ok(response.plans)
    }

    pub fn get_next_feature(&self, project_path: &Utf8Path) -> Result<Option<FeatureInfo>, TrackerError> {
        self.run_json_optional(project_path, &["next", "--json"])
    }

    pub fn get_current_feature(&self, project_path: &Utf8Path) -> Result<Option<FeatureInfo>, TrackerError> {
        self.run_json_optional(project_path, &["current", "--json"])
    }

    pub fn get_all_features(&self, project_path: &Utf8Path) -> Result<Vec<FeatureInfo>, TrackerError> {
        #[derive(serde::Deserialize)]
        struct Response {
            features: Vec<FeatureInfo>,
        }
        let response: Response = self.run_json(project_path, &["features", "--json"])?;
        Ok(response.features)
    }

    pub fn update_feature_status(
        &self,
        project_path: &Utf8Path,
        name: &str,
        status: FeatureStatus,
    ) -> Result<(), TrackerError> {
        self.run(project_path, &["update", name, "--status", status_arg(status)])?;
        Ok(())
    }

    pub fn sync(&self, project_path: &Utf8Path) -> Result<(), TrackerError> {
        self.run(project_path, &["sync"])?;
        Ok(())
    }

    fn run(&self, project_path: &Utf8Path, args: &[&str]) -> Result<ProcessOutput, TrackerError> {
        if !self.is_available() {
            return Err(TrackerError::NotAvailable);
        }

        let cmd = CommandSpec::new(self.binary.as_str())
            .args(args.iter().copied())
            .current_dir(project_path.as_str());

        let output = self
            .runner
            .run(&cmd, self.timeout)
            .map_err(TrackerError::Subprocess)?;

        if !output.success() {
            return Err(TrackerError::Subprocess(SubprocessError::NonZeroExit {
                program: self.binary.clone(),
                code: output.exit_code.unwrap_or(-1),
            }));
        }
        Ok(output)
    }

    fn run_json<T: DeserializeOwned>(&self, project_path: &Utf8Path, args: &[&str]) -> Result<T, TrackerError> {
        let output = self.run(project_path, args)?;
        serde_json::from_str(&output.stdout_string()).map_err(|e| TrackerError::ParseFailed {
            reason: e.to_string(),
        })
    }

    /// Like `run_json`, but an empty stdout (e.g. "no next feature") parses
    /// as `Ok(None)` rather than a parse failure.
    fn run_json_optional<T: DeserializeOwned>(
        &self,
        project_path: &Utf8Path,
        args: &[&str],
    ) -> Result<Option<T>, TrackerError> {
        let output = self.run(project_path, args)?;
        let text = output.stdout_string();
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(None);
        }
        serde_json::from_str(trimmed)
            .map(Some)
            .map_err(|e| TrackerError::ParseFailed { reason: e.to_string() })
    }
}
