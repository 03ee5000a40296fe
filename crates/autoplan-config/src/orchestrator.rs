//! Configuration for the pipeline orchestrator (C8) and execution loop (C9).

use serde::{Deserialize, Serialize};

/// How autonomously the execution loop drives itself forward
/// (`--autonomy-mode {checkpoint,batch,fully_autonomous}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AutonomyMode {
    /// Stop and wait for a human after every feature.
    Checkpoint,
    /// Continue automatically unless the tracker or agent reports a hard failure.
    #[default]
    Batch,
    /// Continue regardless, up to `max_iterations`.
    FullyAutonomous,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub enable_context_generation: bool,
    pub validate_full: bool,
    pub validate_category: bool,
    pub force_all: bool,
    pub max_files: usize,
    pub output_dir: String,
    pub pre_classify: bool,
    pub autonomy_mode: AutonomyMode,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            enable_context_generation: true,
            validate_full: false,
            validate_category: false,
            force_all: false,
            max_files: 500,
            output_dir: "plans".to_string(),
            pre_classify: true,
            autonomy_mode: AutonomyMode::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub agent_binary: String,
    pub agent_timeout_secs: u64,
    pub tracker_binary: String,
    pub tracker_timeout_secs: u64,
    pub max_iterations: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            agent_binary: "claude".to_string(),
            agent_timeout_secs: 1800,
            tracker_binary: "bd".to_string(),
            tracker_timeout_secs: 30,
            max_iterations: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orchestrator_defaults_match_spec() {
        let cfg = OrchestratorConfig::default();
        assert!(cfg.enable_context_generation);
        assert!(!cfg.validate_full);
        assert!(!cfg.force_all);
        assert_eq!(cfg.autonomy_mode, AutonomyMode::Batch);
    }

    #[test]
    fn runner_defaults_are_reasonable() {
        let cfg = RunnerConfig::default();
        assert_eq!(cfg.agent_binary, "claude");
        assert!(cfg.agent_timeout_secs > 0);
    }
}
