//! TOML configuration discovery: walk upward from the current directory for
//! `.autoplan/config.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::llm::LlmConfig;
use crate::orchestrator::{OrchestratorConfig, RunnerConfig};
use crate::threshold::ThresholdConfig;

const CONFIG_DIR_NAME: &str = ".autoplan";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Where a given configuration value ultimately came from. Kept for parity
/// with `autoplan status`'s debug output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    EnvVar,
    ConfigFile(PathBuf),
    Defaults,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct TomlConfig {
    classifier: Option<TomlThresholds>,
    llm: Option<LlmConfig>,
    orchestrator: Option<OrchestratorConfig>,
    runner: Option<RunnerConfig>,
}

#[derive(Debug, Deserialize, Serialize)]
struct TomlThresholds {
    keyword_confidence: Option<f64>,
    embedding_initial: Option<f64>,
    embedding_min: Option<f64>,
    llm_auto_route: Option<f64>,
    llm_human_review: Option<f64>,
}

/// Fully resolved configuration for one `autoplan` invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub thresholds: ThresholdConfig,
    pub llm: LlmConfig,
    pub orchestrator: OrchestratorConfig,
    pub runner: RunnerConfig,
    pub config_file: Option<PathBuf>,
}

impl Config {
    /// Discover configuration starting from the current working directory.
    pub fn discover() -> Result<Self> {
        let start_dir = std::env::current_dir().context("failed to get current directory")?;
        Self::discover_from(&start_dir, None)
    }

    /// Discover configuration starting from `start_dir`, optionally with an
    /// explicit config file path overriding discovery. Path-driven so tests
    /// avoid touching process-global CWD state.
    pub fn discover_from(start_dir: &Path, explicit_path: Option<&Path>) -> Result<Self> {
        let mut llm = LlmConfig::default();
        let mut orchestrator = OrchestratorConfig::default();
        let mut runner = RunnerConfig::default();
        let mut thresholds = ThresholdConfig::default();

        let config_path = match explicit_path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::discover_config_file_from(start_dir)?,
        };

        if let Some(path) = &config_path {
            let toml_config = Self::load_config_file(path)
                .with_context(|| format!("failed to load config file: {}", path.display()))?;

            if let Some(t) = toml_config.classifier {
                if let Some(v) = t.keyword_confidence {
                    thresholds.keyword_confidence = v;
                }
                if let Some(v) = t.embedding_initial {
                    thresholds.embedding_initial = v;
                }
                if let Some(v) = t.embedding_min {
                    thresholds.embedding_min = v;
                }
                if let Some(v) = t.llm_auto_route {
                    thresholds.llm_auto_route = v;
                }
                if let Some(v) = t.llm_human_review {
                    thresholds.llm_human_review = v;
                }
            }
            if let Some(v) = toml_config.llm {
                llm = v;
            }
            if let Some(v) = toml_config.orchestrator {
                orchestrator = v;
            }
            if let Some(v) = toml_config.runner {
                runner = v;
            }
        }

        // PRECLASSIFY_* environment variables take precedence over the file.
        let thresholds = ThresholdConfig::from_env(thresholds)
            .map_err(|e| anyhow::anyhow!(e.display_for_user()))
            .context("invalid threshold configuration")?;

        Ok(Self {
            thresholds,
            llm,
            orchestrator,
            runner,
            config_file: config_path,
        })
    }

    /// Walk upward from `start_dir` looking for `.autoplan/config.toml`,
    /// stopping at a VCS root if no config is found first.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current_dir = start_dir.to_path_buf();

        loop {
            let candidate = current_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Ok(Some(candidate));
            }

            if current_dir.parent().is_none() {
                break;
            }

            if current_dir.join(".git").exists() {
                break;
            }

            current_dir = current_dir.parent().unwrap().to_path_buf();
        }

        Ok(None)
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse TOML in: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn discovers_no_config_file_in_isolated_tempdir() {
        let dir = tempdir().unwrap();
        let found = Config::discover_config_file_from(dir.path()).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn discovers_config_file_when_present() {
        let dir = tempdir().unwrap();
        let config_dir = dir.path().join(".autoplan");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("config.toml"), "[llm]\nbackend = \"haiku\"\n").unwrap();

        let found = Config::discover_config_file_from(dir.path()).unwrap();
        assert_eq!(found, Some(config_dir.join("config.toml")));
    }

    #[test]
    fn stops_at_git_root_without_finding_config() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let found = Config::discover_config_file_from(&nested).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn discover_from_applies_file_then_defaults() {
        let dir = tempdir().unwrap();
        let config_dir = dir.path().join(".autoplan");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join("config.toml"),
            "[orchestrator]\nmax_files = 10\n",
        )
        .unwrap();

        let config = Config::discover_from(dir.path(), None).unwrap();
        assert_eq!(config.orchestrator.max_files, 10);
        assert_eq!(config.llm.backend, crate::llm::LlmBackendKind::Haiku);
    }
}
