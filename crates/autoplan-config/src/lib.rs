//! Configuration discovery and validated settings for `autoplan`.
//!
//! Precedence: CLI flags > environment variables > `.autoplan/config.toml` >
//! built-in defaults.

pub mod discovery;
pub mod llm;
pub mod orchestrator;
pub mod threshold;

pub use discovery::{Config, ConfigSource};
pub use llm::{LlmBackendKind, LlmConfig};
pub use orchestrator::{AutonomyMode, OrchestratorConfig, RunnerConfig};
pub use threshold::ThresholdConfig;
