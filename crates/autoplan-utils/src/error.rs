//! Error taxonomy shared across the `autoplan` workspace.
//!
//! One top-level aggregate error plus a family of per-concern sub-errors,
//! each of which can render a human-readable message via
//! [`UserFriendlyError`] and map to a CLI exit code via
//! [`crate::exit_codes`].

use std::fmt;
use thiserror::Error;

/// Broad grouping used to route an error toward user-facing advice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Model,
    Llm,
    Validation,
    Subprocess,
    Tracker,
    Pipeline,
    Configuration,
    FileSystem,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Model => "data model",
            Self::Llm => "LLM integration",
            Self::Validation => "validation",
            Self::Subprocess => "subprocess execution",
            Self::Tracker => "issue tracker integration",
            Self::Pipeline => "pipeline orchestration",
            Self::Configuration => "configuration",
            Self::FileSystem => "file system",
        };
        f.write_str(s)
    }
}

/// Errors that can surface a message, context, and suggestions to a human.
pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn context(&self) -> Option<String> {
        None
    }
    fn suggestions(&self) -> Vec<String> {
        Vec::new()
    }
    fn category(&self) -> ErrorCategory;

    /// Render the full, multi-line, user-facing report.
    fn display_for_user(&self) -> String {
        let mut out = format!("error: {}", self.user_message());
        if let Some(ctx) = self.context() {
            out.push_str(&format!("\n\n{ctx}"));
        }
        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            out.push_str("\n\nSuggestions:");
            for s in suggestions {
                out.push_str(&format!("\n  - {s}"));
            }
        }
        out
    }
}

/// Errors constructing or mutating `autoplan-model` types (C1).
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("invalid requirement id '{value}': {reason}")]
    InvalidRequirementId { value: String, reason: String },

    #[error("requirement hierarchy exceeds maximum depth {max_depth} at node {node_id}")]
    DepthExceeded { node_id: String, max_depth: u32 },

    #[error("duplicate requirement id '{id}' in hierarchy")]
    DuplicateId { id: String },

    #[error("parent requirement '{parent_id}' not found for child '{child_id}'")]
    ParentNotFound { parent_id: String, child_id: String },

    #[error("workflow context is missing required field '{field}'")]
    MissingField { field: String },

    #[error("schema version '{found}' is not supported (expected '{expected}')")]
    UnsupportedSchemaVersion { found: String, expected: String },
}

impl UserFriendlyError for ModelError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidRequirementId { value, reason } => {
                format!("requirement id '{value}' is invalid: {reason}")
            }
            Self::DepthExceeded { node_id, max_depth } => {
                format!("requirement '{node_id}' would exceed the maximum decomposition depth ({max_depth})")
            }
            Self::DuplicateId { id } => format!("requirement id '{id}' is already present"),
            Self::ParentNotFound { parent_id, child_id } => {
                format!("cannot attach '{child_id}' to unknown parent '{parent_id}'")
            }
            Self::MissingField { field } => format!("workflow context is missing '{field}'"),
            Self::UnsupportedSchemaVersion { found, expected } => {
                format!("checkpoint schema '{found}' is not compatible with '{expected}'")
            }
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidRequirementId { .. } => vec![
                "requirement ids must match REQ_NNN with optional dot-separated suffixes (e.g. REQ_001.2)".to_string(),
            ],
            Self::DepthExceeded { .. } => {
                vec!["split the requirement into siblings instead of a deeper child".to_string()]
            }
            Self::UnsupportedSchemaVersion { .. } => {
                vec!["re-run decomposition to regenerate the checkpoint in the current schema".to_string()]
            }
            _ => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Model
    }
}

/// Errors from the structured LLM client (C2).
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM backend '{backend}' is not configured: {reason}")]
    Misconfiguration { backend: String, reason: String },

    #[error("LLM request to '{backend}' timed out after {timeout_seconds}s")]
    Timeout { backend: String, timeout_seconds: u64 },

    #[error("LLM backend '{backend}' transport error: {reason}")]
    Transport { backend: String, reason: String },

    #[error("LLM backend '{backend}' rejected the request (auth): {reason}")]
    ProviderAuth { backend: String, reason: String },

    #[error("LLM backend '{backend}' is rate limited or over quota")]
    ProviderQuota { backend: String },

    #[error("LLM response failed schema validation after {attempts} attempt(s): {reason}")]
    SchemaValidationFailed { attempts: u32, reason: String },

    #[error("no LLM backend in the fallback chain succeeded: {last_error}")]
    AllBackendsFailed { last_error: String },
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Misconfiguration { backend, reason } => {
                format!("backend '{backend}' is misconfigured: {reason}")
            }
            Self::Timeout { backend, timeout_seconds } => {
                format!("backend '{backend}' did not respond within {timeout_seconds}s")
            }
            Self::Transport { backend, reason } => {
                format!("could not reach backend '{backend}': {reason}")
            }
            Self::ProviderAuth { backend, .. } => {
                format!("backend '{backend}' rejected the credentials used")
            }
            Self::ProviderQuota { backend } => format!("backend '{backend}' is over quota"),
            Self::SchemaValidationFailed { attempts, .. } => {
                format!("the model did not return valid structured output after {attempts} attempt(s)")
            }
            Self::AllBackendsFailed { .. } => {
                "every configured LLM backend failed for this request".to_string()
            }
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Misconfiguration { .. } => vec![
                "check ANTHROPIC_API_KEY or the Ollama endpoint in the configuration file".to_string(),
            ],
            Self::Timeout { .. } => vec!["increase the per-schema timeout in [llm] configuration".to_string()],
            Self::ProviderAuth { .. } => vec!["verify the API key is valid and not expired".to_string()],
            Self::ProviderQuota { .. } => vec!["wait for the quota window to reset or switch backends".to_string()],
            Self::SchemaValidationFailed { .. } => {
                vec!["retry with a lower temperature or a more capable model".to_string()]
            }
            Self::AllBackendsFailed { .. } => {
                vec!["check that at least one backend in the fallback chain is reachable".to_string()]
            }
            _ => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Llm
    }
}

/// Errors from the validation layer (C5).
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("structural validation failed: {reason}")]
    Structural { reason: String },

    #[error("{failing} of {total} semantic checks failed")]
    Semantic { failing: u32, total: u32 },

    #[error("category-specific validation for '{category}' failed: {reason}")]
    CategorySpecific { category: String, reason: String },
}

impl UserFriendlyError for ValidationError {
    fn user_message(&self) -> String {
        match self {
            Self::Structural { reason } => format!("structural validation failed: {reason}"),
            Self::Semantic { failing, total } => {
                format!("{failing} of {total} semantic checks did not pass")
            }
            Self::CategorySpecific { category, reason } => {
                format!("'{category}' validation failed: {reason}")
            }
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Structural { .. } => {
                vec!["structural failures block the pipeline; re-run decomposition".to_string()]
            }
            Self::Semantic { .. } => {
                vec!["semantic failures are advisory; review the report before proceeding".to_string()]
            }
            Self::CategorySpecific { .. } => {
                vec!["category-specific failures are advisory; review the report before proceeding".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Validation
    }
}

/// Errors invoking an external subprocess (agent CLI or tracker CLI), C9/C10.
#[derive(Error, Debug)]
pub enum SubprocessError {
    #[error("failed to spawn '{program}': {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("'{program}' timed out after {timeout_seconds}s")]
    Timeout { program: String, timeout_seconds: u64 },

    #[error("'{program}' exited with code {code}")]
    NonZeroExit { program: String, code: i32 },

    #[error("'{program}' monitoring thread terminated unexpectedly")]
    MonitorDisconnected { program: String },

    #[error("'{program}' is not installed")]
    NotInstalled { program: String },
}

impl UserFriendlyError for SubprocessError {
    fn user_message(&self) -> String {
        match self {
            Self::SpawnFailed { program, reason } => format!("could not start '{program}': {reason}"),
            Self::Timeout { program, timeout_seconds } => {
                format!("'{program}' did not finish within {timeout_seconds}s")
            }
            Self::NonZeroExit { program, code } => format!("'{program}' failed with exit code {code}"),
            Self::MonitorDisconnected { program } => {
                format!("lost track of '{program}' while waiting for it to finish")
            }
            Self::NotInstalled { program } => format!("'{program}' is not installed"),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Timeout { .. } => vec!["increase the subprocess timeout in configuration".to_string()],
            Self::NotInstalled { program } => {
                vec![format!("install '{program}' or disable the integration that requires it")]
            }
            _ => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Subprocess
    }
}

/// Errors from the feature/issue tracker adapter (C10).
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("tracker backend is not available")]
    NotAvailable,

    #[error(transparent)]
    Subprocess(#[from] SubprocessError),

    #[error("could not parse tracker output: {reason}")]
    ParseFailed { reason: String },
}

impl UserFriendlyError for TrackerError {
    fn user_message(&self) -> String {
        match self {
            Self::NotAvailable => "the feature tracker binary is not available".to_string(),
            Self::Subprocess(e) => e.user_message(),
            Self::ParseFailed { reason } => format!("could not understand tracker output: {reason}"),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotAvailable => vec!["tracker integration is optional; the loop continues without it".to_string()],
            Self::Subprocess(e) => e.suggestions(),
            Self::ParseFailed { .. } => vec!["check the tracker binary version is supported".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Tracker
    }
}

/// Errors orchestrating the pipeline or the execution loop (C8/C9).
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("step '{step}' failed: {reason}")]
    StepFailed { step: String, reason: String },

    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("maximum iterations ({max_iterations}) reached without completion")]
    MaxIterationsReached { max_iterations: u32 },

    #[error("checkpoint for '{run_id}' is missing or unreadable: {reason}")]
    CheckpointUnavailable { run_id: String, reason: String },

    #[error("no plans are available to run")]
    NoPlansAvailable,

    #[error("skipped {limit} blocked features without finding an unblocked one")]
    TooManyBlocked { limit: u32 },

    #[error("plan file '{path}' does not exist")]
    FileNotFound { path: String },
}

impl UserFriendlyError for PipelineError {
    fn user_message(&self) -> String {
        match self {
            Self::StepFailed { step, reason } => format!("step '{step}' failed: {reason}"),
            Self::InvalidTransition { from, to } => {
                format!("cannot move from state {from} to state {to}")
            }
            Self::MaxIterationsReached { max_iterations } => {
                format!("stopped after {max_iterations} iterations without reaching completion")
            }
            Self::CheckpointUnavailable { run_id, reason } => {
                format!("checkpoint for '{run_id}' could not be loaded: {reason}")
            }
            Self::NoPlansAvailable => "no plans are available to run".to_string(),
            Self::TooManyBlocked { limit } => {
                format!("skipped {limit} blocked features without finding an unblocked one")
            }
            Self::FileNotFound { path } => format!("plan file '{path}' does not exist"),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::StepFailed { .. } => {
                vec!["re-run with --verbose to see which step failed and why".to_string()]
            }
            Self::MaxIterationsReached { .. } => {
                vec!["raise --max-iterations or investigate why the loop is not converging".to_string()]
            }
            Self::CheckpointUnavailable { .. } => {
                vec!["run 'autoplan decompose' again to produce a fresh checkpoint".to_string()]
            }
            Self::NoPlansAvailable => {
                vec!["discover or create a plan before running the execution loop".to_string()]
            }
            Self::TooManyBlocked { .. } => {
                vec!["unblock some features in the tracker or raise the blocked-skip limit".to_string()]
            }
            Self::FileNotFound { .. } => {
                vec!["check the plan path passed to --plan".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Pipeline
    }
}

/// Errors from the requirement decomposition engine (C4).
#[derive(Error, Debug)]
pub enum DecomposeError {
    #[error("cannot decompose empty input")]
    EmptyContent,

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl UserFriendlyError for DecomposeError {
    fn user_message(&self) -> String {
        match self {
            Self::EmptyContent => "the research text supplied for decomposition is empty".to_string(),
            Self::Llm(e) => e.user_message(),
            Self::Model(e) => e.user_message(),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::EmptyContent => vec!["pass non-empty research text to 'autoplan decompose'".to_string()],
            Self::Llm(e) => e.suggestions(),
            Self::Model(e) => e.suggestions(),
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Pipeline
    }
}

/// Configuration discovery/parsing errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file '{path}' is not valid TOML: {reason}")]
    InvalidFile { path: String, reason: String },

    #[error("configuration is missing required key '{key}'")]
    MissingRequired { key: String },

    #[error("configuration value for '{key}' is invalid: {value}")]
    InvalidValue { key: String, value: String },

    #[error("no configuration file found starting from '{path}'")]
    NotFound { path: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile { path, reason } => format!("'{path}' is not valid: {reason}"),
            Self::MissingRequired { key } => format!("missing required configuration key '{key}'"),
            Self::InvalidValue { key, value } => format!("'{key}' has an invalid value: '{value}'"),
            Self::NotFound { path } => format!("no configuration found from '{path}' upward"),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotFound { .. } => {
                vec!["create .autoplan/config.toml or pass --config explicitly".to_string()]
            }
            _ => vec!["check the TOML syntax and section names in the config file".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Aggregate error returned at crate and CLI boundaries.
#[derive(Error, Debug)]
pub enum AutoplanError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Subprocess(#[from] SubprocessError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Decompose(#[from] DecomposeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AutoplanError {
    pub fn display_for_user(&self) -> String {
        match self {
            Self::Model(e) => e.display_for_user(),
            Self::Llm(e) => e.display_for_user(),
            Self::Validation(e) => e.display_for_user(),
            Self::Subprocess(e) => e.display_for_user(),
            Self::Tracker(e) => e.display_for_user(),
            Self::Pipeline(e) => e.display_for_user(),
            Self::Decompose(e) => e.display_for_user(),
            Self::Config(e) => e.display_for_user(),
            Self::Io(e) => format!("error: {e}"),
        }
    }

    pub fn to_exit_code(&self) -> crate::exit_codes::ExitCode {
        crate::exit_codes::exit_code_for(self)
    }
}

pub type Result<T> = std::result::Result<T, AutoplanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_for_user_includes_suggestions() {
        let err = ModelError::InvalidRequirementId {
            value: "x".to_string(),
            reason: "does not match pattern".to_string(),
        };
        let rendered = err.display_for_user();
        assert!(rendered.contains("is invalid"));
        assert!(rendered.contains("Suggestions:"));
    }

    #[test]
    fn aggregate_error_converts_from_variants() {
        let err: AutoplanError = LlmError::ProviderQuota {
            backend: "anthropic".to_string(),
        }
        .into();
        assert!(matches!(err, AutoplanError::Llm(_)));
    }
}
