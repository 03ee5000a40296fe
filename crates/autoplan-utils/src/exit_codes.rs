//! CLI exit codes and the mapping from [`crate::error::AutoplanError`] to them.

use crate::error::AutoplanError;

/// A process exit code, newtyped to keep call sites honest about units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    pub const SUCCESS: Self = Self(0);
    pub const GENERAL_FAILURE: Self = Self(1);
    pub const VALIDATION_FAILED: Self = Self(2);
    pub const NO_PLANS_AVAILABLE: Self = Self(3);
    pub const CLI_ARGS: Self = Self(4);
    pub const LLM_FAILURE: Self = Self(5);
    pub const TRACKER_UNAVAILABLE: Self = Self(6);

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn from_i32(value: i32) -> Self {
        Self(value)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl From<i32> for ExitCode {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// Raw exit code constants, for call sites that want a plain `i32`
/// (e.g. `std::process::exit`).
pub mod codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_FAILURE: i32 = 1;
    pub const VALIDATION_FAILED: i32 = 2;
    pub const NO_PLANS_AVAILABLE: i32 = 3;
    pub const CLI_ARGS: i32 = 4;
    pub const LLM_FAILURE: i32 = 5;
    pub const TRACKER_UNAVAILABLE: i32 = 6;
}

/// Map an [`AutoplanError`] to the exit code defines. Codes 0-3 keep their
/// literal meaning (success, generic failure, validation-blocked, no plans
/// available); 4-6 are component-specific codes added for library users (CLI
/// argument errors, LLM failure, tracker unavailable) that don't have a
/// dedicated code otherwise.
#[must_use]
pub fn exit_code_for(error: &AutoplanError) -> ExitCode {
    match error {
        AutoplanError::Config(_) => ExitCode::CLI_ARGS,
        AutoplanError::Validation(_) => ExitCode::VALIDATION_FAILED,
        AutoplanError::Llm(_) => ExitCode::LLM_FAILURE,
        AutoplanError::Tracker(crate::error::TrackerError::NotAvailable) => {
            ExitCode::TRACKER_UNAVAILABLE
        }
        AutoplanError::Tracker(_) => ExitCode::GENERAL_FAILURE,
        AutoplanError::Subprocess(crate::error::SubprocessError::NotInstalled { .. }) => {
            ExitCode::TRACKER_UNAVAILABLE
        }
        AutoplanError::Pipeline(crate::error::PipelineError::NoPlansAvailable) => {
            ExitCode::NO_PLANS_AVAILABLE
        }
        AutoplanError::Model(_) | AutoplanError::Subprocess(_) | AutoplanError::Pipeline(_)
        | AutoplanError::Decompose(_) | AutoplanError::Io(_) => ExitCode::GENERAL_FAILURE,
    }
}
