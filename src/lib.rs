//! autoplan - an autonomous planning pipeline that turns free-text research
//! into a checkpointed, phase-decomposed implementation plan, then drives
//! its own execution by invoking an external coding agent under
//! checkpoint/resume control.
//!
//! This crate is a thin composition root: the cascade classifier, the
//! decomposition engine, the validation layer, the checkpointed
//! orchestrator, and the execution loop each live in their own
//! `autoplan-*` crate. `autoplan` wires them together behind a CLI.

pub mod cli;

// Stable re-exports for library consumers that embed the pipeline directly
// instead of going through the CLI.
pub use autoplan_config::Config;
pub use autoplan_utils::error::{AutoplanError, Result};
pub use autoplan_utils::exit_codes::ExitCode;
