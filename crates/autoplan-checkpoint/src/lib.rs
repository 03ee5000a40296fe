//! Checkpoint persistence, context fingerprinting, and session naming
//! (C7).
//!
//! Checkpoints live at `{project_path}/.workflow-checkpoints/{uuid}.json`,
//! relative to the project being planned — not under the user-home-relative
//! `autoplan_home()` convention used elsewhere in this workspace.

mod fingerprint;
mod manager;
mod session_name;

pub use fingerprint::{context_hash, git_branch, sorted_file_tree};
pub use manager::{
    age_in_days, checkpoints_dir, cleanup_all, cleanup_by_age, dedup_by_context_hash,
    detect_resumable_checkpoint, list_checkpoints, write_checkpoint,
};
pub use session_name::{derive_session_name, display_name};
