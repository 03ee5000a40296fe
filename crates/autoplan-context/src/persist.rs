//! Persists tech-stack and file-group summaries under
//! `{output_root}/{sanitized-project-name}/groups/`.

use anyhow::Result;
use autoplan_model::{FileGroups, TechStack};
use autoplan_utils::atomic_write::write_file_atomic;
use camino::{Utf8Path, Utf8PathBuf};

use crate::sanitize::sanitize_project_name;

#[must_use]
pub fn groups_dir(output_root: &Utf8Path, project_name: &str) -> Utf8PathBuf {
    output_root.join(sanitize_project_name(project_name)).join("groups")
}

/// Writes `tech_stack` to `{groups_dir}/tech_stack.json`, overwriting any
/// existing file (re-runs replace prior results).
pub fn persist_tech_stack(output_root: &Utf8Path, project_name: &str, tech_stack: &TechStack) -> Result<()> {
    let path = groups_dir(output_root, project_name).join("tech_stack.json");
    let json = serde_json::to_string_pretty(tech_stack)?;
    write_file_atomic(&path, &json)?;
    Ok(())
}

/// Writes `file_groups` to `{groups_dir}/file_groups.json`, overwriting any
/// existing file.
pub fn persist_file_groups(output_root: &Utf8Path, project_name: &str, file_groups: &FileGroups) -> Result<()> {
    let path = groups_dir(output_root, project_name).join("file_groups.json");
    let json = serde_json::to_string_pretty(file_groups)?;
    write_file_atomic(&path, &json)?;
    Ok(())
}
