//! Context hashing: SHA-256 over a canonicalized
//! fingerprint of sorted file tree paths, git branch, project name, and
//! project type. File content is never hashed.

use std::sync::Arc;
use std::time::Duration;

use autoplan_utils::runner::{CommandSpec, ProcessRunner};
use camino::Utf8Path;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

const FIELD_SEPARATOR: &str = "\u{1e}";
const EXCLUDED_DIRS: &[&str] = &[".git", "node_modules", "target", ".workflow-checkpoints", ".autoplan"];

fn is_excluded(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| EXCLUDED_DIRS.contains(&name))
        .unwrap_or(false)
}

/// Sorted, project-relative file paths under `project_path` (directories
/// excluded), the first ingredient of the fingerprint.
#[must_use]
pub fn sorted_file_tree(project_path: &Utf8Path) -> Vec<String> {
    let mut paths = Vec::new();
    let walker = WalkDir::new(project_path.as_std_path())
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_excluded(e));

    for entry in walker.filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(project_path.as_std_path()) {
            if let Some(s) = relative.to_str() {
                paths.push(s.replace('\\', "/"));
            }
        }
    }
    paths.sort();
    paths
}

/// Current git branch, via `git -C <project_path> rev-parse --abbrev-ref
/// HEAD`. Falls back to `"unknown"` if git isn't available or the
/// directory isn't a repository — branch detection is never fatal.
#[must_use]
pub fn git_branch(project_path: &Utf8Path, runner: &Arc<dyn ProcessRunner>) -> String {
    let cmd = CommandSpec::new("git")
        .arg("-C")
        .arg(project_path.as_str())
        .arg("rev-parse")
        .arg("--abbrev-ref")
        .arg("HEAD");

    match runner.run(&cmd, Duration::from_secs(5)) {
        Ok(output) if output.success() => {
            let branch = output.stdout_string().trim().to_string();
            if branch.is_empty() {
                "unknown".to_string()
            } else {
                branch
            }
        }
        _ => "unknown".to_string(),
    }
}

/// SHA-256 hex digest over `sorted file tree paths | branch | project_name
/// | project_type`, each path joined by `\n` and fields separated by the
/// ASCII record separator. Deterministic: identical workspaces always
/// produce identical hashes.
#[must_use]
pub fn context_hash(file_tree: &[String], branch: &str, project_name: &str, project_type: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file_tree.join("\n").as_bytes());
    hasher.update(FIELD_SEPARATOR.as_bytes());
    hasher.update(branch.as_bytes());
    hasher.update(FIELD_SEPARATOR.as_bytes());
    hasher.update(project_name.as_bytes());
    hasher.update(FIELD_SEPARATOR.as_bytes());
    hasher.update(project_type.as_bytes());
    format!("{:x}", hasher.finalize())
}
