//! Checkpoint file persistence, listing, deduplication, and cleanup.

use std::collections::HashMap;

use anyhow::Result;
use autoplan_model::{Checkpoint, CheckpointPhase, WorkflowContext};
use autoplan_utils::atomic_write::write_file_atomic;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use uuid::Uuid;

const CHECKPOINT_DIR_NAME: &str = ".workflow-checkpoints";

#[must_use]
pub fn checkpoints_dir(project_path: &Utf8Path) -> Utf8PathBuf {
    project_path.join(CHECKPOINT_DIR_NAME)
}

/// Writes a new checkpoint file under `{project_path}/.workflow-checkpoints/{uuid}.json`.
pub fn write_checkpoint(
    project_path: &Utf8Path,
    phase: CheckpointPhase,
    state_snapshot: WorkflowContext,
    context_hash: String,
) -> Result<Checkpoint> {
    let id = Uuid::new_v4();
    let file_path = checkpoints_dir(project_path).join(format!("{id}.json"));
    let checkpoint = Checkpoint {
        id,
        phase,
        timestamp: Utc::now(),
        state_snapshot,
        context_hash,
        file_path: file_path.to_string(),
    };

    let json = serde_json::to_string_pretty(&checkpoint)?;
    write_file_atomic(&file_path, &json)?;
    Ok(checkpoint)
}

/// Lists every checkpoint under `project_path`. Unreadable or malformed
/// files are logged and skipped, not fatal.
#[must_use]
pub fn list_checkpoints(project_path: &Utf8Path) -> Vec<Checkpoint> {
    let dir = checkpoints_dir(project_path);
    let Ok(entries) = std::fs::read_dir(dir.as_std_path()) else {
        return Vec::new();
    };

    let mut checkpoints = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Checkpoint>(&content) {
                Ok(checkpoint) => checkpoints.push(checkpoint),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping malformed checkpoint file"),
            },
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable checkpoint file"),
        }
    }
    checkpoints
}

/// Groups `checkpoints` by `context_hash`, keeping only the one with the
/// latest timestamp per group. O(n).
#[must_use]
pub fn dedup_by_context_hash(checkpoints: Vec<Checkpoint>) -> Vec<Checkpoint> {
    let mut latest: HashMap<String, Checkpoint> = HashMap::new();
    for checkpoint in checkpoints {
        latest
            .entry(checkpoint.context_hash.clone())
            .and_modify(|existing| {
                if checkpoint.timestamp > existing.timestamp {
                    *existing = checkpoint.clone();
                }
            })
            .or_insert(checkpoint);
    }
    latest.into_values().collect()
}

/// The most recent non-`Completed` checkpoint for `project_path`, or
/// `None` if there isn't one.
#[must_use]
pub fn detect_resumable_checkpoint(project_path: &Utf8Path) -> Option<Checkpoint> {
    let deduped = dedup_by_context_hash(list_checkpoints(project_path));
    deduped
        .into_iter()
        .filter(|c| c.phase != CheckpointPhase::Completed)
        .max_by_key(|c| c.timestamp)
}

/// Deletes checkpoint files older than `days`, based on each checkpoint's
/// recorded `timestamp`. Failures on individual files are logged and
/// skipped, never aborting the sweep.
pub fn cleanup_by_age(project_path: &Utf8Path, days: i64) -> usize {
    let cutoff = Utc::now() - chrono::Duration::days(days);
    cleanup_where(project_path, |c| c.timestamp < cutoff)
}

/// Deletes every checkpoint file for `project_path`.
pub fn cleanup_all(project_path: &Utf8Path) -> usize {
    cleanup_where(project_path, |_| true)
}

fn cleanup_where(project_path: &Utf8Path, predicate: impl Fn(&Checkpoint) -> bool) -> usize {
    let mut removed = 0;
    for checkpoint in list_checkpoints(project_path) {
        if !predicate(&checkpoint) {
            continue;
        }
        match std::fs::remove_file(&checkpoint.file_path) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(
                path = %checkpoint.file_path,
                error = %e,
                "failed to remove checkpoint file during cleanup"
            ),
        }
    }
    removed
}

/// Age, in days, of `timestamp` relative to now. Exposed for callers that
/// want to report age without re-deriving the cutoff logic.
#[must_use]
pub fn age_in_days(timestamp: DateTime<Utc>) -> i64 {
    (Utc::now() - timestamp).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, path)
    }

    #[test]
    fn write_then_list_roundtrips() {
        let (_dir, project_path) = project();
        let ctx = WorkflowContext::new(project_path.as_str(), "build a thing");
        let written = write_checkpoint(&project_path, CheckpointPhase::Research, ctx, "hash-1".to_string()).unwrap();

        let listed = list_checkpoints(&project_path);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, written.id);
    }

    #[test]
    fn dedup_keeps_latest_timestamp_per_context_hash() {
        let ctx = WorkflowContext::new("/tmp/a", "req");
        let mut older = Checkpoint::new(CheckpointPhase::Research, ctx.clone(), "same-hash".to_string(), "a.json");
        older.timestamp = Utc::now() - chrono::Duration::hours(2);
        let newer = Checkpoint::new(CheckpointPhase::Planning, ctx, "same-hash".to_string(), "b.json");

        let deduped = dedup_by_context_hash(vec![older.clone(), newer.clone()]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].id, newer.id);
    }

    #[test]
    fn detect_resumable_skips_completed_checkpoints() {
        let (_dir, project_path) = project();
        let ctx = WorkflowContext::new(project_path.as_str(), "req");
        write_checkpoint(&project_path, CheckpointPhase::Completed, ctx.clone(), "h1".to_string()).unwrap();
        let resumable = write_checkpoint(&project_path, CheckpointPhase::Planning, ctx, "h2".to_string()).unwrap();

        let found = detect_resumable_checkpoint(&project_path).unwrap();
        assert_eq!(found.id, resumable.id);
    }

    #[test]
    fn detect_resumable_is_none_when_everything_is_completed() {
        let (_dir, project_path) = project();
        let ctx = WorkflowContext::new(project_path.as_str(), "req");
        write_checkpoint(&project_path, CheckpointPhase::Completed, ctx, "h1".to_string()).unwrap();
        assert!(detect_resumable_checkpoint(&project_path).is_none());
    }

    #[test]
    fn cleanup_all_removes_every_checkpoint_file() {
        let (_dir, project_path) = project();
        let ctx = WorkflowContext::new(project_path.as_str(), "req");
        write_checkpoint(&project_path, CheckpointPhase::Research, ctx.clone(), "h1".to_string()).unwrap();
        write_checkpoint(&project_path, CheckpointPhase::Planning, ctx, "h2".to_string()).unwrap();

        let removed = cleanup_all(&project_path);
        assert_eq!(removed, 2);
        assert!(list_checkpoints(&project_path).is_empty());
    }

    #[test]
    fn cleanup_by_age_only_removes_old_checkpoints() {
        let (_dir, project_path) = project();
        let ctx = WorkflowContext::new(project_path.as_str(), "req");
        let fresh = write_checkpoint(&project_path, CheckpointPhase::Research, ctx.clone(), "h1".to_string()).unwrap();

        let mut stale = Checkpoint::new(CheckpointPhase::Research, ctx, "h2".to_string(), "");
        stale.timestamp = Utc::now() - chrono::Duration::days(30);
        let stale_path = checkpoints_dir(&project_path).join(format!("{}.json", stale.id));
        stale.file_path = stale_path.to_string();
        write_file_atomic(&stale_path, &serde_json::to_string(&stale).unwrap()).unwrap();

        let removed = cleanup_by_age(&project_path, 7);
        assert_eq!(removed, 1);
        let remaining = list_checkpoints(&project_path);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, fresh.id);
    }
}
