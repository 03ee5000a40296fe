//! Context Generator (C6): scans a project for its tech stack and file
//! groups, persisting both under `{output_root}/{sanitized-name}/groups/`.

mod file_groups;
mod persist;
mod sanitize;
mod scan;
mod tech_stack;

pub use file_groups::{scan_file_groups, DEFAULT_MAX_FILES};
pub use persist::{groups_dir, persist_file_groups, persist_tech_stack};
pub use sanitize::sanitize_project_name;
pub use scan::{collect_source_files, concatenate_manifests, find_manifests};
pub use tech_stack::scan_tech_stack;

use std::time::Duration;

use autoplan_llm::StructuredClient;
use autoplan_model::{FileGroups, TechStack};
use camino::Utf8Path;

/// Runs both scans and persists whichever succeeded. Neither scan failing
/// is fatal to the caller: this always returns `Ok`, with the individual
/// summaries `None` where their scan failed or found nothing.
pub async fn generate_context(
    client: &StructuredClient,
    model: &str,
    timeout: Duration,
    project_path: &Utf8Path,
    output_root: &Utf8Path,
    project_name: &str,
    max_files: usize,
) -> (Option<TechStack>, Option<FileGroups>) {
    let tech_stack = scan_tech_stack(client, model, timeout, project_path).await;
    if let Some(ts) = &tech_stack {
        if let Err(e) = persist::persist_tech_stack(output_root, project_name, ts) {
            tracing::warn!(error = %e, "failed to persist tech-stack summary");
        }
    }

    let file_groups = scan_file_groups(client, model, timeout, project_path, max_files).await;
    if let Some(fg) = &file_groups {
        if let Err(e) = persist::persist_file_groups(output_root, project_name, fg) {
            tracing::warn!(error = %e, "failed to persist file-groups summary");
        }
    }

    (tech_stack, file_groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use autoplan_llm::{LlmBackend, LlmInvocation, LlmResult};
    use autoplan_utils::error::LlmError;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn generate_context_persists_both_summaries_when_both_succeed() {
        let project_dir = TempDir::new().unwrap();
        let project_path = camino::Utf8PathBuf::from_path_buf(project_dir.path().to_path_buf()).unwrap();
        fs::write(project_path.join("Cargo.toml"), "[package]\nname=\"x\"").unwrap();
        fs::write(project_path.join("main.rs"), "fn main() {}").unwrap();

        let output_dir = TempDir::new().unwrap();
        let output_root = camino::Utf8PathBuf::from_path_buf(output_dir.path().to_path_buf()).unwrap();

        let tech_response = r#"{"languages": ["rust"], "frameworks": [], "testing_frameworks": [], "build_systems": ["cargo"]}"#;
        let group_response = r#"{"groups": [{"name": "entrypoint", "files": ["main.rs"], "purpose": "binary entrypoint"}]}"#;

        // Two sequential calls against one backend: tech-stack then file-groups.
        let client = StructuredClient::new(vec![Box::new(SequencedBackend {
            responses: vec![tech_response, group_response],
            call_count: std::sync::atomic::AtomicU32::new(0),
        })]);

        let (tech_stack, file_groups) = generate_context(
            &client,
            "haiku",
            Duration::from_secs(5),
            &project_path,
            &output_root,
            "Demo Project",
            DEFAULT_MAX_FILES,
        )
        .await;

        assert!(tech_stack.is_some());
        assert!(file_groups.is_some());
        assert!(groups_dir(&output_root, "Demo Project").join("tech_stack.json").exists());
        assert!(groups_dir(&output_root, "Demo Project").join("file_groups.json").exists());
    }

    struct SequencedBackend {
        responses: Vec<&'static str>,
        call_count: std::sync::atomic::AtomicU32,
    }

    #[async_trait]
    impl LlmBackend for SequencedBackend {
        fn name(&self) -> &str {
            "sequenced"
        }

        async fn invoke(&self, _inv: &LlmInvocation) -> Result<LlmResult, LlmError> {
            let idx = self.call_count.fetch_add(1, std::sync::atomic::Ordering::SeqCst) as usize;
            Ok(LlmResult::new(self.responses[idx].to_string(), "sequenced", "model"))
        }
    }
}
