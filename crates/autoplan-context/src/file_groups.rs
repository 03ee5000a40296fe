//! File-group summary generation. Errors are logged and
//! treated as non-fatal.

use std::time::Duration;

use autoplan_llm::StructuredClient;
use autoplan_model::FileGroups;
use camino::Utf8Path;

use crate::scan::collect_source_files;

pub const DEFAULT_MAX_FILES: usize = 100;

const SCHEMA_DESCRIPTION: &str = r#"{
  "groups": [{"name": "string", "files": ["string"], "purpose": "string"}]
}"#;

/// Collects up to `max_files` source files under `project_path` and asks
/// C2 to group them by purpose. Returns `None` (logged, not fatal) if no
/// files are found or the LLM call fails.
pub async fn scan_file_groups(
    client: &StructuredClient,
    model: &str,
    timeout: Duration,
    project_path: &Utf8Path,
    max_files: usize,
) -> Option<FileGroups> {
    let files = collect_source_files(project_path, max_files);
    if files.is_empty() {
        tracing::warn!(project_path = %project_path, "no source files found; skipping file-group scan");
        return None;
    }

    let tree = files.join("\n");
    match client
        .call::<FileGroups>("file_groups", model, SCHEMA_DESCRIPTION, &tree, timeout)
        .await
    {
        Ok(groups) => Some(groups),
        Err(e) => {
            tracing::warn!(error = %e, "file-group scan failed; continuing without it");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use autoplan_llm::{LlmBackend, LlmInvocation, LlmResult};
    use autoplan_utils::error::LlmError;
    use std::fs;
    use tempfile::TempDir;

    struct StubBackend(&'static str);

    #[async_trait]
    impl LlmBackend for StubBackend {
        fn name(&self) -> &str {
            "stub"
        }

        async fn invoke(&self, _inv: &LlmInvocation) -> Result<LlmResult, LlmError> {
            Ok(LlmResult::new(self.0.to_string(), "stub", "stub-model"))
        }
    }

    #[tokio::test]
    async fn empty_project_returns_none_without_calling_the_llm() {
        let dir = TempDir::new().unwrap();
        let root = camino::Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let client = StructuredClient::new(Vec::new());
        let result = scan_file_groups(&client, "haiku", Duration::from_secs(5), &root, DEFAULT_MAX_FILES).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn files_present_yields_parsed_groups() {
        let dir = TempDir::new().unwrap();
        let root = camino::Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        fs::write(root.join("main.rs"), "fn main() {}").unwrap();

        let response = r#"{"groups": [{"name": "entrypoint", "files": ["main.rs"], "purpose": "binary entrypoint"}]}"#;
        let client = StructuredClient::new(vec![Box::new(StubBackend(response))]);
        let result = scan_file_groups(&client, "haiku", Duration::from_secs(5), &root, DEFAULT_MAX_FILES)
            .await
            .unwrap();
        assert_eq!(result.groups.len(), 1);
    }
}
