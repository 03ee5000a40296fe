//! Tech-stack summary generation. Errors are logged and
//! treated as non-fatal: the caller gets `None` and the step continues.

use std::time::Duration;

use autoplan_llm::StructuredClient;
use autoplan_model::TechStack;
use camino::Utf8Path;

use crate::scan::{concatenate_manifests, find_manifests};

const SCHEMA_DESCRIPTION: &str = r#"{
  "languages": ["string"],
  "frameworks": ["string"],
  "testing_frameworks": ["string"],
  "build_systems": ["string"]
}"#;

/// Scans `project_path` for known manifest/config files and asks C2 to
/// summarize the tech stack. Returns `None` (logged, not fatal) if no
/// manifests are found or the LLM call fails.
pub async fn scan_tech_stack(
    client: &StructuredClient,
    model: &str,
    timeout: Duration,
    project_path: &Utf8Path,
) -> Option<TechStack> {
    let manifests = find_manifests(project_path);
    if manifests.is_empty() {
        tracing::warn!(project_path = %project_path, "no known manifest files found; skipping tech-stack scan");
        return None;
    }

    let combined = concatenate_manifests(&manifests);
    match client
        .call::<TechStack>("tech_stack", model, SCHEMA_DESCRIPTION, &combined, timeout)
        .await
    {
        Ok(tech_stack) => Some(tech_stack),
        Err(e) => {
            tracing::warn!(error = %e, "tech-stack scan failed; continuing without it");
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
    async fn no_manifests_returns_none_without_calling_the_llm() {
        let dir = TempDir::new().unwrap();
        let root = camino::Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let client = StructuredClient::new(Vec::new());
        let result = scan_tech_stack(&client, "haiku", Duration::from_secs(5), &root).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn manifest_present_yields_parsed_tech_stack() {
        let dir = TempDir::new().unwrap();
        let root = camino::Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        fs::write(root.join("Cargo.toml"), "[package]\nname=\"x\"").unwrap();

        let response = r#"{"languages": ["rust"], "frameworks": [], "testing_frameworks": ["cargo test"], "build_systems": ["cargo"]}"#;
        let client = StructuredClient::new(vec![Box::new(StubBackend(response))]);
        let result = scan_tech_stack(&client, "haiku", Duration::from_secs(5), &root)
            .await
            .unwrap();
        assert_eq!(result.languages, vec!["rust".to_string()]);
    }
}
