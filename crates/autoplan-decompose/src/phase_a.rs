//! Phase A — initial extraction.

use std::time::Duration;

use autoplan_llm::StructuredClient;
use autoplan_model::{RequirementHierarchy, RequirementId, RequirementNode};
use autoplan_utils::error::DecomposeError;
use serde::Deserialize;

const SCHEMA_DESCRIPTION: &str = r#"{
  "parents": [
    {
      "description": "string",
      "sub_processes": ["string"],
      "related_concepts": ["string"]
    }
  ]
}"#;

#[derive(Debug, Clone, Deserialize)]
pub struct PhaseAParent {
    pub description: String,
    #[serde(default)]
    pub sub_processes: Vec<String>,
    #[serde(default)]
    pub related_concepts: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhaseAResponse {
    #[serde(default)]
    pub parents: Vec<PhaseAParent>,
}

/// Feeds the full research text to C2 and assembles `REQ_NNN` root nodes in
/// list order. An empty `research_text` returns `EmptyContent` without
/// issuing any LLM call.
///
/// # Errors
/// `DecomposeError::EmptyContent` on blank input; otherwise propagates the
/// LLM or model-construction error.
pub async fn extract_parents(
    client: &StructuredClient,
    model: &str,
    timeout: Duration,
    research_text: &str,
) -> Result<RequirementHierarchy, DecomposeError> {
    if research_text.trim().is_empty() {
        return Err(DecomposeError::EmptyContent);
    }

    let response: PhaseAResponse = client
        .call("extract_parents", model, SCHEMA_DESCRIPTION, research_text, timeout)
        .await?;

    let mut hierarchy = RequirementHierarchy::new();
    for (index, parent) in response.parents.into_iter().enumerate() {
        let id = RequirementId::root(index as u32 + 1)?;
        let mut node = RequirementNode::new_root(id, parent.description)?;
        node.related_concepts = parent.related_concepts;
        node.acceptance_criteria = parent.sub_processes.clone();
        hierarchy.add_root(node)?;
    }
    Ok(hierarchy)
}
