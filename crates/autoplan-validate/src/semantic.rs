//! Stage 3 — semantic validation, advisory, gated by
//! `--validate-full`. One C2 call per requirement.

use std::time::Duration;

use autoplan_llm::StructuredClient;
use autoplan_model::RequirementNode;
use autoplan_utils::error::LlmError;
use serde::Deserialize;

use crate::issue::ValidationIssue;

const SCHEMA_DESCRIPTION: &str = r#"{
  "is_valid": "bool",
  "issues": ["string"],
  "suggestions": ["string"],
  "completeness_score": "float in [0,1]",
  "scope_alignment_score": "float in [0,1]",
  "confidence": "float in [0,1]"
}"#;

const COMPLETENESS_THRESHOLD: f64 = 0.6;
const SCOPE_ALIGNMENT_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Deserialize)]
pub struct SemanticAssessment {
    pub is_valid: bool,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    pub completeness_score: f64,
    pub scope_alignment_score: f64,
    pub confidence: f64,
}

/// Runs the semantic validation schema against a single node's description.
///
/// # Errors
/// Propagates the `LlmError` from the client's fallback chain.
pub async fn assess_semantic(
    client: &StructuredClient,
    model: &str,
    timeout: Duration,
    node: &RequirementNode,
) -> Result<SemanticAssessment, LlmError> {
    client
        .call(
            "validate_semantic",
            model,
            SCHEMA_DESCRIPTION,
            &node.description,
            timeout,
        )
        .await
}

/// Turns a semantic assessment into advisory issues per the stated
/// thresholds. Never returns a blocking issue.
#[must_use]
pub fn assessment_to_issues(node: &RequirementNode, assessment: &SemanticAssessment) -> Vec<ValidationIssue> {
    let mut issues: Vec<ValidationIssue> = assessment
        .issues
        .iter()
        .map(|msg| ValidationIssue::advisory(Some(node.id.clone()), msg.clone()))
        .collect();

    if assessment.completeness_score < COMPLETENESS_THRESHOLD {
        issues.push(ValidationIssue::advisory(
            Some(node.id.clone()),
            format!(
                "{} completeness score {:.2} is below the {:.2} threshold",
                node.id, assessment.completeness_score, COMPLETENESS_THRESHOLD
            ),
        ));
    }

    if assessment.scope_alignment_score < SCOPE_ALIGNMENT_THRESHOLD {
        issues.push(ValidationIssue::advisory(
            Some(node.id.clone()),
            format!(
                "{} scope alignment score {:.2} is below the {:.2} threshold",
                node.id, assessment.scope_alignment_score, SCOPE_ALIGNMENT_THRESHOLD
            ),
        ));
    }

    issues
}
