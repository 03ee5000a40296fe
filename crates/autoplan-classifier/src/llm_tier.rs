//! Tier 3 — LLM classification.

use autoplan_llm::StructuredClient;
use autoplan_model::{RequirementCategory, RoutingDecision};
use autoplan_utils::error::LlmError;
use serde::Deserialize;
use std::time::Duration;

const SCHEMA_DESCRIPTION: &str = r#"{
  "category": "functional|non_functional|security|performance|usability|integration",
  "routing_decision": "backend_only|frontend_only|middleware|full_stack",
  "confidence": "float in [0,1]"
}"#;

#[derive(Debug, Clone, Deserialize)]
pub struct LlmClassification {
    pub category: RequirementCategory,
    pub routing_decision: RoutingDecision,
    pub confidence: f64,
}

/// Calls the structured LLM client with the classification schema.
///
/// # Errors
/// Propagates whatever `LlmError` the client's fallback chain produced.
pub async fn classify_llm(
    client: &StructuredClient,
    model: &str,
    timeout: Duration,
    text: &str,
) -> Result<LlmClassification, LlmError> {
    client
        .call(
            "pre_classify",
            model,
            SCHEMA_DESCRIPTION,
            text,
            timeout,
        )
        .await
}
