//! Phase B — per-subprocess expansion.

use std::time::Duration;

use autoplan_classifier::{expansion_function_for, PreClassifier};
use autoplan_llm::StructuredClient;
use autoplan_model::{DesignContracts, ImplementationComponents, RequirementId, RequirementNode, RequirementType};
use autoplan_utils::error::LlmError;
use serde::Deserialize;

use crate::complexity::{assess_complexity, Complexity};

const GENERIC_EXPANSION_SCHEMA: &str = "expand_generic";

const SCHEMA_DESCRIPTION: &str = r#"{
  "acceptance_criteria": ["string"],
  "implementation": {"frontend": ["string"], "backend": ["string"], "middleware": ["string"], "shared": ["string"]},
  "design_contracts": {"preconditions": ["string"], "postconditions": ["string"], "invariants": ["string"]}
}"#;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PhaseBResponse {
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub implementation: ImplementationComponents,
    #[serde(default)]
    pub design_contracts: Option<DesignContracts>,
}

/// Truncates `context` to the character budget for `complexity`, keeping
/// the leading (most relevant) portion of the research text.
#[must_use]
pub fn truncate_context(context: &str, complexity: Complexity) -> String {
    let limit = complexity.context_truncation_chars();
    if context.len() <= limit {
        context.to_string()
    } else {
        let mut end = limit;
        while !context.is_char_boundary(end) {
            end -= 1;
        }
        context[..end].to_string()
    }
}

fn expansion_inputs(parent_description: &str, subprocess_description: &str, context: &str) -> String {
    serde_json::json!({
        "parent_description": parent_description,
        "subprocess_description": subprocess_description,
        "context": context,
    })
    .to_string()
}

/// Expands a single subprocess into acceptance criteria, implementation
/// components, and (when available) design contracts. `classifier` decides
/// whether a category-specific or generic schema is used: a confident
/// tier-1/tier-2 classification (no LLM call) selects the category schema,
/// otherwise the generic one is used.
///
/// # Errors
/// Propagates the `LlmError` from the structured call.
pub async fn expand_subprocess(
    client: &StructuredClient,
    model: &str,
    timeout: Duration,
    classifier: &PreClassifier,
    parent_description: &str,
    subprocess_description: &str,
    context: &str,
) -> Result<(PhaseBResponse, Complexity), LlmError> {
    let cascade = match classifier
        .classify(client, model, timeout, subprocess_description)
        .await
    {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            tracing::warn!(
                subprocess = %subprocess_description,
                error = %e,
                "pre-classification cascade failed; treating as full-stack"
            );
            None
        }
    };
    let routing = cascade
        .as_ref()
        .map(|o| o.result.routing_decision)
        .unwrap_or(autoplan_model::RoutingDecision::FullStack);
    let complexity = assess_complexity(routing, subprocess_description);

    let schema_name = cascade
        .as_ref()
        .map(|o| expansion_function_for(o.result.category))
        .unwrap_or(GENERIC_EXPANSION_SCHEMA);

    let truncated = truncate_context(context, complexity);
    let inputs = expansion_inputs(parent_description, subprocess_description, &truncated);

    let response: PhaseBResponse = client
        .call(schema_name, model, SCHEMA_DESCRIPTION, &inputs, timeout)
        .await?;
    Ok((response, complexity))
}

/// Builds the child node for an expanded subprocess. On expansion failure
/// the node is still attached with `expansion_failed=true` and empty
/// enrichment fields, preserving the already-expanded siblings.
#[must_use]
pub fn build_child_node(
    parent_id: &RequirementId,
    index: u32,
    subprocess_description: &str,
    outcome: Option<PhaseBResponse>,
) -> Result<RequirementNode, autoplan_utils::error::ModelError> {
    let child_id = parent_id.child(index)?;
    let mut node = RequirementNode::new_child(
        child_id,
        subprocess_description,
        RequirementType::SubProcess,
        parent_id.clone(),
    )?;

    match outcome {
        Some(response) => {
            node.acceptance_criteria = response.acceptance_criteria;
            node.implementation = Some(response.implementation);
            node.design_contracts = response.design_contracts;
        }
        None => {
            node.expansion_failed = true;
        }
    }
    Ok(node)
}
