//! Planning step: produces plan markdown.
//!
//! Treated as a pure `(summary) -> PlanResponse` transform via C2, the same
//! way C4/C5 treat their own LLM calls.

use std::time::Duration;

use autoplan_llm::StructuredClient;
use autoplan_model::WorkflowContext;
use autoplan_utils::error::LlmError;
use serde::Deserialize;

const SCHEMA_DESCRIPTION: &str = r#"{
  "overview": "string",
  "phases": [
    { "title": "string", "body": "string" }
  ]
}"#;

#[derive(Debug, Clone, Deserialize)]
pub struct PlanPhase {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanResponse {
    pub overview: String,
    #[serde(default)]
    pub phases: Vec<PlanPhase>,
}

/// Summarizes `context`'s requirement, decomposed hierarchy root
/// descriptions, and any tech-stack/file-group context into the single
/// input string handed to the planning schema call.
#[must_use]
pub fn summarize_context(context: &WorkflowContext) -> String {
    let mut out = format!("Requirement:\n{}\n", context.requirement);

    if let Some(hierarchy) = &context.decomposed_requirements {
        out.push_str("\nDecomposed requirements:\n");
        for root in &hierarchy.roots {
            out.push_str(&format!("- {}: {}\n", root.id, root.description));
        }
    }

    if let Some(tech_stack) = &context.tech_stack {
        out.push_str(&format!(
            "\nTech stack: languages={:?} frameworks={:?} build_systems={:?}\n",
            tech_stack.languages, tech_stack.frameworks, tech_stack.build_systems
        ));
    }

    if let Some(file_groups) = &context.file_groups {
        out.push_str("\nFile groups:\n");
        for group in &file_groups.groups {
            out.push_str(&format!("- {}: {}\n", group.name, group.purpose));
        }
    }

    out
}

/// Runs the planning schema call against a summary of `context`.
///
/// # Errors
/// Propagates the `LlmError` from the client's fallback chain.
pub async fn generate_plan(
    client: &StructuredClient,
    model: &str,
    timeout: Duration,
    context: &WorkflowContext,
) -> Result<PlanResponse, LlmError> {
    let inputs = summarize_context(context);
    client.call("plan", model, SCHEMA_DESCRIPTION, &inputs, timeout).await
}
