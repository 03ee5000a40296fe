//! Requirement Decomposition Engine (C4): Phase A extraction, Phase B
//! per-subprocess expansion, and ADaPT adaptive granularity.

mod complexity;
mod phase_a;
mod phase_b;

pub use complexity::{assess_complexity, Complexity};
pub use phase_a::{extract_parents, PhaseAParent, PhaseAResponse};
pub use phase_b::{build_child_node, expand_subprocess, truncate_context, PhaseBResponse};

use std::time::Duration;

use autoplan_classifier::PreClassifier;
use autoplan_llm::StructuredClient;
use autoplan_model::RequirementHierarchy;
use autoplan_utils::error::DecomposeError;

/// Runs Phase A then Phase B over `research_text`, returning the fully
/// assembled hierarchy. A subprocess whose Phase B call fails is still
/// attached to its parent with `expansion_failed=true`; already-expanded
/// siblings are preserved.
///
/// `research_text` doubles as the Phase B context window before
/// complexity-based truncation.
///
/// # Errors
/// `DecomposeError::EmptyContent` on blank input; otherwise only Phase A
/// failures propagate as an error — Phase B failures are recorded
/// per-node instead of aborting the whole decomposition.
pub async fn decompose(
    client: &StructuredClient,
    model: &str,
    timeout: Duration,
    classifier: &PreClassifier,
    research_text: &str,
) -> Result<RequirementHierarchy, DecomposeError> {
    let mut hierarchy = phase_a::extract_parents(client, model, timeout, research_text).await?;

    for root in &mut hierarchy.roots {
        let parent_description = root.description.clone();
        // Phase A's sub_processes list rides in acceptance_criteria until
        // Phase B drains it; roots have no acceptance criteria of their own.
        let subprocesses = std::mem::take(&mut root.acceptance_criteria);

        for (index, subprocess_description) in subprocesses.into_iter().enumerate() {
            let result = phase_b::expand_subprocess(
                client,
                model,
                timeout,
                classifier,
                &parent_description,
                &subprocess_description,
                research_text,
            )
            .await;

            let outcome = match result {
                Ok((response, _complexity)) => Some(response),
                Err(e) => {
                    tracing::warn!(
                        parent = %root.id,
                        subprocess = %subprocess_description,
                        error = %e,
                        "phase B expansion failed; preserving partial progress"
                    );
                    None
                }
            };

            let child = phase_b::build_child_node(
                &root.id,
                index as u32 + 1,
                &subprocess_description,
                outcome,
            )?;
            root.add_child(child)?;
        }
    }

    Ok(hierarchy)
}
