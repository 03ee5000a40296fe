//! Stage 4 — category-specific validation, advisory, gated
//! by `--validate-category`. Applied after planning, so it checks the
//! requirement's accumulated text (description, acceptance criteria,
//! design contracts) rather than calling the LLM again.

use autoplan_model::{RequirementCategory, RequirementNode};

use crate::issue::ValidationIssue;

/// Keyword groups a category must reference at least one term from, per
/// group, somewhere in the requirement's combined text.
fn required_keyword_groups(category: RequirementCategory) -> &'static [&'static [&'static str]] {
    match category {
        RequirementCategory::Security => &[
            &["threat model", "threat-model", "threat"],
            &["auth", "authentication"],
            &["authz", "authorization"],
            &["data classification", "data-classification", "classification"],
        ],
        RequirementCategory::Performance => &[
            &["metric"],
            &["unit", "ms", "seconds", "req/s", "rps"],
            &["target"],
            &["load", "throughput", "concurrency"],
        ],
        RequirementCategory::Integration => &[
            &["interface contract", "contract", "schema"],
            &["error handling", "error"],
            &["timeout"],
        ],
        RequirementCategory::Functional | RequirementCategory::Usability | RequirementCategory::NonFunctional => &[],
    }
}

fn combined_text(node: &RequirementNode) -> String {
    let mut text = node.description.clone();
    text.push(' ');
    text.push_str(&node.acceptance_criteria.join(" "));
    if let Some(contracts) = &node.design_contracts {
        text.push(' ');
        text.push_str(&contracts.preconditions.join(" "));
        text.push(' ');
        text.push_str(&contracts.postconditions.join(" "));
        text.push(' ');
        text.push_str(&contracts.invariants.join(" "));
    }
    text.to_lowercase()
}

/// Checks `node` against the required-reference rules for its category.
/// Functional and usability requirements have no required rules and always
/// pass.
#[must_use]
pub fn validate_category(node: &RequirementNode) -> Vec<ValidationIssue> {
    let groups = required_keyword_groups(node.category);
    if groups.is_empty() {
        return Vec::new();
    }

    let text = combined_text(node);
    groups
        .iter()
        .filter(|group| !group.iter().any(|kw| text.contains(kw)))
        .map(|group| {
            ValidationIssue::advisory(
                Some(node.id.clone()),
                format!(
                    "{} ({:?}) does not reference any of: {}",
                    node.id,
                    node.category,
                    group.join(", ")
                ),
            )
        })
        .collect()
}
