//! Validation Layer (C5): structural (blocking), semantic (advisory), and
//! category-specific (advisory) stages over a [`RequirementHierarchy`].

mod category;
mod issue;
mod semantic;
mod structural;

pub use category::validate_category;
pub use issue::{Severity, ValidationIssue, ValidationSummary};
pub use semantic::{assess_semantic, assessment_to_issues, SemanticAssessment};
pub use structural::{validate_structural, StructuralReport};

use autoplan_model::{RequirementHierarchy, RequirementNode};

/// Aggregates a flat issue list into a [`ValidationSummary`] over `total`
/// requirements, counting a requirement invalid if any blocking issue
/// targets it (advisory-only issues don't affect validity).
#[must_use]
pub fn summarize(issues: &[ValidationIssue], total: u32) -> ValidationSummary {
    let invalid: std::collections::HashSet<_> = issues
        .iter()
        .filter(|i| i.severity == Severity::Blocking)
        .filter_map(|i| i.node_id.as_ref())
        .collect();
    let invalid_count = invalid.len() as u32;
    let valid_count = total.saturating_sub(invalid_count);
    ValidationSummary::new(valid_count, invalid_count)
}

/// Walks every node in `hierarchy` in document order.
pub fn walk(hierarchy: &RequirementHierarchy) -> Vec<&RequirementNode> {
    fn walk_node<'a>(node: &'a RequirementNode, out: &mut Vec<&'a RequirementNode>) {
        out.push(node);
        for child in &node.children {
            walk_node(child, out);
        }
    }
    let mut out = Vec::new();
    for root in &hierarchy.roots {
        walk_node(root, &mut out);
    }
    out
}

/// Stage 4 applied to every node in the hierarchy.
#[must_use]
pub fn validate_category_all(hierarchy: &RequirementHierarchy) -> Vec<ValidationIssue> {
    walk(hierarchy).into_iter().flat_map(validate_category).collect()
}
