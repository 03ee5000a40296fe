//! Stage 1-2 structural validation, blocking.
//!
//! `RequirementNode`/`RequirementHierarchy` enforce their invariants at
//! construction time (see `autoplan_model::requirement`), but `serde`
//! deserialization builds the struct fields directly and never calls those
//! constructors — a hierarchy reloaded from a checkpoint or hand-edited JSON
//! can carry duplicate IDs, dangling `parent_id`s, excess depth, or empty
//! descriptions despite the type system. This stage re-checks those
//! invariants against the hierarchy as actually deserialized.

use std::collections::{HashMap, HashSet};

use autoplan_model::{RequirementHierarchy, RequirementId, RequirementNode, RequirementType, MAX_DEPTH};

use crate::issue::ValidationIssue;

/// Outcome of structural validation: issues found, plus the IDs (and all of
/// their descendants) to skip when `--force-all` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralReport {
    pub issues: Vec<ValidationIssue>,
    pub skip_ids: HashSet<RequirementId>,
}

impl StructuralReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// `PARTIAL_COMPLETE` is only viable if at least one root node survives
    /// skipping every invalid node and its descendants.
    #[must_use]
    pub fn has_surviving_root(&self, hierarchy: &RequirementHierarchy) -> bool {
        hierarchy
            .roots
            .iter()
            .any(|root| !self.skip_ids.contains(&root.id))
    }
}

/// Runs every Stage 1-2 structural check against `hierarchy`.
#[must_use]
pub fn validate_structural(hierarchy: &RequirementHierarchy) -> StructuralReport {
    let mut issues = Vec::new();
    let mut skip_ids = HashSet::new();
    let mut seen_ids: HashMap<RequirementId, ()> = HashMap::new();

    for root in &hierarchy.roots {
        if root.parent_id.is_some() {
            issues.push(ValidationIssue::blocking(
                Some(root.id.clone()),
                format!("root node {} carries a non-null parent_id (orphan claim)", root.id),
            ));
            skip_ids.insert(root.id.clone());
        }
        check_node(root, None, &mut seen_ids, &mut issues, &mut skip_ids);
    }

    // Propagate: any descendant of a skipped node is itself unreachable.
    for root in &hierarchy.roots {
        propagate_skip(root, &mut skip_ids);
    }

    StructuralReport { issues, skip_ids }
}

fn check_node(
    node: &RequirementNode,
    expected_parent: Option<&RequirementId>,
    seen_ids: &mut HashMap<RequirementId, ()>,
    issues: &mut Vec<ValidationIssue>,
    skip_ids: &mut HashSet<RequirementId>,
) {
    let mut node_invalid = false;

    if node.description.trim().is_empty() {
        issues.push(ValidationIssue::blocking(
            Some(node.id.clone()),
            format!("{} has an empty description", node.id),
        ));
        node_invalid = true;
    }

    if seen_ids.insert(node.id.clone(), ()).is_some() {
        issues.push(ValidationIssue::blocking(
            Some(node.id.clone()),
            format!("duplicate requirement id {}", node.id),
        ));
        node_invalid = true;
    }

    if node.parent_id.as_ref() != expected_parent {
        issues.push(ValidationIssue::blocking(
            Some(node.id.clone()),
            format!(
                "{} parent_id {:?} does not resolve to its actual position in the hierarchy",
                node.id, node.parent_id
            ),
        ));
        node_invalid = true;
    }

    if node.id.depth() > MAX_DEPTH {
        issues.push(ValidationIssue::blocking(
            Some(node.id.clone()),
            format!("{} exceeds the maximum depth of {}", node.id, MAX_DEPTH),
        ));
        node_invalid = true;
    }

    if !kind_matches_depth(node.kind, node.id.depth()) {
        issues.push(ValidationIssue::blocking(
            Some(node.id.clone()),
            format!("{} has type {:?} inconsistent with its depth", node.id, node.kind),
        ));
        node_invalid = true;
    }

    // A self-referencing parent_id would be a one-node cycle. Structurally
    // unreachable through the owned-tree representation but checked anyway
    // since corrupted JSON can still express it.
    if node.parent_id.as_ref() == Some(&node.id) {
        issues.push(ValidationIssue::blocking(
            Some(node.id.clone()),
            format!("{} lists itself as its own parent", node.id),
        ));
        node_invalid = true;
    }

    if node_invalid {
        skip_ids.insert(node.id.clone());
    }

    for child in &node.children {
        check_node(child, Some(&node.id), seen_ids, issues, skip_ids);
    }
}

fn propagate_skip(node: &RequirementNode, skip_ids: &mut HashSet<RequirementId>) {
    let parent_skipped = skip_ids.contains(&node.id);
    for child in &node.children {
        if parent_skipped {
            skip_ids.insert(child.id.clone());
        }
        propagate_skip(child, skip_ids);
    }
}

fn kind_matches_depth(kind: RequirementType, depth: u32) -> bool {
    match depth {
        0 => matches!(kind, RequirementType::Parent),
        1 => matches!(kind, RequirementType::SubProcess),
        _ => matches!(kind, RequirementType::Implementation | RequirementType::SubProcess),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoplan_model::RequirementCategory;

    fn rid(s: &str) -> RequirementId {
        RequirementId::new(s).unwrap()
    }

    fn clean_hierarchy() -> RequirementHierarchy {
        let mut h = RequirementHierarchy::new();
        let mut root = RequirementNode::new_root(rid("REQ_001"), "root requirement").unwrap();
        let child = RequirementNode::new_child(
            rid("REQ_001.1"),
            "sub process",
            RequirementType::SubProcess,
            rid("REQ_001"),
        )
        .unwrap();
        root.add_child(child).unwrap();
        h.add_root(root).unwrap();
        h
    }

    #[test]
    fn clean_hierarchy_has_no_issues() {
        let report = validate_structural(&clean_hierarchy());
        assert!(report.is_clean());
        assert!(report.skip_ids.is_empty());
    }

    #[test]
    fn duplicate_id_is_blocking() {
        let mut h = clean_hierarchy();
        // Simulate deserialized corruption: push a second root with the
        // same id as the existing child, bypassing the validating API.
        let dup = RequirementNode {
            id: rid("REQ_001.1"),
            description: "duplicate".to_string(),
            kind: RequirementType::SubProcess,
            category: RequirementCategory::Functional,
            parent_id: None,
            children: Vec::new(),
            acceptance_criteria: Vec::new(),
            related_concepts: Vec::new(),
            implementation: None,
            testable_properties: Vec::new(),
            design_contracts: None,
            expansion_failed: false,
        };
        h.roots.push(dup);

        let report = validate_structural(&h);
        assert!(!report.is_clean());
        assert!(report
            .issues
            .iter()
            .any(|i| i.message.contains("duplicate requirement id")));
    }

    #[test]
    fn empty_description_is_blocking_and_skippable() {
        let mut h = RequirementHierarchy::new();
        let corrupted = RequirementNode {
            id: rid("REQ_001"),
            description: "   ".to_string(),
            kind: RequirementType::Parent,
            category: RequirementCategory::Functional,
            parent_id: None,
            children: Vec::new(),
            acceptance_criteria: Vec::new(),
            related_concepts: Vec::new(),
            implementation: None,
            testable_properties: Vec::new(),
            design_contracts: None,
            expansion_failed: false,
        };
        h.roots.push(corrupted);

        let report = validate_structural(&h);
        assert!(!report.is_clean());
        assert!(report.skip_ids.contains(&rid("REQ_001")));
        assert!(!report.has_surviving_root(&h));
    }

    #[test]
    fn invalid_child_skip_propagates_to_its_descendants() {
        let mut h = RequirementHierarchy::new();
        let mut root = RequirementNode::new_root(rid("REQ_001"), "root").unwrap();
        let mut mid = RequirementNode::new_child(
            rid("REQ_001.1"),
            "mid",
            RequirementType::SubProcess,
            rid("REQ_001"),
        )
        .unwrap();
        // Corrupt mid's parent_id after construction to simulate a
        // deserialized mismatch (mid no longer resolves to its actual
        // position under REQ_001).
        mid.parent_id = Some(rid("REQ_999"));
        let leaf = RequirementNode::new_child(
            rid("REQ_001.1.1"),
            "leaf",
            RequirementType::Implementation,
            rid("REQ_001.1"),
        )
        .unwrap();
        mid.children.push(leaf);
        root.children.push(mid);
        h.add_root(root).unwrap();

        let report = validate_structural(&h);
        assert!(report.skip_ids.contains(&rid("REQ_001.1")));
        assert!(report.skip_ids.contains(&rid("REQ_001.1.1")));
        assert!(report.has_surviving_root(&h));
    }

    #[test]
    fn depth_exceeding_max_is_blocking() {
        let mut h = RequirementHierarchy::new();
        let mut root = RequirementNode::new_root(rid("REQ_001"), "root").unwrap();
        let mut mid = RequirementNode::new_child(
            rid("REQ_001.1"),
            "mid",
            RequirementType::SubProcess,
            rid("REQ_001"),
        )
        .unwrap();
        let mut deep = RequirementNode::new_child(
            rid("REQ_001.1.1"),
            "deep",
            RequirementType::Implementation,
            rid("REQ_001.1"),
        )
        .unwrap();
        // Emulate corrupted JSON carrying a level beyond MAX_DEPTH.
        let too_deep = RequirementNode {
            id: rid("REQ_001.1.1.1"),
            description: "too deep".to_string(),
            kind: RequirementType::Implementation,
            category: RequirementCategory::Functional,
            parent_id: Some(rid("REQ_001.1.1")),
            children: Vec::new(),
            acceptance_criteria: Vec::new(),
            related_concepts: Vec::new(),
            implementation: None,
            testable_properties: Vec::new(),
            design_contracts: None,
            expansion_failed: false,
        };
        deep.children.push(too_deep);
        mid.children.push(deep);
        root.children.push(mid);
        h.add_root(root).unwrap();

        let report = validate_structural(&h);
        assert!(report.skip_ids.contains(&rid("REQ_001.1.1.1")));
    }
}
