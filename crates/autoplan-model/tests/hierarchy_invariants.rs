//! Property-based invariants for `RequirementHierarchy`.

use autoplan_model::{RequirementHierarchy, RequirementId, RequirementNode, RequirementType};
use proptest::prelude::*;

/// Build a small, always-valid hierarchy: `root_count` roots, each with
/// `children_per_root` direct sub-process children.
fn build_hierarchy(root_count: u32, children_per_root: u32) -> RequirementHierarchy {
    let mut hierarchy = RequirementHierarchy::new();
    for r in 1..=root_count {
        let root_id = RequirementId::root(r).unwrap();
        let mut root = RequirementNode::new_root(root_id.clone(), format!("root {r}")).unwrap();
        for c in 1..=children_per_root {
            let child_id = root_id.child(c).unwrap();
            let child = RequirementNode::new_child(
                child_id,
                format!("child {r}.{c}"),
                RequirementType::SubProcess,
                root_id.clone(),
            )
            .unwrap();
            root.add_child(child).unwrap();
        }
        hierarchy.add_root(root).unwrap();
    }
    hierarchy
}

proptest! {
    #[test]
    fn ids_are_pairwise_distinct(root_count in 1u32..6, children_per_root in 0u32..6) {
        let hierarchy = build_hierarchy(root_count, children_per_root);
        let ids = hierarchy.all_ids();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(ids.len(), sorted.len());
    }

    #[test]
    fn every_child_parent_id_resolves_to_its_parent(root_count in 1u32..6, children_per_root in 0u32..6) {
        let hierarchy = build_hierarchy(root_count, children_per_root);
        for root in &hierarchy.roots {
            for child in &root.children {
                prop_assert_eq!(child.parent_id.as_ref(), Some(&root.id));
                prop_assert!(root.children.iter().any(|c| c.id == child.id));
            }
        }
    }

    #[test]
    fn no_root_to_leaf_path_exceeds_depth_three(root_count in 1u32..6, children_per_root in 0u32..6) {
        let hierarchy = build_hierarchy(root_count, children_per_root);
        for id in hierarchy.all_ids() {
            prop_assert!(id.depth() <= autoplan_model::MAX_DEPTH);
        }
    }

    #[test]
    fn serialize_then_deserialize_is_identity(root_count in 1u32..6, children_per_root in 0u32..6) {
        let hierarchy = build_hierarchy(root_count, children_per_root);
        let json = serde_json::to_string(&hierarchy).unwrap();
        let restored: RequirementHierarchy = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(hierarchy, restored);
    }
}
