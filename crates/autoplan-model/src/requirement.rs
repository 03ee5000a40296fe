//! `RequirementNode`, `RequirementHierarchy`, and their supporting value
//! types (C1).

use serde::{Deserialize, Serialize};

use autoplan_utils::error::ModelError;

use crate::id::RequirementId;

/// Maximum depth below a root node: parent (0) -> sub_process (1) -> implementation (2).
pub const MAX_DEPTH: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementType {
    Parent,
    SubProcess,
    Implementation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementCategory {
    #[default]
    Functional,
    NonFunctional,
    Security,
    Performance,
    Usability,
    Integration,
}

/// Four parallel lists of implementation artifacts, one per architectural layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImplementationComponents {
    pub frontend: Vec<String>,
    pub backend: Vec<String>,
    pub middleware: Vec<String>,
    pub shared: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Invariant,
    RoundTrip,
    Idempotence,
    Oracle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestableProperty {
    pub criterion: String,
    pub property_type: PropertyType,
    pub strategy_spec: String,
    pub test_skeleton: String,
}

/// Preconditions, postconditions, and invariants attached to a requirement
/// for contract-based testing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignContracts {
    pub preconditions: Vec<String>,
    pub postconditions: Vec<String>,
    pub invariants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementNode {
    pub id: RequirementId,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: RequirementType,
    #[serde(default)]
    pub category: RequirementCategory,
    pub parent_id: Option<RequirementId>,
    #[serde(default)]
    pub children: Vec<RequirementNode>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub related_concepts: Vec<String>,
    #[serde(default)]
    pub implementation: Option<ImplementationComponents>,
    #[serde(default)]
    pub testable_properties: Vec<TestableProperty>,
    #[serde(default)]
    pub design_contracts: Option<DesignContracts>,
    /// Set when Phase B expansion of this node failed; partial progress
    /// from sibling expansions is preserved alongside it.
    #[serde(default)]
    pub expansion_failed: bool,
}

impl RequirementNode {
    /// Construct a root (`parent`) node. Rejects an empty description.
    pub fn new_root(id: RequirementId, description: impl Into<String>) -> Result<Self, ModelError> {
        Self::new(id, description, RequirementType::Parent, None)
    }

    /// Construct a child node attached to `parent_id`. Rejects an empty
    /// description and enforces the maximum depth.
    pub fn new_child(
        id: RequirementId,
        description: impl Into<String>,
        kind: RequirementType,
        parent_id: RequirementId,
    ) -> Result<Self, ModelError> {
        if id.depth() > MAX_DEPTH {
            return Err(ModelError::DepthExceeded {
                node_id: id.as_str().to_string(),
                max_depth: MAX_DEPTH,
            });
        }
        Self::new(id, description, kind, Some(parent_id))
    }

    fn new(
        id: RequirementId,
        description: impl Into<String>,
        kind: RequirementType,
        parent_id: Option<RequirementId>,
    ) -> Result<Self, ModelError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(ModelError::MissingField {
                field: "description".to_string(),
            });
        }
        Ok(Self {
            id,
            description,
            kind,
            category: RequirementCategory::default(),
            parent_id,
            children: Vec::new(),
            acceptance_criteria: Vec::new(),
            related_concepts: Vec::new(),
            implementation: None,
            testable_properties: Vec::new(),
            design_contracts: None,
            expansion_failed: false,
        })
    }

    /// Attach `child` under this node, validating that `child.parent_id`
    /// matches this node's ID and that the resulting depth is legal.
    pub fn add_child(&mut self, child: RequirementNode) -> Result<(), ModelError> {
        if child.parent_id.as_ref() != Some(&self.id) {
            return Err(ModelError::ParentNotFound {
                parent_id: self.id.as_str().to_string(),
                child_id: child.id.as_str().to_string(),
            });
        }
        if child.id.depth() > MAX_DEPTH {
            return Err(ModelError::DepthExceeded {
                node_id: child.id.as_str().to_string(),
                max_depth: MAX_DEPTH,
            });
        }
        self.children.push(child);
        Ok(())
    }

    /// Depth-first search for a node by ID within this subtree.
    #[must_use]
    pub fn find_by_id(&self, id: &RequirementId) -> Option<&RequirementNode> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_id(id))
    }

    /// Every ID reachable from this node, including itself.
    pub fn all_ids(&self) -> Vec<RequirementId> {
        let mut ids = vec![self.id.clone()];
        for child in &self.children {
            ids.extend(child.all_ids());
        }
        ids
    }
}

/// Ordered list of root requirements plus free-form metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementHierarchy {
    pub roots: Vec<RequirementNode>,
    #[serde(default)]
    pub metadata: std::collections::BTreeMap<String, String>,
}

impl RequirementHierarchy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root node, rejecting a duplicate ID against the whole hierarchy.
    pub fn add_root(&mut self, root: RequirementNode) -> Result<(), ModelError> {
        if self.find_by_id(&root.id).is_some() {
            return Err(ModelError::DuplicateId {
                id: root.id.as_str().to_string(),
            });
        }
        self.roots.push(root);
        Ok(())
    }

    /// Attach `child` to the node `parent_id` resolves to, anywhere in the hierarchy.
    pub fn add_child_by_id(
        &mut self,
        parent_id: &RequirementId,
        child: RequirementNode,
    ) -> Result<(), ModelError> {
        if self.find_by_id(&child.id).is_some() {
            return Err(ModelError::DuplicateId {
                id: child.id.as_str().to_string(),
            });
        }
        for root in &mut self.roots {
            if let Some(parent) = find_mut(root, parent_id) {
                return parent.add_child(child);
            }
        }
        Err(ModelError::ParentNotFound {
            parent_id: parent_id.as_str().to_string(),
            child_id: child.id.as_str().to_string(),
        })
    }

    #[must_use]
    pub fn find_by_id(&self, id: &RequirementId) -> Option<&RequirementNode> {
        self.roots.iter().find_map(|r| r.find_by_id(id))
    }

    /// Every ID in the hierarchy, in document order.
    #[must_use]
    pub fn all_ids(&self) -> Vec<RequirementId> {
        self.roots.iter().flat_map(RequirementNode::all_ids).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.all_ids().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

fn find_mut<'a>(node: &'a mut RequirementNode, id: &RequirementId) -> Option<&'a mut RequirementNode> {
    if &node.id == id {
        return Some(node);
    }
    node.children.iter_mut().find_map(|c| find_mut(c, id))
}
