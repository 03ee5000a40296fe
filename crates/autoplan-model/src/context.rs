//! `WorkflowContext`: the mutable bag of state passed between pipeline steps (C8).

use serde::{Deserialize, Serialize};

use crate::requirement::RequirementHierarchy;

/// Current schema version for `WorkflowContext`'s on-disk (checkpoint)
/// representation. Bump when a breaking field change lands, mirroring the
/// teacher's artifact/receipt schema-versioning convention.
pub const SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechStack {
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub testing_frameworks: Vec<String>,
    pub build_systems: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileGroup {
    pub name: String,
    pub files: Vec<String>,
    pub purpose: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileGroups {
    pub groups: Vec<FileGroup>,
}

/// Mutable state handed, by ownership, from one orchestrator step to the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowContext {
    pub schema_version: String,
    pub checkpoint_id: Option<String>,
    pub project_path: String,
    pub requirement: String,
    pub decomposed_requirements: Option<RequirementHierarchy>,
    pub tech_stack: Option<TechStack>,
    pub file_groups: Option<FileGroups>,
    pub plan_path: Option<String>,
    pub phase_files: Vec<String>,
}

impl Default for WorkflowContext {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            checkpoint_id: None,
            project_path: String::new(),
            requirement: String::new(),
            decomposed_requirements: None,
            tech_stack: None,
            file_groups: None,
            plan_path: None,
            phase_files: Vec::new(),
        }
    }
}

impl WorkflowContext {
    #[must_use]
    pub fn new(project_path: impl Into<String>, requirement: impl Into<String>) -> Self {
        Self {
            project_path: project_path.into(),
            requirement: requirement.into(),
            ..Self::default()
        }
    }

    /// `true` once schema_version matches the version this build understands.
    /// Tolerant loading (`from_record`-equivalent, via plain `Deserialize`
    /// with `#[serde(default)]` on every optional field) is handled by serde
    /// directly; this just flags an incompatible major version.
    #[must_use]
    pub fn is_current_schema(&self) -> bool {
        self.schema_version == SCHEMA_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_stamps_current_schema_version() {
        let ctx = WorkflowContext::new("/tmp/proj", "build a thing");
        assert_eq!(ctx.schema_version, SCHEMA_VERSION);
        assert!(ctx.is_current_schema());
    }

    #[test]
    fn tolerates_missing_optional_fields_on_deserialize() {
        let minimal = serde_json::json!({
            "schema_version": "1.0",
            "project_path": "/tmp/proj",
            "requirement": "do a thing"
        });
        let ctx: WorkflowContext = serde_json::from_value(minimal).unwrap();
        assert!(ctx.decomposed_requirements.is_none());
        assert!(ctx.phase_files.is_empty());
    }

    #[test]
    fn roundtrips_through_json() {
        let ctx = WorkflowContext::new("/tmp/proj", "build a thing");
        let json = serde_json::to_string(&ctx).unwrap();
        let back: WorkflowContext = serde_json::from_str(&json).unwrap();
        assert_eq!(ctx, back);
    }
}
