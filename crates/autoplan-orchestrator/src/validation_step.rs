//! Structural Validation step,
//! with the optional advisory stage 3-4 passes layered on when the
//! orchestrator config asks for them.

use std::time::Duration;

use autoplan_config::OrchestratorConfig;
use autoplan_llm::StructuredClient;
use autoplan_model::{RequirementHierarchy, RequirementId, RequirementNode};
use autoplan_utils::error::PipelineError;
use autoplan_validate::{
    assessment_to_issues, validate_category_all, validate_structural, walk, ValidationIssue,
};

/// Advisory issues collected from the optional stage 3/4 passes, for
/// logging — they never block the pipeline.
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub advisory_issues: Vec<ValidationIssue>,
}

/// Runs stage 1-2 (blocking) over `hierarchy`, pruning invalid subtrees
/// when `config.force_all` is set and failing the step otherwise. Then
/// runs stage 3 (`validate_full`) and/or stage 4 (`validate_category`) as
/// advisory-only passes.
///
/// # Errors
/// `PipelineError::StepFailed` if stage 1-2 finds blocking issues and
/// `force_all` is not set, or if every root would be pruned even with
/// `force_all` set.
pub async fn run(
    client: &StructuredClient,
    model: &str,
    timeout: Duration,
    config: &OrchestratorConfig,
    hierarchy: &mut RequirementHierarchy,
) -> Result<ValidationOutcome, PipelineError> {
    let report = validate_structural(hierarchy);

    if !report.is_clean() {
        if !config.force_all {
            return Err(PipelineError::StepFailed {
                step: "structural_validation".to_string(),
                reason: format!("{} blocking issue(s) found; re-run with force_all to skip them", report.issues.len()),
            });
        }
        if !report.has_surviving_root(hierarchy) {
            return Err(PipelineError::StepFailed {
                step: "structural_validation".to_string(),
                reason: "force_all is set, but every root requirement is invalid".to_string(),
            });
        }
        prune(hierarchy, &report.skip_ids);
        tracing::warn!(
            pruned = report.skip_ids.len(),
            "force_all: skipped invalid requirement subtrees"
        );
    }

    let mut outcome = ValidationOutcome::default();

    if config.validate_full {
        for node in walk(hierarchy) {
            match autoplan_validate::assess_semantic(client, model, timeout, node).await {
                Ok(assessment) => {
                    outcome.advisory_issues.extend(assessment_to_issues(node, &assessment));
                }
                Err(e) => {
                    tracing::warn!(node = %node.id, error = %e, "semantic validation call failed; skipping");
                }
            }
        }
    }

    if config.validate_category {
        outcome.advisory_issues.extend(validate_category_all(hierarchy));
    }

    Ok(outcome)
}

fn prune(hierarchy: &mut RequirementHierarchy, skip_ids: &std::collections::HashSet<RequirementId>) {
    hierarchy.roots.retain(|root| !skip_ids.contains(&root.id));
    for root in &mut hierarchy.roots {
        prune_children(root, skip_ids);
    }
}

fn prune_children(node: &mut RequirementNode, skip_ids: &std::collections::HashSet<RequirementId>) {
    node.children.retain(|child| !skip_ids.contains(&child.id));
    for child in &mut node.children {
        prune_children(child, skip_ids);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoplan_model::{RequirementCategory, RequirementType};

    fn rid(s: &str) -> RequirementId {
        RequirementId::new(s).unwrap()
    }

    fn client_without_backends() -> StructuredClient {
        StructuredClient::new(Vec::new())
    }

    #[tokio::test]
    async fn clean_hierarchy_passes_with_default_config() {
        let mut h = RequirementHierarchy::new();
        let root = RequirementNode::new_root(rid("REQ_001"), "root requirement").unwrap();
        h.add_root(root).unwrap();

        let outcome = run(
            &client_without_backends(),
            "haiku",
            Duration::from_secs(5),
            &OrchestratorConfig::default(),
            &mut h,
        )
        .await
        .unwrap();
        assert!(outcome.advisory_issues.is_empty());
    }

    #[tokio::test]
    async fn blocking_issues_fail_the_step_without_force_all() {
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

        let err = run(
            &client_without_backends(),
            "haiku",
            Duration::from_secs(5),
            &OrchestratorConfig::default(),
            &mut h,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PipelineError::StepFailed { .. }));
    }

    #[tokio::test]
    async fn force_all_prunes_invalid_roots_and_keeps_the_valid_one() {
        let mut h = RequirementHierarchy::new();
        let good = RequirementNode::new_root(rid("REQ_001"), "good root").unwrap();
        let bad = RequirementNode {
            id: rid("REQ_002"),
            description: "".to_string(),
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
        h.roots.push(good);
        h.roots.push(bad);

        let mut config = OrchestratorConfig::default();
        config.force_all = true;

        let outcome = run(
            &client_without_backends(),
            "haiku",
            Duration::from_secs(5),
            &config,
            &mut h,
        )
        .await
        .unwrap();
        assert!(outcome.advisory_issues.is_empty());
        assert_eq!(h.roots.len(), 1);
        assert_eq!(h.roots[0].id, rid("REQ_001"));
    }
}
