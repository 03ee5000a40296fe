//! Pipeline Orchestrator (C8): composes C3-C7 into an ordered sequence of
//! idempotent steps over a shared [`WorkflowContext`], checkpointing after
//! each one.

mod phase_files;
mod planning;
mod validation_step;

pub use planning::{PlanPhase, PlanResponse};

use std::time::Duration;

use autoplan_checkpoint::{context_hash, git_branch, sorted_file_tree, write_checkpoint};
use autoplan_classifier::PreClassifier;
use autoplan_config::OrchestratorConfig;
use autoplan_context::generate_context;
use autoplan_context::sanitize_project_name;
use autoplan_llm::StructuredClient;
use autoplan_model::{Checkpoint, CheckpointPhase, WorkflowContext};
use autoplan_utils::error::PipelineError;
use autoplan_utils::runner::ProcessRunner;
use camino::Utf8PathBuf;
use std::sync::Arc;

/// Drives one requirement through `RequirementDecomposition` ->
/// `StructuralValidation` -> `ContextGeneration` -> `Planning` ->
/// `PhaseDecomposition`, checkpointing via C7 after every step.
///
/// `Research` (step 1 of) is an external-agent step outside
/// core scope and is not modeled here; callers that run it themselves can
/// fold its output into the `research_text` passed to [`Self::run`].
pub struct PipelineOrchestrator {
    client: StructuredClient,
    model: String,
    llm_timeout: Duration,
    classifier: PreClassifier,
    config: OrchestratorConfig,
    process_runner: Arc<dyn ProcessRunner>,
    project_path: Utf8PathBuf,
}

impl PipelineOrchestrator {
    #[must_use]
    pub fn new(
        client: StructuredClient,
        model: impl Into<String>,
        llm_timeout: Duration,
        classifier: PreClassifier,
        config: OrchestratorConfig,
        process_runner: Arc<dyn ProcessRunner>,
        project_path: Utf8PathBuf,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            llm_timeout,
            classifier,
            config,
            process_runner,
            project_path,
        }
    }

    /// Runs the full step sequence for `research_text`, returning the
    /// final [`WorkflowContext`].
    ///
    /// # Errors
    /// `PipelineError::StepFailed` if any step fails; the checkpoint for
    /// that attempt is marked `FAILED` before the error is returned.
    pub async fn run(&self, research_text: &str) -> Result<WorkflowContext, PipelineError> {
        let mut context = WorkflowContext::new(self.project_path.as_str(), research_text);

        context = self
            .run_step("requirement_decomposition", context, |ctx| {
                self.step_requirement_decomposition(ctx)
            })
            .await?;
        self.checkpoint(CheckpointPhase::RequirementDecomposition, &context)?;

        context = self
            .run_step("structural_validation", context, |ctx| {
                self.step_structural_validation(ctx)
            })
            .await?;
        self.checkpoint(CheckpointPhase::StructuralValidation, &context)?;

        if self.config.enable_context_generation {
            context = self
                .run_step("context_generation", context, |ctx| {
                    self.step_context_generation(ctx)
                })
                .await?;
        }
        self.checkpoint(CheckpointPhase::ContextGeneration, &context)?;

        let plan = self
            .run_fallible("planning", || self.step_planning(&context))
            .await?;
        self.checkpoint(CheckpointPhase::Planning, &context)?;

        context = self
            .run_step("phase_decomposition", context, |ctx| {
                self.step_phase_decomposition(ctx, &plan)
            })
            .await?;
        self.checkpoint(CheckpointPhase::PhaseDecomposition, &context)?;

        self.checkpoint(CheckpointPhase::Completed, &context)?;
        Ok(context)
    }

    async fn step_requirement_decomposition(&self, mut context: WorkflowContext) -> Result<WorkflowContext, PipelineError> {
        let hierarchy = autoplan_decompose::decompose(
            &self.client,
            &self.model,
            self.llm_timeout,
            &self.classifier,
            &context.requirement,
        )
        .await
        .map_err(|e| PipelineError::StepFailed {
            step: "requirement_decomposition".to_string(),
            reason: e.to_string(),
        })?;
        context.decomposed_requirements = Some(hierarchy);
        Ok(context)
    }

    async fn step_structural_validation(&self, mut context: WorkflowContext) -> Result<WorkflowContext, PipelineError> {
        let Some(mut hierarchy) = context.decomposed_requirements.take() else {
            return Err(PipelineError::StepFailed {
                step: "structural_validation".to_string(),
                reason: "no decomposed requirements to validate".to_string(),
            });
        };

        validation_step::run(&self.client, &self.model, self.llm_timeout, &self.config, &mut hierarchy).await?;

        context.decomposed_requirements = Some(hierarchy);
        Ok(context)
    }

    async fn step_context_generation(&self, mut context: WorkflowContext) -> Result<WorkflowContext, PipelineError> {
        let project_name = project_name(&self.project_path);
        let output_root = self.project_path.join(&self.config.output_dir);

        let (tech_stack, file_groups) = generate_context(
            &self.client,
            &self.model,
            self.llm_timeout,
            &self.project_path,
            &output_root,
            &project_name,
            self.config.max_files,
        )
        .await;

        context.tech_stack = tech_stack;
        context.file_groups = file_groups;
        Ok(context)
    }

    async fn step_planning(&self, context: &WorkflowContext) -> Result<PlanResponse, PipelineError> {
        planning::generate_plan(&self.client, &self.model, self.llm_timeout, context)
            .await
            .map_err(|e| PipelineError::StepFailed {
                step: "planning".to_string(),
                reason: e.to_string(),
            })
    }

    async fn step_phase_decomposition(
        &self,
        mut context: WorkflowContext,
        plan: &PlanResponse,
    ) -> Result<WorkflowContext, PipelineError> {
        let output_dir = self.project_path.join(&self.config.output_dir);
        let project_name = project_name(&self.project_path);
        let today = chrono::Utc::now().date_naive();

        let (overview_path, phase_files) = phase_files::write_plan_files(&output_dir, today, &project_name, plan)
            .map_err(|e| PipelineError::StepFailed {
                step: "phase_decomposition".to_string(),
                reason: e.to_string(),
            })?;

        context.plan_path = Some(overview_path.to_string());
        context.phase_files = phase_files;
        Ok(context)
    }

    /// Runs a fallible step that consumes and returns `context` by value,
    /// marking the most recent checkpoint `FAILED` before propagating the
    /// error.
    async fn run_step<F, Fut>(&self, step: &str, context: WorkflowContext, f: F) -> Result<WorkflowContext, PipelineError>
    where
        F: FnOnce(WorkflowContext) -> Fut,
        Fut: std::future::Future<Output = Result<WorkflowContext, PipelineError>>,
    {
        let snapshot = context.clone();
        match f(context).await {
            Ok(updated) => Ok(updated),
            Err(e) => {
                self.mark_failed(step, &snapshot);
                Err(e)
            }
        }
    }

    /// Like `run_step`, but for steps that produce a side value (the plan)
    /// rather than an updated context.
    async fn run_fallible<T, F, Fut>(&self, step: &str, f: F) -> Result<T, PipelineError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, PipelineError>>,
    {
        f().await.inspect_err(|_| {
            tracing::warn!(step, "step failed; see checkpoint for last-known-good state");
        })
    }

    fn mark_failed(&self, step: &str, context: &WorkflowContext) {
        tracing::warn!(step, "step failed; writing a FAILED checkpoint");
        let hash = self.fingerprint();
        if let Err(e) = write_checkpoint(&self.project_path, CheckpointPhase::Failed, context.clone(), hash) {
            tracing::warn!(error = %e, "failed to write FAILED checkpoint");
        }
    }

    fn checkpoint(&self, phase: CheckpointPhase, context: &WorkflowContext) -> Result<Checkpoint, PipelineError> {
        let hash = self.fingerprint();
        write_checkpoint(&self.project_path, phase, context.clone(), hash).map_err(|e| PipelineError::StepFailed {
            step: format!("{phase:?}"),
            reason: e.to_string(),
        })
    }

    fn fingerprint(&self) -> String {
        let file_tree = sorted_file_tree(&self.project_path);
        let branch = git_branch(&self.project_path, &self.process_runner);
        let project_name = project_name(&self.project_path);
        context_hash(&file_tree, &branch, &project_name, "rust")
    }
}

fn project_name(project_path: &Utf8PathBuf) -> String {
    let raw = project_path.file_name().unwrap_or("project");
    sanitize_project_name(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use autoplan_llm::{LlmBackend, LlmInvocation, LlmResult};
    use autoplan_utils::error::{LlmError, SubprocessError};
    use autoplan_utils::runner::{CommandSpec, ProcessOutput};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct ScriptedBackend {
        responses: Mutex<Vec<&'static str>>,
        call_count: AtomicUsize,
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn invoke(&self, _inv: &LlmInvocation) -> Result<LlmResult, LlmError> {
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst) as usize;
            let responses = self.responses.lock().unwrap();
            let response = responses.get(idx).copied().unwrap_or("not json");
            Ok(LlmResult::new(response.to_string(), "scripted", "scripted-model"))
        }
    }

    struct NoopGitRunner;
    impl ProcessRunner for NoopGitRunner {
        fn run(&self, _cmd: &CommandSpec, _timeout: Duration) -> Result<ProcessOutput, SubprocessError> {
            Ok(ProcessOutput::new(b"main".to_vec(), Vec::new(), Some(0), false))
        }
    }

    fn orchestrator(project_path: Utf8PathBuf, responses: Vec<&'static str>) -> PipelineOrchestrator {
        let backend = ScriptedBackend {
            responses: Mutex::new(responses),
            call_count: AtomicUsize::new(0),
        };
        let client = StructuredClient::new(vec![Box::new(backend)]);
        let classifier = PreClassifier::new(autoplan_config::ThresholdConfig::default());
        let mut config = OrchestratorConfig::default();
        config.enable_context_generation = false;
        let runner: Arc<dyn ProcessRunner> = Arc::new(NoopGitRunner);

        PipelineOrchestrator::new(client, "haiku", Duration::from_secs(5), classifier, config, runner, project_path)
    }

    #[tokio::test]
    async fn full_pipeline_produces_a_plan_and_phase_files() {
        let temp = TempDir::new().unwrap();
        let project_path = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();

        let phase_a = r#"{"parents": [
            {"description": "build login", "sub_processes": ["validate credentials"], "related_concepts": []}
        ]}"#;
        let phase_b = r#"{"acceptance_criteria": ["rejects bad passwords"], "implementation": {"backend": ["auth_handler"], "frontend": [], "middleware": [], "shared": []}, "design_contracts": null}"#;
        let plan = r#"{"overview": "ship login", "phases": [{"title": "setup", "body": "init auth module"}]}"#;

        let orchestrator = orchestrator(project_path.clone(), vec![phase_a, phase_b, plan]);

        let context = orchestrator.run("add a login flow").await.unwrap();

        assert!(context.decomposed_requirements.is_some());
        assert!(context.plan_path.is_some());
        assert_eq!(context.phase_files.len(), 1);

        let checkpoints = autoplan_checkpoint::list_checkpoints(&project_path);
        assert!(checkpoints.iter().any(|c| c.phase == CheckpointPhase::Completed));
    }

    #[tokio::test]
    async fn failed_decomposition_writes_a_failed_checkpoint() {
        let temp = TempDir::new().unwrap();
        let project_path = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();

        // No valid Phase A JSON queued: the first call returns garbage.
        let orchestrator = orchestrator(project_path.clone(), vec!["not json"]);

        let err = orchestrator.run("add a login flow").await.unwrap_err();
        assert!(matches!(err, PipelineError::StepFailed { .. }));

        let checkpoints = autoplan_checkpoint::list_checkpoints(&project_path);
        assert!(checkpoints.iter().any(|c| c.phase == CheckpointPhase::Failed));
    }
}
